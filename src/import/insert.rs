//! ID-preserving inserts into the destination store.
//!
//! Every statement supplies the original primary key explicitly instead of
//! letting SQLite assign one, so cross-table references captured before the
//! run stay valid with zero translation. All values go through bind
//! parameters; nothing is spliced into SQL text.

use chrono::{NaiveDate, NaiveTime};
use sqlx::SqlitePool;

use super::rows::NormalizedRecord;

fn fmt_date(value: Option<NaiveDate>) -> Option<String> {
    value.map(|date| date.format("%Y-%m-%d").to_string())
}

fn fmt_time(value: Option<NaiveTime>) -> Option<String> {
    value.map(|time| time.format("%H:%M:%S").to_string())
}

/// Insert one accepted record. Exactly one attempt; the caller classifies a
/// failure and moves on to the next record.
pub async fn insert_record(
    pool: &SqlitePool,
    record: &NormalizedRecord,
) -> Result<(), sqlx::Error> {
    match record {
        NormalizedRecord::Breed(breed) => {
            sqlx::query(
                "INSERT INTO breed (breedID, breedname, avgtime, avgcost) \
                 VALUES (?1, ?2, ?3, ?4)",
            )
            .bind(breed.breed_id)
            .bind(&breed.breedname)
            .bind(fmt_time(breed.avgtime))
            .bind(breed.avgcost)
            .execute(pool)
            .await?;
        }
        NormalizedRecord::Customer(customer) => {
            sqlx::query(
                "INSERT INTO customer (customerID, surname, firstname, address, suburb, \
                 postcode, phone1, phone2, phone3, email) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            )
            .bind(customer.customer_id)
            .bind(&customer.surname)
            .bind(&customer.firstname)
            .bind(&customer.address)
            .bind(&customer.suburb)
            .bind(customer.postcode)
            .bind(&customer.phone1)
            .bind(&customer.phone2)
            .bind(&customer.phone3)
            .bind(&customer.email)
            .execute(pool)
            .await?;
        }
        NormalizedRecord::Animal(animal) => {
            sqlx::query(
                "INSERT INTO animal (animalID, animalname, breedID, customerID, SEX, \
                 colour, cost, lastvisit, thisvisit, comments) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            )
            .bind(animal.animal_id)
            .bind(&animal.animalname)
            .bind(animal.breed_id)
            .bind(animal.customer_id)
            .bind(animal.sex.as_str())
            .bind(&animal.colour)
            .bind(animal.cost)
            .bind(fmt_date(animal.lastvisit))
            .bind(fmt_date(animal.thisvisit))
            .bind(&animal.comments)
            .execute(pool)
            .await?;
        }
        NormalizedRecord::Note(note) => {
            sqlx::query(
                "INSERT INTO notes (noteID, animalID, notes, date) VALUES (?1, ?2, ?3, ?4)",
            )
            .bind(note.note_id)
            .bind(note.animal_id)
            .bind(&note.notes)
            .bind(fmt_date(note.date))
            .execute(pool)
            .await?;
        }
    }
    Ok(())
}
