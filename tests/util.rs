#![allow(clippy::unwrap_used, clippy::expect_used, dead_code)]

use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

/// In-memory destination pool with the groomdb schema applied.
pub async fn dest_pool() -> SqlitePool {
    let pool = memory_pool().await;
    groomdb::db::ensure_schema(&pool).await.unwrap();
    pool
}

/// In-memory staging pool with the legacy dump tables created empty.
///
/// Staging mirrors the dump: loosely typed, no constraints, exactly the
/// legacy column names.
pub async fn staging_pool() -> SqlitePool {
    let pool = memory_pool().await;
    for ddl in [
        "CREATE TABLE breed (breedID TEXT, breedname TEXT, avgtime TEXT, avgcost TEXT)",
        "CREATE TABLE customer (customerID TEXT, surname TEXT, firstname TEXT, address TEXT, \
         suburb TEXT, postcode TEXT, phone1 TEXT, phone2 TEXT, phone3 TEXT, email TEXT)",
        "CREATE TABLE animal (animalID TEXT, animalname TEXT, breedID TEXT, customerID TEXT, \
         SEX TEXT, colour TEXT, cost TEXT, lastvisit TEXT, thisvisit TEXT, comments TEXT)",
        "CREATE TABLE notes (noteID TEXT, animalID TEXT, notes TEXT, date TEXT)",
    ] {
        sqlx::query(ddl).execute(&pool).await.unwrap();
    }
    pool
}

async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("connect sqlite::memory:");
    sqlx::query("PRAGMA foreign_keys=ON;")
        .execute(&pool)
        .await
        .unwrap();
    pool
}

/// Insert one staging row from (column, value) pairs; missing columns stay
/// NULL, as in a partial dump.
pub async fn seed_row(pool: &SqlitePool, table: &str, cells: &[(&str, Option<&str>)]) {
    let columns: Vec<&str> = cells.iter().map(|(name, _)| *name).collect();
    let placeholders: Vec<String> = (1..=cells.len()).map(|i| format!("?{i}")).collect();
    let sql = format!(
        "INSERT INTO {table} ({}) VALUES ({})",
        columns.join(", "),
        placeholders.join(", ")
    );
    let mut query = sqlx::query(&sql);
    for (_, value) in cells {
        query = query.bind(*value);
    }
    query.execute(pool).await.unwrap();
}

/// Minimal consistent fixture: one breed, one customer, one animal, one note.
pub async fn seed_happy_path(staging: &SqlitePool) {
    seed_row(
        staging,
        "breed",
        &[
            ("breedID", Some("1")),
            ("breedname", Some("Terrier")),
            ("avgtime", Some("01:00:00")),
            ("avgcost", Some("40")),
        ],
    )
    .await;
    seed_row(
        staging,
        "customer",
        &[
            ("customerID", Some("10")),
            ("surname", Some("Singh")),
            ("firstname", Some("Asha")),
            ("postcode", Some("3181")),
            ("phone1", Some("0395551234")),
            ("email", Some("asha@example.com")),
        ],
    )
    .await;
    seed_row(
        staging,
        "animal",
        &[
            ("animalID", Some("3")),
            ("animalname", Some("Rex")),
            ("breedID", Some("1")),
            ("customerID", Some("10")),
            ("SEX", Some("Male")),
            ("colour", Some("Brown")),
            ("cost", Some("55")),
            ("lastvisit", Some("2019-03-07")),
            ("thisvisit", Some("2019-06-12")),
        ],
    )
    .await;
    seed_row(
        staging,
        "notes",
        &[
            ("noteID", Some("10")),
            ("animalID", Some("3")),
            ("notes", Some("Nervous around clippers")),
            ("date", Some("2019-06-12")),
        ],
    )
    .await;
}
