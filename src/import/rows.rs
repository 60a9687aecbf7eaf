use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use serde_json::{Map, Value};

use super::table_order::TableKind;

/// One row as extracted from the staging source: the legacy column names and
/// their string-or-null cell values, in dump order. Read once, validated,
/// then dropped.
#[derive(Debug, Clone)]
pub struct RawRecord {
    pub table: TableKind,
    pub cells: Vec<(String, Option<String>)>,
}

impl RawRecord {
    pub fn new(table: TableKind, cells: Vec<(String, Option<String>)>) -> Self {
        Self { table, cells }
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .and_then(|(_, value)| value.as_deref())
    }

    /// Original primary key as declared by the dump, or 0 when absent/garbage.
    pub fn original_id(&self) -> i64 {
        key_or_zero(self.get(self.table.primary_key_column()))
    }

    /// Snapshot of the raw payload for the audit log.
    pub fn to_json(&self) -> Value {
        let mut object = Map::new();
        for (name, value) in &self.cells {
            let cell = match value {
                Some(text) => Value::String(text.clone()),
                None => Value::Null,
            };
            object.insert(name.clone(), cell);
        }
        Value::Object(object)
    }
}

/// Lenient integer read for key columns: dumps carry keys as text, and a
/// missing or mangled key degrades to the 0 sentinel rather than an error.
pub fn key_or_zero(raw: Option<&str>) -> i64 {
    raw.and_then(|text| text.trim().parse::<i64>().ok())
        .filter(|id| *id > 0)
        .unwrap_or(0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub fn as_str(self) -> &'static str {
        match self {
            Sex::Male => "Male",
            Sex::Female => "Female",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreedRecord {
    pub breed_id: i64,
    pub breedname: String,
    pub avgtime: Option<NaiveTime>,
    pub avgcost: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRecord {
    pub customer_id: i64,
    pub surname: String,
    pub firstname: Option<String>,
    pub address: Option<String>,
    pub suburb: Option<String>,
    pub postcode: Option<i64>,
    pub phone1: Option<String>,
    pub phone2: Option<String>,
    pub phone3: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimalRecord {
    pub animal_id: i64,
    pub animalname: String,
    pub breed_id: i64,
    pub customer_id: i64,
    pub sex: Sex,
    pub colour: Option<String>,
    pub cost: i64,
    pub lastvisit: Option<NaiveDate>,
    pub thisvisit: Option<NaiveDate>,
    pub comments: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteRecord {
    pub note_id: i64,
    pub animal_id: i64,
    pub notes: String,
    pub date: Option<NaiveDate>,
}

/// Fully-typed record ready for insertion, tagged by entity so downstream
/// code never dispatches on stringly-typed table names.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NormalizedRecord {
    Breed(BreedRecord),
    Customer(CustomerRecord),
    Animal(AnimalRecord),
    Note(NoteRecord),
}

impl NormalizedRecord {
    pub fn table(&self) -> TableKind {
        match self {
            NormalizedRecord::Breed(_) => TableKind::Breed,
            NormalizedRecord::Customer(_) => TableKind::Customer,
            NormalizedRecord::Animal(_) => TableKind::Animal,
            NormalizedRecord::Note(_) => TableKind::Notes,
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            NormalizedRecord::Breed(record) => record.breed_id,
            NormalizedRecord::Customer(record) => record.customer_id,
            NormalizedRecord::Animal(record) => record.animal_id,
            NormalizedRecord::Note(record) => record.note_id,
        }
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
