//! Per-table validation: compose the field normalizers, apply entity rules
//! (required identity fields, breed-name uniqueness, parent references),
//! and classify the record.
//!
//! Validators never short-circuit on the first repair; a single dirty row
//! commonly has several independent defects and the audit log should name
//! them all.

use std::collections::HashSet;

use serde::Serialize;

use super::identity::{AcceptedIds, OrphanFallbacks, ParentRef};
use super::normalize::{self, Normalized};
use super::rows::{
    key_or_zero, AnimalRecord, BreedRecord, CustomerRecord, NormalizedRecord, NoteRecord,
    RawRecord,
};
use super::table_order::TableKind;

const MAX_BREEDNAME: usize = 30;
const MAX_SURNAME: usize = 20;
const MAX_FIRSTNAME: usize = 20;
const MAX_ADDRESS: usize = 50;
const MAX_SUBURB: usize = 20;
const MAX_ANIMALNAME: usize = 12;
const MAX_COLOUR: usize = 20;
const MAX_COMMENTS: usize = 255;
const MAX_NOTES: usize = 65_535;

/// Final classification of one processed record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Imported,
    Repaired,
    Skipped,
    Failed,
}

impl RecordStatus {
    pub fn tag(self) -> &'static str {
        match self {
            RecordStatus::Imported => "IMPORTED",
            RecordStatus::Repaired => "REPAIRED",
            RecordStatus::Skipped => "SKIPPED",
            RecordStatus::Failed => "FAILED",
        }
    }
}

/// Validator verdict for one raw record. `Accept` proceeds to an insert
/// attempt; `Skip` means the row cannot be imported but the table continues.
#[derive(Debug, Clone, PartialEq)]
pub enum Validated {
    Accept {
        record: NormalizedRecord,
        repairs: Vec<String>,
    },
    Skip {
        reason: String,
        orphaned: bool,
    },
}

impl Validated {
    fn skip(reason: impl Into<String>) -> Self {
        Validated::Skip {
            reason: reason.into(),
            orphaned: false,
        }
    }

    fn orphan(reason: String) -> Self {
        Validated::Skip {
            reason,
            orphaned: true,
        }
    }
}

/// Mutable run state the validators read: accepted parent IDs plus the
/// case-insensitive set of breed names taken so far. Only the orchestrator
/// writes to it, and only after a successful insert.
#[derive(Debug, Default)]
pub struct ImportState {
    pub accepted: AcceptedIds,
    breed_names: HashSet<String>,
}

impl ImportState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn breed_name_taken(&self, name: &str) -> bool {
        self.breed_names.contains(&name.to_lowercase())
    }

    /// Record a successfully inserted row: identity mapping plus, for
    /// breeds, the uniqueness set.
    pub fn note_accepted(&mut self, record: &NormalizedRecord) {
        let id = record.id();
        self.accepted.table_mut(record.table()).insert(id, id);
        if let NormalizedRecord::Breed(breed) = record {
            self.breed_names.insert(breed.breedname.to_lowercase());
        }
    }
}

fn take<T>(normalized: Normalized<T>, repairs: &mut Vec<String>) -> T {
    repairs.extend(normalized.repairs);
    normalized.value
}

pub fn validate_record(
    raw: &RawRecord,
    state: &ImportState,
    fallbacks: &OrphanFallbacks,
) -> Validated {
    match raw.table {
        TableKind::Breed => validate_breed(raw, state),
        TableKind::Customer => validate_customer(raw),
        TableKind::Animal => validate_animal(raw, state, fallbacks),
        TableKind::Notes => validate_note(raw, state, fallbacks),
    }
}

fn validate_breed(raw: &RawRecord, state: &ImportState) -> Validated {
    let mut repairs = Vec::new();

    let breed_id = normalize::primary_key("breedID", raw.get("breedID"));
    let breedname = normalize::required_text("breedname", raw.get("breedname"), MAX_BREEDNAME);
    let avgtime = take(normalize::duration("avgtime", raw.get("avgtime")), &mut repairs);
    let avgcost = take(
        normalize::non_negative("avgcost", raw.get("avgcost")),
        &mut repairs,
    );

    let breed_id = match breed_id {
        Ok(id) => id,
        Err(rejection) => return Validated::skip(rejection.to_string()),
    };
    let breedname = match breedname {
        Ok(normalized) => take(normalized, &mut repairs),
        Err(rejection) => return Validated::skip(rejection.to_string()),
    };

    if state.breed_name_taken(&breedname) {
        return Validated::skip(format!("duplicate breed name \"{breedname}\""));
    }

    Validated::Accept {
        record: NormalizedRecord::Breed(BreedRecord {
            breed_id,
            breedname,
            avgtime,
            avgcost,
        }),
        repairs,
    }
}

fn validate_customer(raw: &RawRecord) -> Validated {
    let mut repairs = Vec::new();

    let customer_id = normalize::primary_key("customerID", raw.get("customerID"));
    let surname = normalize::required_text("surname", raw.get("surname"), MAX_SURNAME);
    let firstname = take(
        normalize::optional_text("firstname", raw.get("firstname"), MAX_FIRSTNAME),
        &mut repairs,
    );
    let address = take(
        normalize::optional_text("address", raw.get("address"), MAX_ADDRESS),
        &mut repairs,
    );
    let suburb = take(
        normalize::optional_text("suburb", raw.get("suburb"), MAX_SUBURB),
        &mut repairs,
    );
    let postcode = take(
        normalize::postcode("postcode", raw.get("postcode")),
        &mut repairs,
    );
    let phone1 = take(normalize::phone("phone1", raw.get("phone1")), &mut repairs);
    let phone2 = take(normalize::phone("phone2", raw.get("phone2")), &mut repairs);
    let phone3 = take(normalize::phone("phone3", raw.get("phone3")), &mut repairs);
    let email = take(normalize::email("email", raw.get("email")), &mut repairs);

    let customer_id = match customer_id {
        Ok(id) => id,
        Err(rejection) => return Validated::skip(rejection.to_string()),
    };
    let surname = match surname {
        Ok(normalized) => take(normalized, &mut repairs),
        Err(rejection) => return Validated::skip(rejection.to_string()),
    };

    Validated::Accept {
        record: NormalizedRecord::Customer(CustomerRecord {
            customer_id,
            surname,
            firstname,
            address,
            suburb,
            postcode,
            phone1,
            phone2,
            phone3,
            email,
        }),
        repairs,
    }
}

fn validate_animal(raw: &RawRecord, state: &ImportState, fallbacks: &OrphanFallbacks) -> Validated {
    let mut repairs = Vec::new();

    let animal_id = normalize::primary_key("animalID", raw.get("animalID"));
    let animalname = normalize::required_text("animalname", raw.get("animalname"), MAX_ANIMALNAME);
    let sex = take(normalize::sex(raw.get("SEX")), &mut repairs);
    let colour = take(
        normalize::optional_text("colour", raw.get("colour"), MAX_COLOUR),
        &mut repairs,
    );
    let cost = take(normalize::non_negative("cost", raw.get("cost")), &mut repairs).unwrap_or(0);
    let lastvisit = take(normalize::date("lastvisit", raw.get("lastvisit")), &mut repairs);
    let thisvisit = take(normalize::date("thisvisit", raw.get("thisvisit")), &mut repairs);
    let comments = take(
        normalize::optional_text("comments", raw.get("comments"), MAX_COMMENTS),
        &mut repairs,
    );

    let animal_id = match animal_id {
        Ok(id) => id,
        Err(rejection) => return Validated::skip(rejection.to_string()),
    };
    let animalname = match animalname {
        Ok(normalized) => take(normalized, &mut repairs),
        Err(rejection) => return Validated::skip(rejection.to_string()),
    };

    let customer_id = match state.accepted.check_parent(
        TableKind::Customer,
        key_or_zero(raw.get("customerID")),
        fallbacks.customer,
    ) {
        ParentRef::Resolved(id) => id,
        ParentRef::Fallback { id, note } => {
            repairs.push(note);
            id
        }
        ParentRef::Orphaned { reason } => return Validated::orphan(reason),
    };

    let breed_id = match state.accepted.check_parent(
        TableKind::Breed,
        key_or_zero(raw.get("breedID")),
        fallbacks.breed,
    ) {
        ParentRef::Resolved(id) => id,
        ParentRef::Fallback { id, note } => {
            repairs.push(note);
            id
        }
        ParentRef::Orphaned { reason } => return Validated::orphan(reason),
    };

    Validated::Accept {
        record: NormalizedRecord::Animal(AnimalRecord {
            animal_id,
            animalname,
            breed_id,
            customer_id,
            sex,
            colour,
            cost,
            lastvisit,
            thisvisit,
            comments,
        }),
        repairs,
    }
}

fn validate_note(raw: &RawRecord, state: &ImportState, fallbacks: &OrphanFallbacks) -> Validated {
    let mut repairs = Vec::new();

    let note_id = match normalize::primary_key("noteID", raw.get("noteID")) {
        Ok(id) => id,
        Err(rejection) => return Validated::skip(rejection.to_string()),
    };

    let notes = match normalize::required_text("notes", raw.get("notes"), MAX_NOTES) {
        Ok(normalized) => take(normalized, &mut repairs),
        Err(_) => return Validated::skip("Empty notes content"),
    };

    let date = take(normalize::date("date", raw.get("date")), &mut repairs);

    let animal_id = match state.accepted.check_parent(
        TableKind::Animal,
        key_or_zero(raw.get("animalID")),
        fallbacks.animal,
    ) {
        ParentRef::Resolved(id) => id,
        ParentRef::Fallback { id, note } => {
            repairs.push(note);
            id
        }
        ParentRef::Orphaned { reason } => return Validated::orphan(reason),
    };

    Validated::Accept {
        record: NormalizedRecord::Note(NoteRecord {
            note_id,
            animal_id,
            notes,
            date,
        }),
        repairs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(table: TableKind, cells: &[(&str, Option<&str>)]) -> RawRecord {
        RawRecord::new(
            table,
            cells
                .iter()
                .map(|(name, value)| (name.to_string(), value.map(str::to_string)))
                .collect(),
        )
    }

    fn state_with_parents() -> ImportState {
        let mut state = ImportState::new();
        state.note_accepted(&NormalizedRecord::Breed(BreedRecord {
            breed_id: 1,
            breedname: "Terrier".into(),
            avgtime: None,
            avgcost: None,
        }));
        state.note_accepted(&NormalizedRecord::Customer(CustomerRecord {
            customer_id: 10,
            surname: "Singh".into(),
            firstname: None,
            address: None,
            suburb: None,
            postcode: None,
            phone1: None,
            phone2: None,
            phone3: None,
            email: None,
        }));
        state
    }

    #[test]
    fn breed_with_bare_minutes_and_negative_cost_is_repaired() {
        let state = ImportState::new();
        let record = raw(
            TableKind::Breed,
            &[
                ("breedID", Some("5")),
                ("breedname", Some("Maltese")),
                ("avgtime", Some("45")),
                ("avgcost", Some("-10")),
            ],
        );
        let Validated::Accept { record, repairs } =
            validate_record(&record, &state, &OrphanFallbacks::default())
        else {
            panic!("expected accept");
        };
        assert_eq!(repairs.len(), 2);
        let NormalizedRecord::Breed(breed) = record else {
            panic!("expected breed");
        };
        assert_eq!(breed.breed_id, 5);
        assert_eq!(
            breed.avgtime.map(|t| t.format("%H:%M:%S").to_string()),
            Some("00:45:00".into())
        );
        assert_eq!(breed.avgcost, Some(0));
    }

    #[test]
    fn duplicate_breed_name_skips_case_insensitively() {
        let mut state = ImportState::new();
        state.note_accepted(&NormalizedRecord::Breed(BreedRecord {
            breed_id: 1,
            breedname: "Poodle".into(),
            avgtime: None,
            avgcost: None,
        }));
        let record = raw(
            TableKind::Breed,
            &[("breedID", Some("2")), ("breedname", Some("POODLE"))],
        );
        let Validated::Skip { reason, orphaned } =
            validate_record(&record, &state, &OrphanFallbacks::default())
        else {
            panic!("expected skip");
        };
        assert!(!orphaned);
        assert!(reason.contains("duplicate breed name"));
    }

    #[test]
    fn breed_without_primary_key_skips() {
        let state = ImportState::new();
        let record = raw(
            TableKind::Breed,
            &[("breedID", Some("0")), ("breedname", Some("Corgi"))],
        );
        assert!(matches!(
            validate_record(&record, &state, &OrphanFallbacks::default()),
            Validated::Skip { orphaned: false, .. }
        ));
    }

    #[test]
    fn customer_collects_every_repair() {
        let state = ImportState::new();
        let record = raw(
            TableKind::Customer,
            &[
                ("customerID", Some("3")),
                ("surname", Some("Nguyen")),
                ("postcode", Some("123456")),
                ("phone1", Some("(03) 9555 1234")),
                ("email", Some("not-an-email")),
            ],
        );
        let Validated::Accept { repairs, .. } =
            validate_record(&record, &state, &OrphanFallbacks::default())
        else {
            panic!("expected accept");
        };
        assert!(repairs.len() >= 3, "expected all defects noted: {repairs:?}");
    }

    #[test]
    fn animal_with_unknown_customer_is_orphaned() {
        let state = state_with_parents();
        let record = raw(
            TableKind::Animal,
            &[
                ("animalID", Some("4")),
                ("animalname", Some("Rex")),
                ("breedID", Some("1")),
                ("customerID", Some("999")),
            ],
        );
        let Validated::Skip { reason, orphaned } =
            validate_record(&record, &state, &OrphanFallbacks::default())
        else {
            panic!("expected skip");
        };
        assert!(orphaned);
        assert_eq!(reason, "Orphaned: Customer 999 not found");
    }

    #[test]
    fn animal_zero_breed_uses_fallback_when_configured() {
        let state = state_with_parents();
        let record = raw(
            TableKind::Animal,
            &[
                ("animalID", Some("4")),
                ("animalname", Some("Rex")),
                ("breedID", Some("0")),
                ("customerID", Some("10")),
                ("SEX", Some("F")),
            ],
        );
        let fallbacks = OrphanFallbacks {
            breed: Some(1),
            ..OrphanFallbacks::default()
        };
        let Validated::Accept { record, repairs } = validate_record(&record, &state, &fallbacks)
        else {
            panic!("expected accept");
        };
        let NormalizedRecord::Animal(animal) = record else {
            panic!("expected animal");
        };
        assert_eq!(animal.breed_id, 1);
        assert!(repairs.iter().any(|note| note.contains("defaulted to 1")));
    }

    #[test]
    fn note_with_blank_body_skips_without_orphan() {
        let mut state = state_with_parents();
        state.note_accepted(&NormalizedRecord::Animal(AnimalRecord {
            animal_id: 3,
            animalname: "Rex".into(),
            breed_id: 1,
            customer_id: 10,
            sex: crate::import::rows::Sex::Male,
            colour: None,
            cost: 0,
            lastvisit: None,
            thisvisit: None,
            comments: None,
        }));
        let record = raw(
            TableKind::Notes,
            &[
                ("noteID", Some("10")),
                ("animalID", Some("3")),
                ("notes", Some("   ")),
            ],
        );
        let Validated::Skip { reason, orphaned } =
            validate_record(&record, &state, &OrphanFallbacks::default())
        else {
            panic!("expected skip");
        };
        assert!(!orphaned);
        assert_eq!(reason, "Empty notes content");
    }
}
