use serde::{Deserialize, Serialize};

/// The four legacy tables, in the vocabulary of the source dump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableKind {
    Breed,
    Customer,
    Animal,
    Notes,
}

pub const ALL_TABLES: [TableKind; 4] = [
    TableKind::Breed,
    TableKind::Customer,
    TableKind::Animal,
    TableKind::Notes,
];

const PARENT_RANK: u16 = 0;
const ANIMAL_RANK: u16 = 10;
const NOTES_RANK: u16 = 20;

impl TableKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TableKind::Breed => "breed",
            TableKind::Customer => "customer",
            TableKind::Animal => "animal",
            TableKind::Notes => "notes",
        }
    }

    /// Singular label used in operator-facing log reasons ("Orphaned: Customer 7 not found").
    pub fn label(self) -> &'static str {
        match self {
            TableKind::Breed => "Breed",
            TableKind::Customer => "Customer",
            TableKind::Animal => "Animal",
            TableKind::Notes => "Note",
        }
    }

    /// Legacy column layout of the staging dump. The first column is the primary key.
    pub fn columns(self) -> &'static [&'static str] {
        match self {
            TableKind::Breed => &["breedID", "breedname", "avgtime", "avgcost"],
            TableKind::Customer => &[
                "customerID",
                "surname",
                "firstname",
                "address",
                "suburb",
                "postcode",
                "phone1",
                "phone2",
                "phone3",
                "email",
            ],
            TableKind::Animal => &[
                "animalID",
                "animalname",
                "breedID",
                "customerID",
                "SEX",
                "colour",
                "cost",
                "lastvisit",
                "thisvisit",
                "comments",
            ],
            TableKind::Notes => &["noteID", "animalID", "notes", "date"],
        }
    }

    pub fn primary_key_column(self) -> &'static str {
        self.columns()[0]
    }

    /// Tables whose accepted-ID sets must be complete before this table imports.
    pub fn parents(self) -> &'static [TableKind] {
        match self {
            TableKind::Breed | TableKind::Customer => &[],
            TableKind::Animal => &[TableKind::Breed, TableKind::Customer],
            TableKind::Notes => &[TableKind::Animal],
        }
    }
}

impl std::fmt::Display for TableKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn table_order_key(table: TableKind) -> (u16, &'static str) {
    let rank = match table {
        TableKind::Breed | TableKind::Customer => PARENT_RANK,
        TableKind::Animal => ANIMAL_RANK,
        TableKind::Notes => NOTES_RANK,
    };
    (rank, table.as_str())
}

/// All tables sorted so that every table appears after its parents.
pub fn dependency_order() -> Vec<TableKind> {
    let mut tables = ALL_TABLES.to_vec();
    tables.sort_by_key(|table| table_order_key(*table));
    tables
}
