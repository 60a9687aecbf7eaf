use std::path::Path;

use anyhow::Result as AnyResult;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
};
use sqlx::{Pool, Sqlite, SqlitePool};

/// Open a SQLite pool with the pragmas every groomdb database runs under:
/// WAL, full synchronous, foreign keys on, a busy timeout for concurrent
/// readers.
pub async fn open_sqlite_pool(db_path: &Path, create: bool) -> AnyResult<Pool<Sqlite>> {
    if create {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let opts = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(create)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Full)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(8)
        .after_connect(|conn, _| {
            Box::pin(async move {
                sqlx::query("PRAGMA busy_timeout = 5000;")
                    .execute(&mut *conn)
                    .await?;
                Ok::<_, sqlx::Error>(())
            })
        })
        .connect_with(opts)
        .await?;

    tracing::info!(
        target: "groomdb",
        event = "db_open",
        path = %db_path.display()
    );
    Ok(pool)
}

/// Destination schema: the four legacy tables with their original column
/// names, primary keys supplied by the import (never auto-assigned), and
/// real foreign keys between them.
const SCHEMA_SQL: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS breed (
        breedID   INTEGER PRIMARY KEY,
        breedname TEXT NOT NULL,
        avgtime   TEXT,
        avgcost   INTEGER
    )",
    "CREATE TABLE IF NOT EXISTS customer (
        customerID INTEGER PRIMARY KEY,
        surname    TEXT NOT NULL,
        firstname  TEXT,
        address    TEXT,
        suburb     TEXT,
        postcode   INTEGER,
        phone1     TEXT,
        phone2     TEXT,
        phone3     TEXT,
        email      TEXT
    )",
    "CREATE TABLE IF NOT EXISTS animal (
        animalID   INTEGER PRIMARY KEY,
        animalname TEXT NOT NULL,
        breedID    INTEGER NOT NULL REFERENCES breed(breedID),
        customerID INTEGER NOT NULL REFERENCES customer(customerID),
        SEX        TEXT NOT NULL,
        colour     TEXT,
        cost       INTEGER NOT NULL DEFAULT 0,
        lastvisit  TEXT,
        thisvisit  TEXT,
        comments   TEXT
    )",
    "CREATE TABLE IF NOT EXISTS notes (
        noteID   INTEGER PRIMARY KEY,
        animalID INTEGER NOT NULL REFERENCES animal(animalID),
        notes    TEXT NOT NULL,
        date     TEXT
    )",
];

/// Create the destination tables if they are not present.
pub async fn ensure_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for statement in SCHEMA_SQL {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}
