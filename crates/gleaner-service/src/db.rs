use diesel::Connection;
use diesel::sqlite::SqliteConnection;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use thiserror::Error;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Failed to connect to database: {0}")]
    Connection(#[from] diesel::ConnectionError),

    #[error("Failed to run migrations: {0}")]
    Migration(String),
}

/// Open a SQLite connection and bring the schema up to date.
pub fn establish_connection(database_url: &str) -> Result<SqliteConnection, DbError> {
    let mut connection = SqliteConnection::establish(database_url)?;

    connection
        .run_pending_migrations(MIGRATIONS)
        .map_err(|err| DbError::Migration(err.to_string()))?;

    Ok(connection)
}
