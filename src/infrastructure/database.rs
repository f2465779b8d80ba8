//! Pooled SQLite connection

use crate::config::DatabaseSettings;
use log::info;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::ops::Deref;
use std::str::FromStr;
use std::time::Duration;

pub struct DatabaseConnection {
    connection: SqlitePool,
}

impl DatabaseConnection {
    pub fn new(connection: SqlitePool) -> DatabaseConnection {
        DatabaseConnection { connection }
    }
}

impl Deref for DatabaseConnection {
    type Target = SqlitePool;

    fn deref(&self) -> &Self::Target {
        &self.connection
    }
}

/// Opens the pool and brings the schema up to date.
///
/// Foreign keys are enforced on every connection so `ON DELETE SET NULL` on
/// `conversations.last_message_id` stays active.
pub async fn connect(settings: &DatabaseSettings) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(&settings.url)?
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5))
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(settings.max_connections)
        .connect_with(options)
        .await?;

    sqlx::migrate!().run(&pool).await?;
    info!("database ready at {}", settings.url);

    Ok(pool)
}
