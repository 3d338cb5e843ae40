//! Persistence for users, judgments, suspects and blame verdicts.
//!
//! Backed by sea-orm so the same code runs against SQLite (tests, local
//! development) and Postgres. Operations are grouped by aggregate:
//! - `users`: upsert on GitHub id, lookup for session resolution
//! - `judgments`: lifecycle transitions and suspect storage
//! - `blames`: one verdict per judgment, upserted on `judgment_id`

pub mod blames;
pub mod conversions;
pub mod entities;
pub mod judgments;
pub mod migration;
pub mod users;

use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;
use tracing::info;

pub use judgments::NewJudgment;
pub use users::NewUser;

use migration::Migrator;

#[derive(Debug, Clone)]
pub struct Store {
    conn: DatabaseConnection,
}

impl Store {
    pub async fn connect(database_url: &str) -> Result<Self, DbErr> {
        let backend = database_url.split(':').next().unwrap_or("unknown");
        info!(backend, "Connecting to database");

        let mut opt = ConnectOptions::new(database_url.to_string());
        if database_url.contains(":memory:") {
            // Every pooled connection would otherwise see its own empty database
            opt.max_connections(1).min_connections(1);
        } else {
            opt.max_connections(10)
                .min_connections(1)
                .connect_timeout(Duration::from_secs(8))
                .acquire_timeout(Duration::from_secs(8));
        }
        opt.sqlx_logging(false);

        let conn = Database::connect(opt).await?;
        Ok(Self { conn })
    }

    /// Applies pending migrations.
    pub async fn migrate(&self) -> Result<(), DbErr> {
        Migrator::up(&self.conn, None).await
    }

    pub async fn close(self) -> Result<(), DbErr> {
        self.conn.close().await
    }

    #[cfg(test)]
    pub(crate) fn conn(&self) -> &DatabaseConnection {
        &self.conn
    }

    #[cfg(test)]
    pub(crate) async fn in_memory() -> Self {
        let store = Self::connect("sqlite::memory:").await.unwrap();
        store.migrate().await.unwrap();
        store
    }
}
