//! Price persistence.

use std::{
    path::Path,
    sync::{Mutex, MutexGuard},
};

use async_trait::async_trait;
use chrono::{DateTime, Local};
use rusqlite::{Connection, OptionalExtension, params};

use crate::{core::record::PriceRecord, prelude::*, quantity::price::MegawattHourPrice};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database query failed")]
    Sqlite(#[from] rusqlite::Error),

    #[error("database connection is poisoned")]
    Poisoned,
}

/// Insert-only storage of the quarter-hour prices, unique by timestamp.
#[async_trait]
pub trait PriceStore: Sync {
    async fn get(&self, timestamp: DateTime<Local>) -> Result<Option<PriceRecord>, StoreError>;

    /// Insert the records whose timestamps are not stored yet, all or nothing.
    ///
    /// Returns the number of the inserted records.
    async fn insert_missing(&self, records: &[PriceRecord]) -> Result<usize, StoreError>;
}

/// SQLite-backed [`PriceStore`].
///
/// Every operation holds the connection only for its own duration.
pub struct Db(Mutex<Connection>);

impl Db {
    const SCHEMA: &str = "
        CREATE TABLE IF NOT EXISTS electricity_prices (
            timestamp INTEGER PRIMARY KEY,
            price_eur_per_mwh REAL NOT NULL
        );
    ";

    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        info!("opening…");
        Self::initialize(Connection::open(path)?)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::initialize(Connection::open_in_memory()?)
    }

    fn initialize(connection: Connection) -> Result<Self, StoreError> {
        connection.execute_batch(Self::SCHEMA)?;
        Ok(Self(Mutex::new(connection)))
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.0.lock().map_err(|_| StoreError::Poisoned)
    }
}

#[async_trait]
impl PriceStore for Db {
    #[instrument(skip_all, fields(timestamp = %timestamp))]
    async fn get(&self, timestamp: DateTime<Local>) -> Result<Option<PriceRecord>, StoreError> {
        let price = self
            .lock()?
            .query_row(
                "SELECT price_eur_per_mwh FROM electricity_prices WHERE timestamp = ?1",
                params![timestamp.timestamp()],
                |row| row.get::<_, f64>(0),
            )
            .optional()?;
        debug!(?price, "queried");
        Ok(price.map(|price| PriceRecord::new(timestamp, MegawattHourPrice(price))))
    }

    #[instrument(skip_all, fields(n_records = records.len()))]
    async fn insert_missing(&self, records: &[PriceRecord]) -> Result<usize, StoreError> {
        let mut connection = self.lock()?;
        let transaction = connection.transaction()?;
        let mut n_inserted = 0;
        {
            let mut statement = transaction.prepare_cached(
                "INSERT OR IGNORE INTO electricity_prices (timestamp, price_eur_per_mwh) VALUES (?1, ?2)",
            )?;
            for record in records {
                n_inserted += statement.execute(params![record.timestamp.timestamp(), record.price.0])?;
            }
        }
        transaction.commit()?;
        info!(n_inserted, "stored");
        Ok(n_inserted)
    }
}
