//! SQLite store and per-request sessions.

use std::time::{Duration, Instant};

use rusqlite::{params_from_iter, Connection, ErrorCode, Transaction, TransactionBehavior};
use tracing::{debug, info, warn};

use super::ddl::{self, quote_ident};
use super::StoreConfig;
use crate::catalog::{ModelDef, ModelRegistry};
use crate::error::Error;
use crate::schema::ValidatedBatch;
use crate::value::{CatalogRow, Value};

/// Handle to the catalog database.
///
/// The store itself holds no connection; every unit of work opens a
/// [`Session`] and releases it when the session is dropped.
#[derive(Debug, Clone)]
pub struct Store {
    config: StoreConfig,
}

/// One connection to the database, released on drop.
///
/// A session may carry a deadline. Lock waits are then cut short at the
/// deadline and reported as [`Error::DeadlineExceeded`], and a write that
/// reaches its commit after the deadline is rolled back instead.
pub struct Session {
    conn: Connection,
    budget: Budget,
}

/// A read transaction giving a consistent view across several scans.
///
/// Dropping the snapshot rolls the transaction back.
pub struct Snapshot<'a> {
    tx: Transaction<'a>,
    budget: Budget,
}

/// Lock wait allowance of a session.
#[derive(Debug, Clone, Copy)]
struct Budget {
    busy_timeout: Duration,
    deadline: Option<Instant>,
}

impl Budget {
    /// Cap the lock wait of `conn` to what is left before the deadline.
    ///
    /// Returns whether the deadline, rather than the busy timeout, bounds
    /// the wait.
    fn arm(&self, conn: &Connection) -> Result<bool, Error> {
        let Some(deadline) = self.deadline else {
            return Ok(false);
        };
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(Error::DeadlineExceeded);
        }
        conn.busy_timeout(remaining.min(self.busy_timeout))?;
        Ok(remaining < self.busy_timeout)
    }

    /// Report a lock wait that ran into the deadline as such.
    fn classify(&self, err: Error, capped: bool) -> Error {
        match err {
            Error::Storage(e) if capped && e.sqlite_error_code() == Some(ErrorCode::DatabaseBusy) => {
                Error::DeadlineExceeded
            }
            other => other,
        }
    }
}

impl Store {
    /// Open the store, creating the database file if needed.
    pub fn open(config: StoreConfig) -> Result<Self, Error> {
        let store = Self { config };
        // Fail early on an unusable path.
        store.session()?;
        info!(path = %store.config.path.display(), "store opened");
        Ok(store)
    }

    /// Acquire a session.
    pub fn session(&self) -> Result<Session, Error> {
        let conn = Connection::open(&self.config.path)?;
        conn.busy_timeout(self.config.busy_timeout)?;
        if self.config.foreign_keys {
            conn.pragma_update(None, "foreign_keys", true)?;
        }
        Ok(Session {
            conn,
            budget: Budget {
                busy_timeout: self.config.busy_timeout,
                deadline: None,
            },
        })
    }

    /// Create tables and indexes for every registered model.
    pub fn create_schema(&self, registry: &ModelRegistry) -> Result<(), Error> {
        let mut session = self.session()?;
        let tx = session.conn.transaction()?;
        for model in registry.models() {
            tx.execute_batch(&ddl::create_table(model))?;
            for index in ddl::create_indexes(model) {
                tx.execute_batch(&index)?;
            }
            debug!(model = %model.identifier, "table ensured");
        }
        tx.commit()?;
        info!(models = registry.len(), "schema created");
        Ok(())
    }
}

impl Session {
    /// Give up on any work still running at `deadline`.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.budget.deadline = Some(deadline);
        self
    }

    /// Read every row of a model.
    pub fn scan(&self, model: &ModelDef) -> Result<Vec<CatalogRow>, Error> {
        let capped = self.budget.arm(&self.conn)?;
        scan_rows(&self.conn, model).map_err(|e| self.budget.classify(e, capped))
    }

    /// Count the rows of a model.
    pub fn count(&self, model: &ModelDef) -> Result<usize, Error> {
        let sql = format!("SELECT COUNT(*) FROM {}", quote_ident(&model.identifier));
        let capped = self.budget.arm(&self.conn)?;
        let count: i64 = self
            .conn
            .query_row(&sql, [], |row| row.get(0))
            .map_err(|e| self.budget.classify(e.into(), capped))?;
        Ok(count as usize)
    }

    /// Begin a read transaction.
    pub fn snapshot(&mut self) -> Result<Snapshot<'_>, Error> {
        let budget = self.budget;
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Deferred)?;
        Ok(Snapshot { tx, budget })
    }

    /// Insert a validated batch in a single transaction.
    ///
    /// Either every record is committed or, on any failure, none are.
    pub fn insert_batch(&mut self, model: &ModelDef, batch: &ValidatedBatch) -> Result<usize, Error> {
        if batch.is_empty() {
            return Ok(0);
        }

        let columns: Vec<String> = batch.columns.iter().map(|c| quote_ident(c)).collect();
        let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{}", i)).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_ident(&model.identifier),
            columns.join(", "),
            placeholders.join(", ")
        );

        let budget = self.budget;
        let capped = budget.arm(&self.conn)?;
        let tx = self
            .conn
            .transaction()
            .map_err(|e| budget.classify(e.into(), capped))?;

        let result = insert_rows(&tx, &sql, &batch.rows)
            .map_err(|e| budget.classify(e.into(), capped))
            .and_then(|inserted| {
                // Past the deadline nothing may be committed.
                let capped = budget.arm(&tx)?;
                Ok((inserted, capped))
            });
        match result {
            Ok((inserted, capped)) => {
                // A failed commit leaves the transaction open; dropping it rolls back.
                tx.commit().map_err(|e| budget.classify(e.into(), capped))?;
                debug!(model = %model.identifier, inserted, "batch committed");
                Ok(inserted)
            }
            Err(e) => {
                // Dropping the transaction rolls it back.
                drop(tx);
                warn!(model = %model.identifier, error = %e, "batch rolled back");
                Err(e)
            }
        }
    }

    /// Run raw SQL statements (used for fixtures and maintenance).
    pub fn execute_batch(&self, sql: &str) -> Result<(), Error> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }
}

impl Snapshot<'_> {
    /// Read every row of a model within the snapshot.
    pub fn scan(&self, model: &ModelDef) -> Result<Vec<CatalogRow>, Error> {
        let capped = self.budget.arm(&self.tx)?;
        scan_rows(&self.tx, model).map_err(|e| self.budget.classify(e, capped))
    }
}

fn insert_rows(tx: &Transaction<'_>, sql: &str, rows: &[Vec<Value>]) -> rusqlite::Result<usize> {
    let mut stmt = tx.prepare(sql)?;
    let mut inserted = 0;
    for row in rows {
        inserted += stmt.execute(params_from_iter(row.iter()))?;
    }
    Ok(inserted)
}

fn scan_rows(conn: &Connection, model: &ModelDef) -> Result<Vec<CatalogRow>, Error> {
    let columns: Vec<String> = model.column_names().map(quote_ident).collect();
    let sql = format!(
        "SELECT {} FROM {}",
        columns.join(", "),
        quote_ident(&model.identifier)
    );

    let scalars = model
        .columns
        .iter()
        .map(|c| {
            c.column_type.resolve().ok_or_else(|| {
                Error::InvalidData(format!("{}.{} has no scalar type", model.identifier, c.name))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    let mut out = Vec::new();

    while let Some(row) = rows.next()? {
        let mut projected = CatalogRow::new();
        for (i, (column, scalar)) in model.columns.iter().zip(&scalars).enumerate() {
            let value = Value::from_sql(*scalar, row.get_ref(i)?)?;
            projected.insert(column.name.clone(), value);
        }
        out.push(projected);
    }

    Ok(out)
}
