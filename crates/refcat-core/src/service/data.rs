//! Catalog reads and writes against registered models.

use std::collections::HashMap;
use std::time::Instant;

use tracing::{debug, info};

use crate::catalog::{ModelDef, ModelRegistry, ScopeRule, MAX_SCOPE_DEPTH, SCOPE_FIELD};
use crate::error::Error;
use crate::schema::insert_schema;
use crate::storage::{Session, Snapshot, Store};
use crate::value::{CatalogRow, Value};

use super::metadata::{self, CatalogDescription};

/// Generic read/write access to every registered catalog.
#[derive(Debug, Clone)]
pub struct CatalogService {
    registry: ModelRegistry,
    store: Store,
    deadline: Option<Instant>,
}

impl CatalogService {
    /// Create a service over a registry and a store.
    pub fn new(registry: ModelRegistry, store: Store) -> Self {
        Self {
            registry,
            store,
            deadline: None,
        }
    }

    /// A copy of this service whose reads and writes give up at `deadline`.
    ///
    /// An insert that misses the deadline is rolled back and reported as
    /// [`Error::DeadlineExceeded`].
    pub fn until(&self, deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            ..self.clone()
        }
    }

    /// The model registry.
    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// The underlying store.
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Describe every reference catalog.
    pub fn list_catalogs(&self) -> Vec<CatalogDescription> {
        metadata::list_catalogs(&self.registry)
    }

    /// Resolve a catalog identifier.
    pub fn resolve(&self, catalog: &str) -> Result<&ModelDef, Error> {
        self.registry
            .resolve(catalog)
            .ok_or_else(|| Error::NotFound(catalog.to_string()))
    }

    /// Read the rows of a catalog that belong to a scope.
    ///
    /// The whole table is scanned and filtered in memory, because the scope
    /// may only be reachable through a foreign key. Unscoped catalogs return
    /// every row.
    pub fn fetch_rows(&self, catalog: &str, scope_id: i64) -> Result<Vec<CatalogRow>, Error> {
        let model = self.resolve(catalog)?;

        let mut session = self.session()?;
        let snapshot = session.snapshot()?;
        let mut rows = snapshot.scan(model)?;
        let scanned = rows.len();
        self.project_scope(&snapshot, model, &mut rows, 0)?;
        drop(snapshot);

        if let Some(field) = scope_field(model) {
            let wanted = Value::Int(scope_id);
            rows.retain(|row| row.get(field) == Some(&wanted));
        }

        debug!(catalog, scope_id, scanned, returned = rows.len(), "catalog rows fetched");
        Ok(rows)
    }

    /// Validate and insert one record (a JSON object) or many (an array).
    ///
    /// The whole payload is validated before the store is touched; the
    /// records are then inserted atomically. Returns the number of rows
    /// inserted.
    pub fn insert_rows(&self, catalog: &str, payload: &serde_json::Value) -> Result<usize, Error> {
        let model = self.resolve(catalog)?;
        let schema = insert_schema(model)?;
        let batch = schema.validate_payload(payload)?;

        let mut session = self.session()?;
        let inserted = session.insert_batch(model, &batch)?;

        info!(catalog, inserted, "catalog rows inserted");
        Ok(inserted)
    }

    fn session(&self) -> Result<Session, Error> {
        let session = self.store.session()?;
        Ok(match self.deadline {
            Some(deadline) => session.with_deadline(deadline),
            None => session,
        })
    }

    /// Add the computed scope field to rows of models that inherit it.
    fn project_scope(
        &self,
        snapshot: &Snapshot<'_>,
        model: &ModelDef,
        rows: &mut [CatalogRow],
        depth: usize,
    ) -> Result<(), Error> {
        let ScopeRule::Inherited { via, parent_column } = &model.scope else {
            return Ok(());
        };
        if depth >= MAX_SCOPE_DEPTH {
            return Err(Error::InvalidData(format!(
                "scope of {} is inherited through more than {} models",
                model.identifier, MAX_SCOPE_DEPTH
            )));
        }

        let fk = model
            .get_column(via)
            .and_then(|c| c.foreign_key.as_ref())
            .ok_or_else(|| Error::InvalidData(format!("{}.{} is not a foreign key", model.identifier, via)))?;
        let parent = self.registry.resolve(&fk.table).ok_or_else(|| {
            Error::InvalidData(format!("scope parent {} is not registered", fk.table))
        })?;

        let mut parent_rows = snapshot.scan(parent)?;
        self.project_scope(snapshot, parent, &mut parent_rows, depth + 1)?;

        let scopes: HashMap<i64, Value> = parent_rows
            .iter()
            .filter_map(|row| {
                let key = row.get(&fk.column)?.as_int()?;
                let scope = row.get(parent_column).cloned().unwrap_or(Value::Null);
                Some((key, scope))
            })
            .collect();

        for row in rows.iter_mut() {
            let scope = row
                .get(via)
                .and_then(Value::as_int)
                .and_then(|key| scopes.get(&key))
                .cloned()
                .unwrap_or(Value::Null);
            row.insert(SCOPE_FIELD, scope);
        }

        Ok(())
    }
}

/// Field of a projected row that holds its scope id.
fn scope_field(model: &ModelDef) -> Option<&str> {
    match &model.scope {
        ScopeRule::Unscoped => None,
        ScopeRule::Column(column) => Some(column),
        ScopeRule::Inherited { .. } => Some(SCOPE_FIELD),
    }
}
