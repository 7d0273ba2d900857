//! Model registry mapping catalog identifiers to model definitions.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use tracing::{debug, error, info, warn};

use super::{models, ModelDef, ScopeRule, MAX_SCOPE_DEPTH};
use crate::error::SchemaError;
use crate::schema::derive_schema;

/// Process-wide registry of the declared models.
static GLOBAL: OnceLock<RegistryBuild> = OnceLock::new();

/// Registry of served models, keyed by external identifier.
///
/// Immutable once built; clones share the same definitions.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRegistry {
    /// Models in registration order.
    models: Arc<[ModelDef]>,
    /// Identifier to position in `models`.
    index: Arc<HashMap<String, usize>>,
}

/// Outcome of building a registry.
#[derive(Debug, Clone)]
pub struct RegistryBuild {
    /// The models that can be served.
    pub registry: ModelRegistry,
    /// Models left out because of configuration defects.
    pub rejected: Vec<SchemaError>,
}

impl RegistryBuild {
    /// Check if every declared model was accepted.
    pub fn is_complete(&self) -> bool {
        self.rejected.is_empty()
    }
}

impl ModelRegistry {
    /// Build a registry from model definitions.
    ///
    /// Duplicate identifiers keep the first registration. Models that cannot
    /// be served (unresolvable column types, broken scope rules) are left
    /// out and reported in [`RegistryBuild::rejected`].
    pub fn build(models: impl IntoIterator<Item = ModelDef>) -> RegistryBuild {
        let mut accepted: Vec<ModelDef> = Vec::new();
        let mut rejected = Vec::new();

        for model in models {
            if accepted.iter().any(|m| m.identifier == model.identifier) {
                warn!(model = %model.identifier, "duplicate model registration ignored");
                continue;
            }
            match check_model(&model) {
                Ok(()) => {
                    debug!(model = %model.identifier, kind = model.kind.tag(), "model registered");
                    accepted.push(model);
                }
                Err(reason) => {
                    error!(model = %model.identifier, error = %reason, "model rejected");
                    rejected.push(reason);
                }
            }
        }

        // Dropping a parent can orphan its children, so repeat until stable.
        while let Some((pos, reason)) = accepted
            .iter()
            .enumerate()
            .find_map(|(i, m)| broken_scope(m, &accepted).map(|reason| (i, reason)))
        {
            let model = accepted.remove(pos);
            error!(model = %model.identifier, error = %reason, "model rejected");
            rejected.push(reason);
        }

        let index = accepted
            .iter()
            .enumerate()
            .map(|(i, m)| (m.identifier.clone(), i))
            .collect();

        RegistryBuild {
            registry: Self {
                models: accepted.into(),
                index: Arc::new(index),
            },
            rejected,
        }
    }

    /// Resolve a catalog identifier.
    pub fn resolve(&self, identifier: &str) -> Option<&ModelDef> {
        self.index.get(identifier).map(|&i| &self.models[i])
    }

    /// Check if an identifier is registered.
    pub fn contains(&self, identifier: &str) -> bool {
        self.index.contains_key(identifier)
    }

    /// All models in registration order.
    pub fn models(&self) -> impl Iterator<Item = &ModelDef> {
        self.models.iter()
    }

    /// Models tagged as reference data, in registration order.
    pub fn reference_models(&self) -> impl Iterator<Item = &ModelDef> {
        self.models.iter().filter(|m| m.is_reference())
    }

    /// Registered identifiers in registration order.
    pub fn identifiers(&self) -> Vec<&str> {
        self.models.iter().map(|m| m.identifier.as_str()).collect()
    }

    /// Number of registered models.
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Check if no models are registered.
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

/// Build the process-wide registry from the declared models.
///
/// Only the first call builds; later calls return the same instance.
pub fn init() -> &'static RegistryBuild {
    GLOBAL.get_or_init(|| {
        let build = ModelRegistry::build(models::declared());
        info!(
            models = build.registry.len(),
            rejected = build.rejected.len(),
            "model registry initialized"
        );
        build
    })
}

/// The process-wide registry, initializing it on first use.
pub fn global() -> &'static ModelRegistry {
    &init().registry
}

fn check_model(model: &ModelDef) -> Result<(), SchemaError> {
    derive_schema(model, &[], false)?;

    match &model.scope {
        ScopeRule::Unscoped => Ok(()),
        ScopeRule::Column(column) => match model.get_column(column) {
            Some(_) => Ok(()),
            None => Err(SchemaError::MissingScopeColumn {
                model: model.identifier.clone(),
                column: column.clone(),
            }),
        },
        ScopeRule::Inherited { via, .. } => {
            let column = model.get_column(via).ok_or_else(|| SchemaError::MissingScopeColumn {
                model: model.identifier.clone(),
                column: via.clone(),
            })?;
            if column.foreign_key.is_none() {
                return Err(SchemaError::InvalidScopeLink {
                    model: model.identifier.clone(),
                    via: via.clone(),
                });
            }
            Ok(())
        }
    }
}

/// Report an inherited scope that cannot be resolved from the accepted
/// models: a missing parent, a cycle or a chain that is too long.
fn broken_scope(model: &ModelDef, accepted: &[ModelDef]) -> Option<SchemaError> {
    orphaned_scope(model, accepted).or_else(|| scope_chain_error(model, accepted))
}

/// Walk the inherited scope chain starting at `model`.
fn scope_chain_error(model: &ModelDef, accepted: &[ModelDef]) -> Option<SchemaError> {
    let mut visited = vec![model.identifier.as_str()];
    let mut current = model;

    while let ScopeRule::Inherited { via, .. } = &current.scope {
        if visited.len() > MAX_SCOPE_DEPTH {
            return Some(SchemaError::ScopeTooDeep {
                model: model.identifier.clone(),
                limit: MAX_SCOPE_DEPTH,
            });
        }
        let table = &current.get_column(via)?.foreign_key.as_ref()?.table;
        if visited.contains(&table.as_str()) {
            return Some(SchemaError::CyclicScope {
                model: model.identifier.clone(),
                parent: table.clone(),
            });
        }
        current = accepted.iter().find(|m| &m.identifier == table)?;
        visited.push(current.identifier.as_str());
    }

    None
}

/// Report an inherited scope whose parent cannot provide it.
fn orphaned_scope(model: &ModelDef, accepted: &[ModelDef]) -> Option<SchemaError> {
    let ScopeRule::Inherited { via, parent_column } = &model.scope else {
        return None;
    };
    let fk = model.get_column(via)?.foreign_key.as_ref()?;

    let provides = accepted.iter().any(|parent| {
        parent.identifier == fk.table
            && parent.identifier != model.identifier
            && (parent.get_column(parent_column).is_some()
                || (matches!(parent.scope, ScopeRule::Inherited { .. })
                    && parent_column == super::SCOPE_FIELD))
    });

    (!provides).then(|| SchemaError::UnknownScopeParent {
        model: model.identifier.clone(),
        parent: fk.table.clone(),
        column: parent_column.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ColumnDef, ColumnType, ForeignKey, ScalarType};

    /// A nullable column whose type cannot be resolved to a scalar.
    fn geometry_column() -> ColumnDef {
        ColumnDef::nullable(
            "shape",
            ColumnType::Custom {
                name: "GEOMETRY".into(),
                storage: None,
            },
        )
    }

    #[test]
    fn test_resolve_declared_models() {
        let build = ModelRegistry::build(models::declared());
        assert!(build.is_complete());

        let registry = build.registry;
        assert_eq!(
            registry.identifiers(),
            vec!["advices_d", "section", "indicator_types", "indicators"]
        );
        assert_eq!(registry.resolve("section").unwrap().identifier, "section");
    }

    #[test]
    fn test_unknown_identifier_is_none() {
        let registry = ModelRegistry::build(models::declared()).registry;
        for _ in 0..3 {
            assert!(registry.resolve("unknown").is_none());
            assert!(!registry.contains("unknown"));
        }
    }

    #[test]
    fn test_duplicate_registration_keeps_first() {
        let duplicate = models::section().with_title("Other");
        let build = ModelRegistry::build(vec![models::section(), duplicate]);

        assert_eq!(build.registry.len(), 1);
        assert_eq!(
            build.registry.resolve("section").unwrap().title.as_deref(),
            Some("Section")
        );
        assert!(build.is_complete());
    }

    #[test]
    fn test_build_is_idempotent() {
        let first = ModelRegistry::build(models::declared()).registry;
        let second = ModelRegistry::build(models::declared()).registry;
        assert_eq!(first, second);
    }

    #[test]
    fn test_global_initializes_once() {
        let a = init();
        let b = init();
        assert!(std::ptr::eq(a, b));
        assert!(std::ptr::eq(global(), &b.registry));
    }

    #[test]
    fn test_unresolvable_model_is_rejected_alone() {
        let broken = models::section().with_column(geometry_column());
        let build = ModelRegistry::build(vec![models::advices(), broken]);

        assert_eq!(build.registry.identifiers(), vec!["advices_d"]);
        assert_eq!(
            build.rejected,
            vec![SchemaError::UnresolvedColumnType {
                model: "section".into(),
                column: "shape".into(),
            }]
        );
    }

    #[test]
    fn test_rejecting_parent_orphans_children() {
        let broken = models::indicator_types().with_column(geometry_column());
        let build = ModelRegistry::build(vec![models::section(), broken, models::indicators()]);

        assert_eq!(build.registry.identifiers(), vec!["section"]);
        assert_eq!(build.rejected.len(), 2);
        assert!(matches!(
            &build.rejected[1],
            SchemaError::UnknownScopeParent { model, parent, .. }
                if model == "indicators" && parent == "indicator_types"
        ));
    }

    #[test]
    fn test_invalid_scope_rules() {
        let missing = models::section().scoped_by("region_id");
        let not_fk = models::section()
            .with_column(ColumnDef::new("region_id", ScalarType::Integer))
            .inherits_scope("region_id", "section_id");
        let self_ref = ModelDef::reference("node")
            .with_column(ColumnDef::primary_key("id"))
            .with_column(
                ColumnDef::nullable("parent_id", ScalarType::Integer)
                    .references(ForeignKey::new("node", "id")),
            )
            .inherits_scope("parent_id", "section_id");

        let build = ModelRegistry::build(vec![missing]);
        assert!(matches!(build.rejected[0], SchemaError::MissingScopeColumn { .. }));

        let build = ModelRegistry::build(vec![not_fk]);
        assert!(matches!(build.rejected[0], SchemaError::InvalidScopeLink { .. }));

        let build = ModelRegistry::build(vec![self_ref]);
        assert!(matches!(build.rejected[0], SchemaError::UnknownScopeParent { .. }));
    }

    /// A model `name` whose scope comes from `parent` through `{parent}_id`.
    fn inheriting(name: &str, parent: &str) -> ModelDef {
        let via = format!("{}_id", parent);
        ModelDef::reference(name)
            .with_column(ColumnDef::primary_key("id"))
            .with_column(
                ColumnDef::new(via.as_str(), ScalarType::Integer)
                    .references(ForeignKey::new(parent, "id")),
            )
            .inherits_scope(via, "section_id")
    }

    #[test]
    fn test_scope_cycle_is_rejected() {
        let build = ModelRegistry::build(vec![
            models::section(),
            inheriting("a", "b"),
            inheriting("b", "a"),
        ]);

        assert_eq!(build.registry.identifiers(), vec!["section"]);
        assert_eq!(build.rejected.len(), 2);
        assert_eq!(
            build.rejected[0],
            SchemaError::CyclicScope {
                model: "a".into(),
                parent: "a".into(),
            }
        );
    }

    #[test]
    fn test_scope_chain_depth_limit() {
        let chain = |len: usize| {
            let mut defs = vec![models::section(), models::indicator_types()];
            let mut parent = "indicator_types".to_string();
            for i in 0..len {
                let name = format!("level{}", i);
                defs.push(inheriting(&name, &parent));
                parent = name;
            }
            defs
        };

        // indicator_types is scoped by its own column, so `len` links inherit.
        let build = ModelRegistry::build(chain(MAX_SCOPE_DEPTH));
        assert!(build.is_complete());
        assert_eq!(build.registry.len(), MAX_SCOPE_DEPTH + 2);

        let build = ModelRegistry::build(chain(MAX_SCOPE_DEPTH + 1));
        assert!(matches!(
            &build.rejected[0],
            SchemaError::ScopeTooDeep { model, limit } if model == "level8" && *limit == MAX_SCOPE_DEPTH
        ));
        assert_eq!(build.registry.len(), MAX_SCOPE_DEPTH + 2);
    }

    #[test]
    fn test_reference_models() {
        let registry = ModelRegistry::build(models::declared()).registry;
        let refs: Vec<_> = registry.reference_models().map(|m| m.identifier.as_str()).collect();
        assert_eq!(refs, vec!["section", "indicator_types", "indicators"]);
    }
}
