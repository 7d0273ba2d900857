//! Catalog services built on the registry and the store.

mod data;
pub mod metadata;

pub use data::CatalogService;
pub use metadata::{list_catalogs, CatalogDescription, ColumnDescription, ForeignKeyTarget};
