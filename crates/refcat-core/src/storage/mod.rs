//! Storage layer for refcat.
//!
//! A thin SQLite layer: one connection per session, tables generated from
//! model definitions, full-table scans and transactional batch inserts.

mod config;
pub mod ddl;
mod engine;

pub use config::{StoreConfig, DEFAULT_BUSY_TIMEOUT};
pub use engine::{Session, Snapshot, Store};
