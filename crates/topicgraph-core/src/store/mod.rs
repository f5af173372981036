//! SQLite-backed graph storage
//!
//! - `ConnectionManager` owns the database location and hands out connections
//! - `GraphConnection` wraps one `rusqlite::Connection`; vertex, edge and
//!   maintenance operations are implemented on it in their own modules

pub mod connection;
pub mod schema;

pub use connection::{ConnectionManager, GraphConnection};
pub use schema::GRAPH_SCHEMA_VERSION;
