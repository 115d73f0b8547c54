pub mod database;
pub mod migration;
pub mod repositories;
pub mod types;

pub use database::{Connection, ConnectionPool, Database};
pub use repositories::{SqliteAdStore, SqliteCategoryRepository};
