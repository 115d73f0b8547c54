pub mod base;
pub mod config;
pub mod data;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

// Re-export capability traits
pub use base::repository::{AccessCheck, AdStore, CategoryRepository};

// Re-export models
pub use models::category::{AccessControl, Category, CategoryId, DisplayColors, NewCategory};

pub use config::StoreConfig;
pub use data::{Database, SqliteAdStore, SqliteCategoryRepository};
pub use error::{CategoryTreeError, TreeResult};
pub use services::{
    Breadcrumb, CategoryTreeStore, PermissionPropagator, SubtreeCache, TreeMutator, TreeReader,
};
pub use utils::TreeInspector;
