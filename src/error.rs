//! Error types returned by the category tree store

use thiserror::Error;

use crate::models::CategoryId;

/// Failures surfaced by tree reads and mutations.
///
/// Any error raised inside a mutation aborts its transaction, so a caller
/// never observes a partially shifted tree.
#[derive(Error, Debug)]
pub enum CategoryTreeError {
    /// The referenced category does not exist
    #[error("Category {0} not found")]
    NotFound(CategoryId),

    /// Insert or re-parent named a parent that cannot hold the node
    #[error("Invalid parent {parent} for category {child}: {reason}")]
    InvalidParent {
        child: String,
        parent: CategoryId,
        reason: &'static str,
    },

    /// The fixed root node is never deleted
    #[error("The root category cannot be deleted")]
    CannotDeleteRoot,

    /// A node in the subtree is still referenced by ads
    #[error("Category {requested} cannot be deleted: category {in_use} is still in use")]
    SubtreeInUse {
        requested: CategoryId,
        in_use: CategoryId,
    },

    /// Nested-set bookkeeping no longer matches the hierarchy
    #[error("Tree invariant violated: {0}")]
    InvariantViolation(String),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Underlying persistence failure
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl From<rusqlite::Error> for CategoryTreeError {
    fn from(err: rusqlite::Error) -> Self {
        CategoryTreeError::Storage(err.into())
    }
}

impl From<r2d2::Error> for CategoryTreeError {
    fn from(err: r2d2::Error) -> Self {
        CategoryTreeError::Storage(err.into())
    }
}

pub type TreeResult<T> = std::result::Result<T, CategoryTreeError>;
