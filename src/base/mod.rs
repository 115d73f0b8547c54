// Capability traits at the seams of the tree engine
pub mod repository;

pub use repository::{AccessCheck, AdStore, CategoryRepository};
