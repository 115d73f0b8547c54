pub mod category_tree;
pub mod permission_propagator;
pub mod tree_mutator;
pub mod tree_reader;

pub use category_tree::CategoryTreeStore;
pub use permission_propagator::PermissionPropagator;
pub use tree_mutator::TreeMutator;
pub use tree_reader::{Breadcrumb, Crumb, SubtreeCache, TreeReader};
