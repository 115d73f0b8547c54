use log::debug;

use crate::base::repository::CategoryRepository;
use crate::error::{CategoryTreeError, TreeResult};
use crate::models::category::{AccessControl, CategoryId};

/// Copies access-control fields from a category onto all of its descendants
pub struct PermissionPropagator<'a> {
    repo: &'a dyn CategoryRepository,
}

impl<'a> PermissionPropagator<'a> {
    pub fn new(repo: &'a dyn CategoryRepository) -> Self {
        Self { repo }
    }

    /// Overwrites owner, group and permission levels of every strict
    /// descendant of `root_id`. The root row itself is left alone.
    ///
    /// Returns the number of rows written.
    pub fn propagate(&self, root_id: CategoryId, access: &AccessControl) -> TreeResult<usize> {
        let root = self
            .repo
            .get(root_id)?
            .ok_or(CategoryTreeError::NotFound(root_id))?;

        let updated = self.repo.update_access_within(root.left, root.right, access)?;
        debug!(
            "Propagated access {:?} from category {} to {} descendants",
            access.perms(),
            root_id,
            updated
        );
        Ok(updated)
    }
}
