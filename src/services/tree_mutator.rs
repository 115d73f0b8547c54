use log::{debug, info, warn};

use crate::base::repository::{AdStore, CategoryRepository};
use crate::error::{CategoryTreeError, TreeResult};
use crate::models::category::{AccessControl, Category, CategoryId, NewCategory};
use crate::services::permission_propagator::PermissionPropagator;
use crate::utils;

/// Structural writes to the category tree.
///
/// This is the only type that assigns `left`/`right`. Every method issues
/// several dependent writes, so callers must run it inside one transaction
/// and hold the store's exclusive lock; [`CategoryTreeStore`] does both.
///
/// [`CategoryTreeStore`]: crate::services::CategoryTreeStore
pub struct TreeMutator<'a> {
    repo: &'a dyn CategoryRepository,
    ads: &'a dyn AdStore,
}

impl<'a> TreeMutator<'a> {
    pub fn new(repo: &'a dyn CategoryRepository, ads: &'a dyn AdStore) -> Self {
        Self { repo, ads }
    }

    /// Creates the root (`id = 1`, interval `[1, 2]`) in an empty table and
    /// forces an existing root's parent back to NULL.
    pub fn ensure_root(&self, name: &str) -> TreeResult<Category> {
        if let Some(root) = self.repo.get(CategoryId::ROOT)? {
            if root.parent_id.is_some() {
                warn!("Root category had parent {:?}, clearing it", root.parent_id);
                self.repo.set_parent(CategoryId::ROOT, None)?;
            }
            return self.load(CategoryId::ROOT);
        }

        let existing = self.repo.count()?;
        if existing > 0 {
            return Err(CategoryTreeError::InvariantViolation(format!(
                "{} categories exist but the root is missing",
                existing
            )));
        }

        let mut root = NewCategory::new(CategoryId::ROOT, name).into_category(CategoryId::ROOT, 1);
        root.parent_id = None;
        self.repo.create(&root)?;
        info!("Created root category '{}'", name);
        Ok(root)
    }

    /// Inserts `new` as the last child of its parent.
    pub fn insert(&self, new: NewCategory) -> TreeResult<Category> {
        let Some(parent) = self.repo.get(new.parent_id)? else {
            return Err(CategoryTreeError::InvalidParent {
                child: new.name,
                parent: new.parent_id,
                reason: "parent does not exist",
            });
        };

        // Everything at or after the parent's right bound moves two slots up.
        // Rights first, then lefts: each pass tests its own column only.
        let insert_at = parent.right;
        let rights = self.repo.shift_right_bounds(insert_at, 2)?;
        let lefts = self.repo.shift_left_bounds(insert_at, 2)?;
        debug!(
            "Opened slot at {} under category {} ({} rights, {} lefts shifted)",
            insert_at, parent.id, rights, lefts
        );

        let mut category = new.into_category(CategoryId(0), insert_at);
        category.id = self.repo.create(&category)?;
        debug!(
            "Inserted category {} '{}' at [{}, {}]",
            category.id, category.name, category.left, category.right
        );
        Ok(category)
    }

    /// Deletes the subtree rooted at `id`, closing the gap it leaves.
    ///
    /// Refuses the root and any subtree containing a category that ads still
    /// reference. Returns the number of categories removed.
    pub fn delete(&self, id: CategoryId) -> TreeResult<usize> {
        if id.is_root() {
            return Err(CategoryTreeError::CannotDeleteRoot);
        }
        let node = self.load(id)?;

        for member in self.repo.get_by_interval(node.left, node.right)? {
            if member.is_root() || self.ads.any_ads_in_category(member.id)? {
                warn!("Refusing to delete category {}: {} is in use", id, member.id);
                return Err(CategoryTreeError::SubtreeInUse {
                    requested: id,
                    in_use: member.id,
                });
            }
        }

        let width = node.right - node.left + 1;
        let removed = self.repo.delete_interval(node.left, node.right)?;
        self.repo.shift_right_bounds(node.right + 1, -width)?;
        self.repo.shift_left_bounds(node.right + 1, -width)?;
        debug!(
            "Deleted {} categories in [{}, {}], closed gap of {}",
            removed, node.left, node.right, width
        );
        Ok(removed)
    }

    /// Recomputes every interval from `parent_id` links with a depth-first
    /// walk from the root. Siblings keep their current relative order.
    ///
    /// Fails with `InvariantViolation` if some category is unreachable from
    /// the root. Returns the root's new right bound.
    pub fn rebuild(&self) -> TreeResult<i64> {
        let root = self.load(CategoryId::ROOT)?;
        let total = self.repo.count()?;
        let mut visited = 0;

        let right = self.rebuild_node(&root, 1, total, &mut visited)?;
        if visited != total {
            warn!("Rebuild reached {} of {} categories", visited, total);
            return Err(CategoryTreeError::InvariantViolation(format!(
                "{} categories are not reachable from the root",
                total - visited
            )));
        }

        info!("Rebuilt category tree: {} nodes, root spans [1, {}]", total, right);
        Ok(right)
    }

    fn rebuild_node(
        &self,
        node: &Category,
        left: i64,
        total: i64,
        visited: &mut i64,
    ) -> TreeResult<i64> {
        *visited += 1;
        if *visited > total {
            return Err(CategoryTreeError::InvariantViolation(format!(
                "parent links form a cycle through category {}",
                node.id
            )));
        }

        let mut next = left + 1;
        for child in self.repo.get_children(node.id)? {
            next = self.rebuild_node(&child, next, total, visited)? + 1;
        }

        if (node.left, node.right) != (left, next) {
            self.repo.set_interval(node.id, left, next)?;
        }
        Ok(next)
    }

    /// Re-parents `id` under `new_parent_id` and rebuilds the tree.
    pub fn move_category(&self, id: CategoryId, new_parent_id: CategoryId) -> TreeResult<Category> {
        let node = self.load(id)?;
        let invalid = |reason: &'static str| CategoryTreeError::InvalidParent {
            child: id.to_string(),
            parent: new_parent_id,
            reason,
        };

        if node.is_root() {
            return Err(invalid("the root cannot be re-parented"));
        }
        if new_parent_id == id {
            return Err(invalid("a category cannot be its own parent"));
        }
        let parent = self
            .repo
            .get(new_parent_id)?
            .ok_or_else(|| invalid("parent does not exist"))?;
        if node.contains(&parent) {
            return Err(invalid("parent lies inside the moved subtree"));
        }

        if node.parent_id == Some(new_parent_id) {
            debug!("Category {} already sits under {}", id, new_parent_id);
            return Ok(node);
        }

        self.repo.set_parent(id, Some(new_parent_id))?;
        self.rebuild()?;
        info!("Moved category {} under {}", id, new_parent_id);
        self.load(id)
    }

    /// Saves the presentation and access fields of `category`. With
    /// `propagate`, its access fields are also copied onto every descendant.
    pub fn save(&self, category: &Category, propagate: bool) -> TreeResult<Category> {
        let stored = self.load(category.id)?;

        let mut updated = category.clone();
        updated.updated_at = utils::current_timestamp();
        self.repo.update(&updated)?;

        if propagate {
            self.propagate(stored.id, &updated.access)?;
        }
        self.load(category.id)
    }

    pub fn propagate(&self, root_id: CategoryId, access: &AccessControl) -> TreeResult<usize> {
        PermissionPropagator::new(self.repo).propagate(root_id, access)
    }

    fn load(&self, id: CategoryId) -> TreeResult<Category> {
        self.repo.get(id)?.ok_or(CategoryTreeError::NotFound(id))
    }
}
