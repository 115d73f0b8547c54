use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::base::repository::{AccessCheck, AdStore, CategoryRepository};
use crate::error::{CategoryTreeError, TreeResult};
use crate::models::category::{Category, CategoryId};

/// Range queries over the nested-set intervals
pub struct TreeReader<'a> {
    repo: &'a dyn CategoryRepository,
    ads: &'a dyn AdStore,
}

/// Subtree results memoised for the lifetime of one caller-owned request
#[derive(Debug, Default)]
pub struct SubtreeCache {
    entries: HashMap<CategoryId, Vec<Category>>,
}

impl SubtreeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: CategoryId) -> Option<&[Category]> {
        self.entries.get(&id).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// One step of a breadcrumb trail
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Crumb {
    pub id: CategoryId,
    pub name: String,
}

/// Path from the root down to a category
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Breadcrumb {
    pub crumbs: Vec<Crumb>,
}

impl Breadcrumb {
    pub fn ids(&self) -> Vec<CategoryId> {
        self.crumbs.iter().map(|c| c.id).collect()
    }
}

impl fmt::Display for Breadcrumb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, crumb) in self.crumbs.iter().enumerate() {
            if index > 0 {
                write!(f, " > ")?;
            }
            write!(f, "{}", crumb.name)?;
        }
        Ok(())
    }
}

impl<'a> TreeReader<'a> {
    pub fn new(repo: &'a dyn CategoryRepository, ads: &'a dyn AdStore) -> Self {
        Self { repo, ads }
    }

    pub fn get(&self, id: CategoryId) -> TreeResult<Category> {
        self.repo.get(id)?.ok_or(CategoryTreeError::NotFound(id))
    }

    /// Direct children in depth-first order
    pub fn get_children(&self, id: CategoryId) -> TreeResult<Vec<Category>> {
        self.get(id)?;
        Ok(self.repo.get_children(id)?)
    }

    /// `id` and all of its descendants in depth-first order
    pub fn get_subtree(&self, id: CategoryId) -> TreeResult<Vec<Category>> {
        let root = self.get(id)?;
        Ok(self.repo.get_by_interval(root.left, root.right)?)
    }

    /// Like [`get_subtree`](Self::get_subtree), answering repeat lookups from `cache`
    pub fn get_subtree_cached(
        &self,
        id: CategoryId,
        cache: &mut SubtreeCache,
    ) -> TreeResult<Vec<Category>> {
        if let Some(hit) = cache.get(id) {
            return Ok(hit.to_vec());
        }
        let subtree = self.get_subtree(id)?;
        cache.entries.insert(id, subtree.clone());
        Ok(subtree)
    }

    /// Subtree of `id` limited to nodes with at most `max_depth` ancestors
    /// strictly between `id` and themselves. `id` itself is always included,
    /// so `max_depth = 0` yields the node and its direct children.
    pub fn get_children_at_depth(&self, id: CategoryId, max_depth: usize) -> TreeResult<Vec<Category>> {
        let subtree = self.get_subtree(id)?;
        let mut open_rights: Vec<i64> = Vec::new();
        let mut selected = Vec::with_capacity(subtree.len());

        for category in subtree {
            while open_rights.last().map_or(false, |&right| right < category.left) {
                open_rights.pop();
            }
            // open_rights holds the subtree root plus any ancestors in between
            let between = open_rights.len().saturating_sub(1);
            let keep = open_rights.is_empty() || between <= max_depth;
            open_rights.push(category.right);
            if keep {
                selected.push(category);
            }
        }

        Ok(selected)
    }

    /// Every category on the path from the root to `id`, both inclusive
    pub fn get_ancestors(&self, id: CategoryId) -> TreeResult<Vec<Category>> {
        let node = self.get(id)?;
        Ok(self.repo.get_enclosing(node.left, node.right)?)
    }

    /// The closest ancestor of `id`, derived from the intervals; `None` for the root
    pub fn get_parent_id(&self, id: CategoryId) -> TreeResult<Option<CategoryId>> {
        let ancestors = self.get_ancestors(id)?;
        Ok(ancestors
            .iter()
            .filter(|a| a.id != id)
            .max_by_key(|a| a.left)
            .map(|a| a.id))
    }

    /// Other children of the same parent in depth-first order
    pub fn get_siblings(&self, id: CategoryId) -> TreeResult<Vec<Category>> {
        let node = self.get(id)?;
        let Some(parent_id) = node.parent_id else {
            return Ok(Vec::new());
        };
        Ok(self
            .repo
            .get_children(parent_id)?
            .into_iter()
            .filter(|c| c.id != id)
            .collect())
    }

    pub fn breadcrumb(&self, id: CategoryId) -> TreeResult<Breadcrumb> {
        let crumbs = self
            .get_ancestors(id)?
            .into_iter()
            .map(|c| Crumb { id: c.id, name: c.name })
            .collect();
        Ok(Breadcrumb { crumbs })
    }

    /// The root counts as used; any other category is used while an ad references it
    pub fn is_used(&self, id: CategoryId) -> TreeResult<bool> {
        let node = self.get(id)?;
        if node.is_root() {
            return Ok(true);
        }
        Ok(self.ads.any_ads_in_category(id)?)
    }

    /// Sums the ads filed under `id`, and under its descendants when
    /// `include_subtree` is set
    pub fn count_descendant_ads(
        &self,
        id: CategoryId,
        include_subtree: bool,
        only_active: bool,
    ) -> TreeResult<u64> {
        let ids: Vec<CategoryId> = if include_subtree {
            self.get_subtree(id)?.into_iter().map(|c| c.id).collect()
        } else {
            vec![self.get(id)?.id]
        };

        let mut total = 0;
        for category_id in ids {
            total += self.ads.count_ads_in_category(category_id, only_active)?;
        }
        Ok(total)
    }

    /// Subtree of `id` with every category the actor cannot reach at
    /// `required_level` removed together with its descendants
    pub fn visible_subtree(
        &self,
        id: CategoryId,
        checker: &dyn AccessCheck,
        required_level: u8,
    ) -> TreeResult<Vec<Category>> {
        let mut hidden_until: Option<i64> = None;
        let mut visible = Vec::new();

        for category in self.get_subtree(id)? {
            if hidden_until.map_or(false, |right| category.left < right) {
                continue;
            }
            if checker.has_access(&category.access, required_level) {
                hidden_until = None;
                visible.push(category);
            } else {
                hidden_until = Some(category.right);
            }
        }

        Ok(visible)
    }
}
