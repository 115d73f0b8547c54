use log::warn;
use std::collections::HashSet;

use crate::base::repository::CategoryRepository;
use crate::error::{CategoryTreeError, TreeResult};
use crate::models::category::{Category, CategoryId};

/// Nested-set consistency checker.
///
/// Used by tests and, when `verify_after_mutation` is enabled, by the store
/// right before a mutation commits.
pub struct TreeInspector;

impl TreeInspector {
    /// Loads every row and fails with `InvariantViolation` on the first issue
    pub fn verify(repo: &dyn CategoryRepository) -> TreeResult<()> {
        let categories = repo.get_all()?;
        let issues = Self::check(&categories);
        match issues.first() {
            None => Ok(()),
            Some(first) => {
                for issue in &issues {
                    warn!("Category tree issue: {}", issue);
                }
                Err(CategoryTreeError::InvariantViolation(first.clone()))
            }
        }
    }

    /// Lists every invariant violation; `categories` must be sorted by `left`
    pub fn check(categories: &[Category]) -> Vec<String> {
        let mut issues = Vec::new();

        let Some(first) = categories.first() else {
            issues.push("Tree has no root category".to_string());
            return issues;
        };
        if first.id != CategoryId::ROOT || first.left != 1 || first.parent_id.is_some() {
            issues.push(format!(
                "First node must be the root with left = 1, found {} at [{}, {}]",
                first.id, first.left, first.right
            ));
        }

        let roots = categories.iter().filter(|c| c.parent_id.is_none()).count();
        if roots != 1 {
            issues.push(format!("Expected exactly one parentless node, found {}", roots));
        }

        let mut bounds = HashSet::with_capacity(categories.len() * 2);
        for category in categories {
            if category.left >= category.right {
                issues.push(format!(
                    "Category {} has left {} >= right {}",
                    category.id, category.left, category.right
                ));
            }
            for bound in [category.left, category.right] {
                if !bounds.insert(bound) {
                    issues.push(format!("Bound {} of category {} is shared", bound, category.id));
                }
            }
        }
        let expected_max = categories.len() as i64 * 2;
        if bounds.iter().any(|b| *b < 1 || *b > expected_max) {
            issues.push(format!("Bounds are not the contiguous range 1..={}", expected_max));
        }

        let lefts: Vec<i64> = categories.iter().map(|c| c.left).collect();
        let mut open: Vec<&Category> = Vec::new();
        for (index, category) in categories.iter().enumerate() {
            while open.last().map_or(false, |top| top.right < category.left) {
                open.pop();
            }

            match open.last() {
                Some(enclosing) if category.right > enclosing.right => issues.push(format!(
                    "Category {} partially overlaps {}",
                    category.id, enclosing.id
                )),
                Some(enclosing) if category.parent_id != Some(enclosing.id) => {
                    issues.push(format!(
                        "Category {} sits inside {} but its parent is {:?}",
                        category.id,
                        enclosing.id,
                        category.parent_id.map(|p| p.0)
                    ))
                }
                None if index > 0 => {
                    issues.push(format!("Category {} lies outside the root", category.id))
                }
                _ => {}
            }

            let descendants = lefts
                .partition_point(|&l| l < category.right)
                .saturating_sub(index + 1);
            if category.right - category.left != 2 * descendants as i64 + 1 {
                issues.push(format!(
                    "Category {} spans [{}, {}] but has {} descendants",
                    category.id, category.left, category.right, descendants
                ));
            }

            open.push(category);
        }

        issues
    }
}
