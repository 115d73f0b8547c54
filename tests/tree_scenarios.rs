mod common;

use anyhow::Result;
use chrono::{Duration, Utc};

use classifieds_categories::{
    AccessCheck, AccessControl, CategoryId, CategoryTreeError, NewCategory, SubtreeCache,
};
use common::{open_tree, TestTree};

/// Root > Vehicles > Cars
fn vehicles_and_cars() -> Result<TestTree> {
    let tree = open_tree()?;
    tree.insert(1, "Vehicles")?;
    tree.insert(2, "Cars")?;
    Ok(tree)
}

#[test]
fn test_new_store_has_single_root() -> Result<()> {
    let tree = open_tree()?;
    let root = tree.store.get(CategoryId::ROOT)?;

    assert_eq!(root.name, "Root");
    assert_eq!(root.parent_id, None);
    assert_eq!((root.left, root.right), (1, 2));
    assert_eq!(tree.layout()?, vec![(1, 1, 2)]);
    Ok(())
}

#[test]
fn test_insert_under_root() -> Result<()> {
    let tree = open_tree()?;
    let vehicles = tree.store.insert(NewCategory::new(CategoryId::ROOT, "Vehicles"))?;

    assert_eq!(vehicles.id, CategoryId(2));
    assert_eq!((vehicles.left, vehicles.right), (2, 3));
    assert_eq!(tree.interval(1)?, (1, 4));
    Ok(())
}

#[test]
fn test_insert_nested() -> Result<()> {
    let tree = vehicles_and_cars()?;

    assert_eq!(tree.layout()?, vec![(1, 1, 6), (2, 2, 5), (3, 3, 4)]);
    Ok(())
}

#[test]
fn test_insert_appends_last_child() -> Result<()> {
    let tree = vehicles_and_cars()?;
    let trucks = tree.insert(2, "Trucks")?;

    let children = tree.store.get_children(CategoryId(2))?;
    assert_eq!(TestTree::ids(&children), vec![3, trucks.0]);
    assert_eq!(tree.interval(trucks.0)?, (5, 6));
    assert_eq!(tree.interval(1)?, (1, 8));
    Ok(())
}

#[test]
fn test_insert_rejects_missing_parent() -> Result<()> {
    let tree = open_tree()?;
    let before = tree.layout()?;

    let err = tree
        .store
        .insert(NewCategory::new(CategoryId(42), "Orphan"))
        .unwrap_err();
    assert!(matches!(err, CategoryTreeError::InvalidParent { parent, .. } if parent == CategoryId(42)));
    assert_eq!(tree.layout()?, before);
    Ok(())
}

#[test]
fn test_delete_unused_leaf() -> Result<()> {
    let tree = vehicles_and_cars()?;

    assert_eq!(tree.store.delete(CategoryId(3))?, 1);
    assert_eq!(tree.layout()?, vec![(1, 1, 4), (2, 2, 3)]);
    assert!(matches!(
        tree.store.get(CategoryId(3)),
        Err(CategoryTreeError::NotFound(CategoryId(3)))
    ));
    Ok(())
}

#[test]
fn test_delete_refuses_used_category() -> Result<()> {
    let tree = vehicles_and_cars()?;
    tree.add_ad(3, None)?;
    let before = tree.layout()?;

    let err = tree.store.delete(CategoryId(3)).unwrap_err();
    assert!(matches!(
        err,
        CategoryTreeError::SubtreeInUse { requested: CategoryId(3), in_use: CategoryId(3) }
    ));
    assert_eq!(tree.layout()?, before);
    Ok(())
}

#[test]
fn test_delete_refuses_subtree_with_used_descendant() -> Result<()> {
    let tree = vehicles_and_cars()?;
    tree.add_ad(3, Some(Utc::now() - Duration::days(30)))?;

    let err = tree.store.delete(CategoryId(2)).unwrap_err();
    assert!(matches!(err, CategoryTreeError::SubtreeInUse { in_use: CategoryId(3), .. }));
    assert_eq!(tree.store.get_subtree(CategoryId(2))?.len(), 2);
    Ok(())
}

#[test]
fn test_delete_subtree_closes_gap() -> Result<()> {
    let tree = vehicles_and_cars()?;
    let housing = tree.insert(1, "Housing")?;

    assert_eq!(tree.store.delete(CategoryId(2))?, 2);
    assert_eq!(tree.layout()?, vec![(1, 1, 4), (housing.0, 2, 3)]);
    Ok(())
}

#[test]
fn test_delete_root_and_missing() -> Result<()> {
    let tree = vehicles_and_cars()?;

    assert!(matches!(
        tree.store.delete(CategoryId::ROOT),
        Err(CategoryTreeError::CannotDeleteRoot)
    ));
    assert!(matches!(
        tree.store.delete(CategoryId(77)),
        Err(CategoryTreeError::NotFound(CategoryId(77)))
    ));
    Ok(())
}

#[test]
fn test_subtree_in_depth_first_order() -> Result<()> {
    let tree = vehicles_and_cars()?;

    let subtree = tree.store.get_subtree(CategoryId(2))?;
    assert_eq!(TestTree::ids(&subtree), vec![2, 3]);
    Ok(())
}

#[test]
fn test_ancestors_and_breadcrumb() -> Result<()> {
    let tree = vehicles_and_cars()?;

    let ancestors = tree.store.get_ancestors(CategoryId(3))?;
    assert_eq!(TestTree::ids(&ancestors), vec![1, 2, 3]);
    assert_eq!(ancestors.last(), Some(&tree.store.get(CategoryId(3))?));

    let breadcrumb = tree.store.breadcrumb(CategoryId(3))?;
    assert_eq!(breadcrumb.to_string(), "Root > Vehicles > Cars");
    assert_eq!(breadcrumb.ids(), vec![CategoryId(1), CategoryId(2), CategoryId(3)]);

    assert_eq!(TestTree::ids(&tree.store.get_ancestors(CategoryId::ROOT)?), vec![1]);
    Ok(())
}

#[test]
fn test_parent_id_from_intervals() -> Result<()> {
    let tree = vehicles_and_cars()?;

    assert_eq!(tree.store.get_parent_id(CategoryId(3))?, Some(CategoryId(2)));
    assert_eq!(tree.store.get_parent_id(CategoryId(2))?, Some(CategoryId::ROOT));
    assert_eq!(tree.store.get_parent_id(CategoryId::ROOT)?, None);
    Ok(())
}

#[test]
fn test_siblings() -> Result<()> {
    let tree = vehicles_and_cars()?;
    let trucks = tree.insert(2, "Trucks")?;
    let boats = tree.insert(2, "Boats")?;

    let siblings = tree.store.get_siblings(trucks)?;
    assert_eq!(TestTree::ids(&siblings), vec![3, boats.0]);
    assert!(tree.store.get_siblings(CategoryId::ROOT)?.is_empty());
    Ok(())
}

#[test]
fn test_children_at_depth() -> Result<()> {
    // Root > Vehicles > Cars > Sedans, Root > Housing
    let tree = vehicles_and_cars()?;
    let sedans = tree.insert(3, "Sedans")?;
    let housing = tree.insert(1, "Housing")?;

    let shallow = tree.store.get_children_at_depth(CategoryId::ROOT, 0)?;
    assert_eq!(TestTree::ids(&shallow), vec![1, 2, housing.0]);

    let deeper = tree.store.get_children_at_depth(CategoryId::ROOT, 1)?;
    assert_eq!(TestTree::ids(&deeper), vec![1, 2, 3, housing.0]);

    let all = tree.store.get_children_at_depth(CategoryId::ROOT, 5)?;
    assert_eq!(TestTree::ids(&all), vec![1, 2, 3, sedans.0, housing.0]);

    let from_vehicles = tree.store.get_children_at_depth(CategoryId(2), 0)?;
    assert_eq!(TestTree::ids(&from_vehicles), vec![2, 3]);
    Ok(())
}

#[test]
fn test_is_used_and_ad_counts() -> Result<()> {
    let tree = vehicles_and_cars()?;
    tree.add_ad(2, None)?;
    tree.add_ad(3, Some(Utc::now() + Duration::days(3)))?;
    tree.add_ad(3, Some(Utc::now() - Duration::days(3)))?;

    assert!(tree.store.is_used(CategoryId::ROOT)?);
    assert!(tree.store.is_used(CategoryId(3))?);
    let empty = tree.insert(1, "Jobs")?;
    assert!(!tree.store.is_used(empty)?);

    assert_eq!(tree.store.count_descendant_ads(CategoryId(2), false, false)?, 1);
    assert_eq!(tree.store.count_descendant_ads(CategoryId(2), true, false)?, 3);
    assert_eq!(tree.store.count_descendant_ads(CategoryId(2), true, true)?, 2);
    assert_eq!(tree.store.count_descendant_ads(CategoryId::ROOT, true, false)?, 3);
    Ok(())
}

#[test]
fn test_move_category_rebuilds_intervals() -> Result<()> {
    let tree = vehicles_and_cars()?;
    let housing = tree.insert(1, "Housing")?;

    let moved = tree.store.move_category(CategoryId(3), housing)?;
    assert_eq!(moved.parent_id, Some(housing));

    assert_eq!(TestTree::ids(&tree.store.get_subtree(housing)?), vec![housing.0, 3]);
    assert_eq!(tree.store.get_parent_id(CategoryId(3))?, Some(housing));
    assert_eq!(tree.interval(2)?, (2, 3));
    assert_eq!(tree.interval(housing.0)?, (4, 7));
    tree.store.verify()?;
    Ok(())
}

#[test]
fn test_move_category_rejects_bad_parents() -> Result<()> {
    let tree = vehicles_and_cars()?;
    let before = tree.layout()?;

    for (id, parent) in [(1, 2), (2, 2), (2, 3), (3, 99)] {
        let result = tree.store.move_category(CategoryId(id), CategoryId(parent));
        assert!(
            matches!(result, Err(CategoryTreeError::InvalidParent { .. })),
            "moving {} under {} should be rejected",
            id,
            parent
        );
    }
    assert_eq!(tree.layout()?, before);
    Ok(())
}

#[test]
fn test_update_category_keeps_structure() -> Result<()> {
    let tree = vehicles_and_cars()?;
    let mut cars = tree.store.get(CategoryId(3))?;
    let loaded_at = cars.updated_at;
    cars.name = "Automobiles".to_string();
    cars.keywords = "sedan, hatchback".to_string();
    cars.parent_id = Some(CategoryId::ROOT);
    cars.left = 100;

    let saved = tree.store.update_category(&cars, false)?;
    assert_eq!(saved.name, "Automobiles");
    assert_eq!(saved.keywords, "sedan, hatchback");
    assert_eq!(saved.parent_id, Some(CategoryId(2)));
    assert_eq!((saved.left, saved.right), (3, 4));
    assert!(saved.updated_at >= loaded_at);
    assert_eq!(saved.created_at, cars.created_at);
    Ok(())
}

#[test]
fn test_update_category_with_propagation() -> Result<()> {
    let tree = vehicles_and_cars()?;
    let sedans = tree.insert(3, "Sedans")?;
    let housing = tree.insert(1, "Housing")?;

    let mut vehicles = tree.store.get(CategoryId(2))?;
    let locked = AccessControl::new(9, 4, [3, 3, 0, 0]);
    vehicles.access = locked;
    tree.store.update_category(&vehicles, true)?;

    for id in [2, 3, sedans.0] {
        assert_eq!(tree.store.get(CategoryId(id))?.access, locked, "category {}", id);
    }
    assert_eq!(tree.store.get(housing)?.access, AccessControl::default());
    assert_eq!(tree.store.get(CategoryId::ROOT)?.access, AccessControl::default());
    Ok(())
}

#[test]
fn test_propagate_excludes_root_of_subtree() -> Result<()> {
    let tree = vehicles_and_cars()?;
    let access = AccessControl::new(2, 7, [3, 2, 0, 0]);

    assert_eq!(tree.store.propagate_permissions(CategoryId(2), &access)?, 1);
    assert_eq!(tree.store.get(CategoryId(3))?.access, access);
    assert_eq!(tree.store.get(CategoryId(2))?.access, AccessControl::default());

    assert!(matches!(
        tree.store.propagate_permissions(CategoryId(50), &access),
        Err(CategoryTreeError::NotFound(CategoryId(50)))
    ));
    Ok(())
}

struct AnonymousVisitor;

impl AccessCheck for AnonymousVisitor {
    fn has_access(&self, access: &AccessControl, required_level: u8) -> bool {
        access.perm_anon >= required_level
    }
}

#[test]
fn test_visible_subtree_hides_descendants_of_hidden_nodes() -> Result<()> {
    let tree = vehicles_and_cars()?;
    let members_only = AccessControl::new(0, 0, [3, 2, 2, 0]);
    let jobs = tree
        .store
        .insert(NewCategory::new(CategoryId::ROOT, "Jobs").with_access(members_only))?;
    tree.insert(jobs.id.0, "Contract")?;

    let visible = tree.store.visible_subtree(CategoryId::ROOT, &AnonymousVisitor, 2)?;
    assert_eq!(TestTree::ids(&visible), vec![1, 2, 3]);
    Ok(())
}

#[test]
fn test_subtree_cache_is_caller_owned() -> Result<()> {
    let tree = vehicles_and_cars()?;
    let mut cache = SubtreeCache::new();

    let first = tree.store.get_subtree_cached(CategoryId(2), &mut cache)?;
    assert_eq!(cache.len(), 1);

    // A later insert is invisible through the same cache until it is cleared
    tree.insert(2, "Trucks")?;
    let cached = tree.store.get_subtree_cached(CategoryId(2), &mut cache)?;
    assert_eq!(cached, first);

    cache.clear();
    let fresh = tree.store.get_subtree_cached(CategoryId(2), &mut cache)?;
    assert_eq!(fresh.len(), 3);
    Ok(())
}
