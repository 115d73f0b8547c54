use anyhow::{Context, Result};
use log::info;
use std::env;

use classifieds_categories::{CategoryId, CategoryTreeStore, StoreConfig};

fn main() -> Result<()> {
    env_logger::init();

    let mut as_json = false;
    let mut start = CategoryId::ROOT;
    for arg in env::args().skip(1) {
        if arg == "--json" {
            as_json = true;
        } else {
            let id: i64 = arg
                .parse()
                .with_context(|| format!("Expected a category id, got '{}'", arg))?;
            start = CategoryId(id);
        }
    }

    let config = StoreConfig::load()?;
    info!("Opening category tree at {}", config.database_path.display());
    let store = CategoryTreeStore::open(config)?;

    let subtree = store.get_subtree(start)?;
    if as_json {
        println!("{}", serde_json::to_string_pretty(&subtree)?);
        return Ok(());
    }

    println!("{}", store.breadcrumb(start)?);
    let mut open_rights: Vec<i64> = Vec::new();
    for category in &subtree {
        while open_rights.last().map_or(false, |&right| right < category.left) {
            open_rights.pop();
        }
        println!(
            "{}{} (#{}, [{}, {}])",
            "  ".repeat(open_rights.len()),
            category.name,
            category.id,
            category.left,
            category.right
        );
        open_rights.push(category.right);
    }

    Ok(())
}
