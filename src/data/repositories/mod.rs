mod ad_repository;
mod category_repository;

pub use ad_repository::SqliteAdStore;
pub use category_repository::SqliteCategoryRepository;
