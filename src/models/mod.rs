pub mod category;

pub use category::{AccessControl, Category, CategoryId, DisplayColors, NewCategory};
