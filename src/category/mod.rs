//! Categories for grouping transactions, budgets and recurring transactions.

mod core;
mod endpoints;

pub use core::{
    CategoryId, CategoryName, NewCategory, count_categories, create_category,
    create_category_table, delete_category, get_all_categories, get_category,
    seed_default_categories, update_category,
};
#[cfg(test)]
pub use core::{Category, DEFAULT_CATEGORY_COLOR, DEFAULT_CATEGORY_ICON};
pub use endpoints::{
    create_category_endpoint, delete_category_endpoint, get_categories_endpoint,
    update_category_endpoint,
};
