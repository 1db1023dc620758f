//! Budget management for the application.
//!
//! This module contains everything related to budgets:
//! - The `Budget` model with its recursive category tree and the allocation
//!   aggregation
//! - Database functions for storing, querying and replacing budgets
//! - View handlers and endpoints for budget-related web pages

mod budget_page;
mod budgets_page;
mod core;
mod create_endpoint;
mod create_page;
mod delete_endpoint;
mod edit_endpoint;
mod edit_page;
mod form;

pub use budget_page::get_budget_page;
pub use budgets_page::get_budgets_page;
pub use core::{Budget, BudgetCategory, NewBudget, create_budget, create_budget_table, total_allocated};
pub use create_endpoint::create_budget_endpoint;
pub use create_page::get_create_budget_page;
pub use delete_endpoint::delete_budget_endpoint;
pub use edit_endpoint::update_budget_endpoint;
pub use edit_page::get_edit_budget_page;
