//! Defines the route handler for the page showing a single budget and its
//! category tree.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    database_id::DatabaseID,
    endpoints,
    html::{
        LINK_STYLE, OVER_ALLOCATED_BADGE_STYLE, PAGE_CONTAINER_STYLE, base, format_currency,
    },
    navigation::NavBar,
    user::UserID,
};

use super::core::{Budget, BudgetCategory, effective_allocation, get_budget, total_allocated};

fn budget_view(budget: &Budget) -> Markup {
    let nav_bar = NavBar::new(endpoints::BUDGETS_VIEW).into_html();
    let allocated = total_allocated(&budget.categories);
    let remaining = budget.amount - allocated;

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-2xl"
            {
                div class="flex items-center justify-between mb-2"
                {
                    h1 class="text-2xl font-bold" { (budget.name) }

                    a
                        href=(endpoints::format_endpoint(endpoints::EDIT_BUDGET_VIEW, budget.id))
                        class=(LINK_STYLE)
                    {
                        "Edit"
                    }
                }

                p class="text-sm text-gray-500 dark:text-gray-400 mb-4"
                {
                    (budget.start_date) " – " (budget.end_date)
                }

                div class="grid grid-cols-3 gap-4 mb-6 text-center"
                {
                    div
                    {
                        p class="text-sm text-gray-500 dark:text-gray-400" { "Budget" }
                        p class="font-semibold" { (format_currency(budget.amount)) }
                    }

                    div
                    {
                        p class="text-sm text-gray-500 dark:text-gray-400" { "Allocated" }
                        p class="font-semibold"
                        {
                            (format_currency(allocated))

                            @if allocated > budget.amount
                            {
                                " "
                                span class=(OVER_ALLOCATED_BADGE_STYLE) { "Over budget" }
                            }
                        }
                    }

                    div
                    {
                        p class="text-sm text-gray-500 dark:text-gray-400" { "Remaining" }
                        p class="font-semibold" { (format_currency(remaining)) }
                    }
                }

                h2 class="text-xl font-bold mb-2" { "Categories" }

                @if budget.categories.is_empty()
                {
                    p class="text-gray-500 dark:text-gray-400"
                    {
                        "This budget has no categories."
                    }
                }
                @else
                {
                    (category_list(&budget.categories))
                }
            }
        }
    };

    base(&budget.name, &[], &content)
}

/// Render categories as a nested list, each with its effective allocation.
fn category_list(categories: &[BudgetCategory]) -> Markup {
    html! {
        ul class="space-y-1 pl-4 border-l border-gray-200 dark:border-gray-700"
        {
            @for category in categories
            {
                li
                {
                    div class="flex justify-between"
                    {
                        span { (category.name) }
                        span { (format_currency(effective_allocation(category))) }
                    }

                    @if !category.subcategories.is_empty()
                    {
                        (category_list(&category.subcategories))
                    }
                }
            }
        }
    }
}

/// The state needed for the budget detail page.
#[derive(Debug, Clone)]
pub struct BudgetPageState {
    /// The database connection for reading budgets.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for BudgetPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render a single budget with its category tree.
pub async fn get_budget_page(
    State(state): State<BudgetPageState>,
    Path(budget_id): Path<DatabaseID>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let budget = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        get_budget(budget_id, user_id, &connection)?
    };

    Ok(budget_view(&budget).into_response())
}
