//! Defines the route handler for the page that lists the user's budgets.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error, endpoints,
    html::{
        LINK_STYLE, OVER_ALLOCATED_BADGE_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, edit_delete_action_links, format_currency,
        link,
    },
    navigation::NavBar,
    user::UserID,
};

use super::core::{Budget, list_budgets, total_allocated};

fn budgets_view(budgets: &[Budget]) -> Markup {
    let nav_bar = NavBar::new(endpoints::BUDGETS_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-4xl"
            {
                div class="flex items-center justify-between mb-4"
                {
                    h1 class="text-2xl font-bold" { "Budgets" }

                    a href=(endpoints::NEW_BUDGET_VIEW) class=(LINK_STYLE) { "New Budget" }
                }

                @if budgets.is_empty()
                {
                    p class="text-gray-500 dark:text-gray-400"
                    {
                        "You don't have any budgets yet. "
                        (link(endpoints::NEW_BUDGET_VIEW, "Create your first budget"))
                        "."
                    }
                }
                @else
                {
                    // Table for desktop.
                    div class="hidden md:block relative overflow-x-auto shadow-md sm:rounded-lg"
                    {
                        table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
                        {
                            thead class=(TABLE_HEADER_STYLE)
                            {
                                tr
                                {
                                    th scope="col" class=(TABLE_CELL_STYLE) { "Name" }
                                    th scope="col" class=(TABLE_CELL_STYLE) { "Period" }
                                    th scope="col" class=(TABLE_CELL_STYLE) { "Amount" }
                                    th scope="col" class=(TABLE_CELL_STYLE) { "Allocated" }
                                    th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                                }
                            }

                            tbody
                            {
                                @for budget in budgets
                                {
                                    (budget_table_row(budget))
                                }
                            }
                        }
                    }

                    // Cards for mobile.
                    div class="md:hidden space-y-4"
                    {
                        @for budget in budgets
                        {
                            (budget_card(budget))
                        }
                    }
                }
            }
        }
    };

    base("Budgets", &[], &content)
}

fn budget_table_row(budget: &Budget) -> Markup {
    let allocated = total_allocated(&budget.categories);

    html! {
        tr class=(TABLE_ROW_STYLE)
        {
            td class=(TABLE_CELL_STYLE)
            {
                a
                    href=(endpoints::format_endpoint(endpoints::BUDGET_VIEW, budget.id))
                    class=(LINK_STYLE)
                {
                    (budget.name)
                }
            }

            td class=(TABLE_CELL_STYLE) { (budget.start_date) " – " (budget.end_date) }
            td class=(TABLE_CELL_STYLE) { (format_currency(budget.amount)) }

            td class=(TABLE_CELL_STYLE)
            {
                (format_currency(allocated))

                @if allocated > budget.amount
                {
                    " "
                    span class=(OVER_ALLOCATED_BADGE_STYLE) { "Over budget" }
                }
            }

            td class=(TABLE_CELL_STYLE)
            {
                (edit_delete_action_links(
                    &endpoints::format_endpoint(endpoints::EDIT_BUDGET_VIEW, budget.id),
                    &endpoints::format_endpoint(endpoints::DELETE_BUDGET, budget.id),
                    "closest tr",
                ))
            }
        }
    }
}

fn budget_card(budget: &Budget) -> Markup {
    let allocated = total_allocated(&budget.categories);

    html! {
        article class="p-4 bg-white rounded-lg shadow dark:bg-gray-800"
        {
            div class="flex items-center justify-between"
            {
                a
                    href=(endpoints::format_endpoint(endpoints::BUDGET_VIEW, budget.id))
                    class={ "font-semibold " (LINK_STYLE) }
                {
                    (budget.name)
                }

                @if allocated > budget.amount
                {
                    span class=(OVER_ALLOCATED_BADGE_STYLE) { "Over budget" }
                }
            }

            p class="text-sm text-gray-500 dark:text-gray-400"
            {
                (budget.start_date) " – " (budget.end_date)
            }

            p class="text-sm"
            {
                (format_currency(allocated)) " of " (format_currency(budget.amount)) " allocated"
            }

            (edit_delete_action_links(
                &endpoints::format_endpoint(endpoints::EDIT_BUDGET_VIEW, budget.id),
                &endpoints::format_endpoint(endpoints::DELETE_BUDGET, budget.id),
                "closest article",
            ))
        }
    }
}

/// The state needed for the budgets page.
#[derive(Debug, Clone)]
pub struct BudgetsPageState {
    /// The database connection for reading budgets.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for BudgetsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render an overview of the user's budgets, most recent first.
pub async fn get_budgets_page(
    State(state): State<BudgetsPageState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let budgets = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        list_budgets(user_id, &connection)
            .inspect_err(|error| tracing::error!("could not list budgets: {error}"))?
    };

    Ok(budgets_view(&budgets).into_response())
}

#[cfg(test)]
mod budgets_page_tests {
    use std::{
        str::FromStr,
        sync::{Arc, Mutex},
    };

    use axum::{Extension, extract::State};
    use email_address::EmailAddress;
    use rusqlite::Connection;
    use scraper::Selector;
    use time::macros::date;

    use crate::{
        PasswordHash,
        budget::core::{BudgetCategory, NewBudget, create_budget},
        db::initialize,
        endpoints,
        test_utils::{assert_status_ok, assert_valid_html, parse_html_document},
        user::{UserID, create_user},
    };

    use super::{BudgetsPageState, get_budgets_page};

    fn get_test_state() -> BudgetsPageState {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        BudgetsPageState {
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    fn create_test_user(state: &BudgetsPageState) -> UserID {
        let connection = state.db_connection.lock().unwrap();
        create_user(
            EmailAddress::from_str("hello@world.com").unwrap(),
            PasswordHash::new_unchecked("hunter2"),
            &connection,
        )
        .unwrap()
        .id
    }

    fn create_test_budget(state: &BudgetsPageState, user_id: UserID, name: &str, amount: f64) {
        let connection = state.db_connection.lock().unwrap();
        create_budget(
            NewBudget {
                user_id,
                name: name.to_owned(),
                amount,
                start_date: date!(2024 - 01 - 01),
                end_date: date!(2024 - 01 - 31),
                categories: vec![BudgetCategory {
                    id: 0,
                    name: "Groceries".to_owned(),
                    amount: 400.0,
                    subcategories: Vec::new(),
                }],
            },
            &connection,
        )
        .unwrap();
    }

    #[tokio::test]
    async fn page_lists_budgets_with_links() {
        let state = get_test_state();
        let user_id = create_test_user(&state);
        create_test_budget(&state, user_id, "Groceries 2024", 1000.0);

        let response = get_budgets_page(State(state), Extension(user_id))
            .await
            .unwrap();

        assert_status_ok(&response);
        let document = parse_html_document(response).await;
        assert_valid_html(&document);

        let row_selector = Selector::parse("tbody tr").unwrap();
        let rows: Vec<_> = document.select(&row_selector).collect();
        assert_eq!(rows.len(), 1, "want 1 table row, got {}", rows.len());

        let text: String = rows[0].text().collect();
        assert!(text.contains("Groceries 2024"));
        assert!(text.contains("$400.00"), "want allocated total, got {text}");

        let link_selector = Selector::parse("a[href]").unwrap();
        assert!(
            document
                .select(&link_selector)
                .any(|link| link.value().attr("href")
                    == Some(&endpoints::format_endpoint(endpoints::BUDGET_VIEW, 1))),
            "want a link to the budget's detail page"
        );
    }

    #[tokio::test]
    async fn page_shows_over_allocated_badge() {
        let state = get_test_state();
        let user_id = create_test_user(&state);
        // The category tree allocates $400 against a $100 ceiling.
        create_test_budget(&state, user_id, "Tight Month", 100.0);

        let response = get_budgets_page(State(state), Extension(user_id))
            .await
            .unwrap();

        let document = parse_html_document(response).await;

        let badge_selector = Selector::parse("span").unwrap();
        assert!(
            document
                .select(&badge_selector)
                .any(|span| span.text().collect::<String>() == "Over budget"),
            "want an over-allocated badge"
        );
    }

    #[tokio::test]
    async fn page_does_not_show_badge_when_within_budget() {
        let state = get_test_state();
        let user_id = create_test_user(&state);
        create_test_budget(&state, user_id, "Comfortable Month", 1000.0);

        let response = get_budgets_page(State(state), Extension(user_id))
            .await
            .unwrap();

        let document = parse_html_document(response).await;

        let badge_selector = Selector::parse("span").unwrap();
        assert!(
            !document
                .select(&badge_selector)
                .any(|span| span.text().collect::<String>() == "Over budget"),
            "want no over-allocated badge"
        );
    }

    #[tokio::test]
    async fn page_shows_empty_state_with_create_link() {
        let state = get_test_state();
        let user_id = create_test_user(&state);

        let response = get_budgets_page(State(state), Extension(user_id))
            .await
            .unwrap();

        let document = parse_html_document(response).await;

        let paragraph_selector = Selector::parse("p").unwrap();
        assert!(
            document
                .select(&paragraph_selector)
                .any(|p| p.text().collect::<String>().contains("any budgets yet")),
            "want an empty state message"
        );

        let link_selector = Selector::parse("a[href]").unwrap();
        assert!(
            document
                .select(&link_selector)
                .any(|link| link.value().attr("href") == Some(endpoints::NEW_BUDGET_VIEW)),
            "want a link to the new budget page"
        );
    }

    #[tokio::test]
    async fn rows_have_delete_buttons_targeting_the_row() {
        let state = get_test_state();
        let user_id = create_test_user(&state);
        create_test_budget(&state, user_id, "Groceries 2024", 1000.0);

        let response = get_budgets_page(State(state), Extension(user_id))
            .await
            .unwrap();

        let document = parse_html_document(response).await;

        let button_selector = Selector::parse("button[hx-delete]").unwrap();
        let button = document
            .select(&button_selector)
            .next()
            .expect("want a delete button");

        assert_eq!(
            button.value().attr("hx-delete"),
            Some(endpoints::format_endpoint(endpoints::DELETE_BUDGET, 1).as_str())
        );
        assert_eq!(button.value().attr("hx-target"), Some("closest tr"));
        assert!(
            button.value().attr("hx-confirm").is_some(),
            "want delete button to ask for confirmation"
        );
    }
}
