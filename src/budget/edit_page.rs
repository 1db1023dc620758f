//! Defines the route handler for the page for editing an existing budget.

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
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base,
        dollar_input_styles, loading_spinner,
    },
    navigation::NavBar,
    user::UserID,
};

use super::core::{Budget, get_budget};

fn edit_budget_view(budget: &Budget, categories_json: &str) -> Markup {
    let update_route = endpoints::format_endpoint(endpoints::PUT_BUDGET, budget.id);
    let nav_bar = NavBar::new(endpoints::BUDGETS_VIEW).into_html();
    let spinner = loading_spinner();

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            form
                hx-put=(update_route)
                hx-target-error="#alert-container"
                class="w-full space-y-4 md:space-y-6"
            {
                h2 class="text-xl font-bold" { "Edit Budget" }

                div
                {
                    label for="name" class=(FORM_LABEL_STYLE) { "Name" }

                    input
                        name="name"
                        id="name"
                        type="text"
                        required
                        autofocus
                        value=(budget.name)
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                div
                {
                    label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }

                    // w-full needed to ensure input takes the full width when prefilled with a value
                    div class="input-wrapper w-full"
                    {
                        input
                            name="amount"
                            id="amount"
                            type="number"
                            step="0.01"
                            min="0"
                            required
                            value=(budget.amount)
                            class=(FORM_TEXT_INPUT_STYLE);
                    }
                }

                div
                {
                    label for="start_date" class=(FORM_LABEL_STYLE) { "Start Date" }

                    input
                        name="start_date"
                        id="start_date"
                        type="date"
                        required
                        value=(budget.start_date)
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                div
                {
                    label for="end_date" class=(FORM_LABEL_STYLE) { "End Date" }

                    input
                        name="end_date"
                        id="end_date"
                        type="date"
                        value=(budget.end_date)
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                div
                {
                    label for="categories" class=(FORM_LABEL_STYLE) { "Categories" }

                    textarea
                        name="categories"
                        id="categories"
                        rows="12"
                        class=(FORM_TEXT_INPUT_STYLE)
                    {
                        (categories_json)
                    }

                    p class="mt-1 text-xs text-gray-500 dark:text-gray-400"
                    {
                        "Saving replaces the whole category tree with this document."
                    }
                }

                button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
                {
                    span
                        id="indicator"
                        class="inline htmx-indicator"
                    {
                        (spinner)
                    }
                    " Save Budget"
                }
            }
        }
    };

    base("Edit Budget", &[dollar_input_styles()], &content)
}

/// The state needed for the edit budget page.
#[derive(Debug, Clone)]
pub struct EditBudgetPageState {
    /// The database connection for reading budgets.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditBudgetPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Renders the page for editing a budget, prefilled with its stored values.
pub async fn get_edit_budget_page(
    State(state): State<EditBudgetPageState>,
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

    let categories_json = serde_json::to_string_pretty(&budget.categories)
        .map_err(|error| Error::JSONSerializationError(error.to_string()))?;

    Ok(edit_budget_view(&budget, &categories_json).into_response())
}

#[cfg(test)]
mod edit_budget_page_tests {
    use std::{
        str::FromStr,
        sync::{Arc, Mutex},
    };

    use axum::{
        Extension,
        extract::{Path, State},
        http::StatusCode,
        response::IntoResponse,
    };
    use email_address::EmailAddress;
    use rusqlite::Connection;
    use scraper::Selector;
    use time::macros::date;

    use crate::{
        PasswordHash,
        budget::core::{Budget, BudgetCategory, NewBudget, create_budget},
        db::initialize,
        endpoints,
        test_utils::{
            assert_form_input_with_value, assert_form_submit_button_with_text,
            assert_hx_endpoint, assert_status_ok, assert_valid_html, must_get_form,
            parse_html_document,
        },
        user::{UserID, create_user},
    };

    use super::{EditBudgetPageState, get_edit_budget_page};

    fn get_test_state() -> EditBudgetPageState {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        EditBudgetPageState {
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    fn create_test_user(state: &EditBudgetPageState) -> UserID {
        let connection = state.db_connection.lock().unwrap();
        create_user(
            EmailAddress::from_str("hello@world.com").unwrap(),
            PasswordHash::new_unchecked("hunter2"),
            &connection,
        )
        .unwrap()
        .id
    }

    fn create_test_budget(state: &EditBudgetPageState, user_id: UserID) -> Budget {
        let connection = state.db_connection.lock().unwrap();
        create_budget(
            NewBudget {
                user_id,
                name: "Trip".to_owned(),
                amount: 1000.0,
                start_date: date!(2024 - 01 - 01),
                end_date: date!(2024 - 01 - 31),
                categories: vec![BudgetCategory {
                    id: 0,
                    name: "Flights".to_owned(),
                    amount: 400.0,
                    subcategories: Vec::new(),
                }],
            },
            &connection,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn page_prefills_stored_values() {
        let state = get_test_state();
        let user_id = create_test_user(&state);
        let budget = create_test_budget(&state, user_id);

        let response = get_edit_budget_page(State(state), Path(budget.id), Extension(user_id))
            .await
            .unwrap();

        assert_status_ok(&response);
        let document = parse_html_document(response).await;
        assert_valid_html(&document);

        let form = must_get_form(&document);
        assert_hx_endpoint(
            &form,
            &endpoints::format_endpoint(endpoints::PUT_BUDGET, budget.id),
            "hx-put",
        );
        assert_form_input_with_value(&form, "name", "text", "Trip");
        assert_form_input_with_value(&form, "amount", "number", "1000");
        assert_form_input_with_value(&form, "start_date", "date", "2024-01-01");
        assert_form_submit_button_with_text(&form, "Save Budget");

        let textarea_selector = Selector::parse("textarea[name=categories]").unwrap();
        let textarea = form
            .select(&textarea_selector)
            .next()
            .expect("want a categories textarea");
        let textarea_text: String = textarea.text().collect();
        assert!(
            textarea_text.contains("Flights"),
            "want prefilled category tree, got {textarea_text}"
        );
    }

    #[tokio::test]
    async fn unknown_budget_returns_not_found() {
        let state = get_test_state();
        let user_id = create_test_user(&state);

        let response = get_edit_budget_page(State(state), Path(999), Extension(user_id))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
