//! Defines the endpoint for updating an existing budget.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
// Must use axum_extra's Form since that parses an empty string as None instead
// of crashing like axum::Form.
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use rusqlite::Connection;

use crate::{AppState, Error, database_id::DatabaseID, endpoints, user::UserID};

use super::{
    core::{Budget, get_budget, update_budget},
    form::{BudgetChanges, EditBudgetForm, parse_budget_changes},
};

/// The state needed to update a budget.
#[derive(Debug, Clone)]
pub struct EditBudgetState {
    /// The database connection for managing budgets.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditBudgetState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for updating a budget, redirects to the budgets view on
/// success.
///
/// Absent form fields keep their stored values and the stored row is replaced
/// in one write, so concurrent updates follow last-write-wins semantics.
pub async fn update_budget_endpoint(
    State(state): State<EditBudgetState>,
    Path(budget_id): Path<DatabaseID>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<EditBudgetForm>,
) -> Response {
    // Validate before taking the database lock.
    let changes = match parse_budget_changes(form) {
        Ok(changes) => changes,
        Err(error) => {
            tracing::warn!("rejected budget update: {error}");
            return error.into_alert_response();
        }
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let stored = match get_budget(budget_id, user_id, &connection) {
        Ok(budget) => budget,
        Err(Error::NotFound) => return Error::UpdateMissingBudget.into_alert_response(),
        Err(error) => {
            tracing::error!("could not read budget {budget_id}: {error}");
            return error.into_alert_response();
        }
    };

    let merged = merge_changes(stored, changes);

    if let Err(error) = update_budget(&merged, &connection) {
        tracing::error!("could not update budget {budget_id}: {error}");

        return error.into_alert_response();
    }

    (
        HxRedirect(endpoints::BUDGETS_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}

/// Apply `changes` over `stored`, collapsing a cleared end date to the merged
/// start date.
fn merge_changes(stored: Budget, changes: BudgetChanges) -> Budget {
    let start_date = changes.start_date.unwrap_or(stored.start_date);
    let end_date = match changes.end_date {
        Some(Some(end_date)) => end_date,
        Some(None) => start_date,
        None => stored.end_date,
    };

    Budget {
        id: stored.id,
        user_id: stored.user_id,
        name: changes.name.unwrap_or(stored.name),
        amount: changes.amount.unwrap_or(stored.amount),
        start_date,
        end_date,
        categories: changes.categories.unwrap_or(stored.categories),
    }
}
