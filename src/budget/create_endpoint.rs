//! Defines the endpoint for creating a new budget.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
// Must use axum_extra's Form since that parses an empty string as None instead
// of crashing like axum::Form.
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use rusqlite::Connection;

use crate::{AppState, Error, endpoints, user::UserID};

use super::{
    core::create_budget,
    form::{BudgetForm, parse_new_budget},
};

/// The state needed to create a budget.
#[derive(Debug, Clone)]
pub struct CreateBudgetState {
    /// The database connection for managing budgets.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateBudgetState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for creating a new budget, redirects to the budgets view
/// on success.
///
/// The form is validated before the database lock is taken, so an invalid
/// submission never writes anything.
pub async fn create_budget_endpoint(
    State(state): State<CreateBudgetState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<BudgetForm>,
) -> Response {
    let new_budget = match parse_new_budget(form, user_id) {
        Ok(new_budget) => new_budget,
        Err(error) => {
            tracing::warn!("rejected budget submission: {error}");
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

    if let Err(error) = create_budget(new_budget, &connection) {
        tracing::error!("could not create budget: {error}");

        return error.into_alert_response();
    }

    (
        HxRedirect(endpoints::BUDGETS_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}
