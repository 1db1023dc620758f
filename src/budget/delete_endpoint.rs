//! Defines the endpoint for deleting a budget.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    alert::{Alert, render_alert},
    database_id::DatabaseID,
    user::UserID,
};

use super::core::delete_budget;

/// The state needed to delete a budget.
#[derive(Debug, Clone)]
pub struct DeleteBudgetState {
    /// The database connection for managing budgets.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteBudgetState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for deleting a budget, responds with an alert.
///
/// Deleting a budget that is already gone is treated as success, so repeated
/// delete requests (e.g. a double-clicked button) behave the same as one.
pub async fn delete_budget_endpoint(
    State(state): State<DeleteBudgetState>,
    Path(budget_id): Path<DatabaseID>,
    Extension(user_id): Extension<UserID>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_budget(budget_id, user_id, &connection) {
        // The status code has to be 200 OK or HTMX will not remove the table row.
        Ok(_) => render_alert(
            StatusCode::OK,
            Alert::SuccessSimple {
                message: "Budget deleted.".to_owned(),
            },
        ),
        Err(error) => {
            tracing::error!("could not delete budget {budget_id}: {error}");
            error.into_alert_response()
        }
    }
}
