//! Budgetree is a web app for planning budgets with nested category trees.
//!
//! This library provides a REST API that directly serves HTML pages.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use tokio::signal;

mod alert;
mod app_state;
mod auth;
mod budget;
mod database_id;
mod db;
mod endpoints;
mod forgot_password;
mod html;
mod internal_server_error;
mod log_in;
mod log_out;
mod logging;
mod navigation;
mod not_found;
mod password;
mod register_user;
mod routing;
#[cfg(test)]
mod test_utils;
mod timezone;
mod user;

pub use app_state::AppState;
pub use budget::{Budget, BudgetCategory, NewBudget, create_budget, total_allocated};
pub use db::initialize as initialize_db;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use password::{PasswordHash, ValidatedPassword};
pub use routing::build_router;
pub use user::{User, UserID, create_user, get_user_by_email, get_user_by_id};

use crate::{
    alert::{Alert, render_alert},
    internal_server_error::InternalServerError,
    not_found::get_404_not_found_response,
};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The user provided an invalid combination of email and password.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// The auth token cookie is missing from the cookie jar in the request.
    #[error("no cookies in the cookie jar :(")]
    CookieMissing,

    /// The auth token in the request cookie has passed its expiry time.
    #[error("the auth token has expired")]
    ExpiredAuthToken,

    /// There was an error parsing the date in the cookie or creating the new
    /// expiry date time.
    ///
    /// Callers should pass in the original error as a string and the date
    /// string that caused the error.
    #[error("could not parse date-time string \"{1}\": {0}")]
    InvalidDateFormat(String, String),

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The email address used to register is already taken by another user.
    #[error("the email address is already registered")]
    DuplicateEmail,

    /// An empty string was used for a budget's start date.
    ///
    /// The start date anchors the budget's period, so it must always be set.
    #[error("the budget start date cannot be empty")]
    EmptyStartDate,

    /// A negative number was used for a budget's overall amount.
    #[error("the budget amount cannot be negative, got {0}")]
    NegativeAmount(f64),

    /// The submitted category tree could not be parsed.
    #[error("could not parse the category tree: {0}")]
    InvalidCategoryTree(String),

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// An error occurred while serializing a struct as JSON
    #[error("could not serialize as JSON: {0}")]
    JSONSerializationError(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// Tried to update a budget that does not exist
    #[error("tried to update a budget that is not in the database")]
    UpdateMissingBudget,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("user.email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => get_404_not_found_response(),
            Error::InvalidTimezoneError(timezone) => InternalServerError {
                description: "Invalid Timezone Settings",
                fix: &format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                ),
            }
            .into_response(),
            Error::DatabaseLockError => InternalServerError::default().into_response(),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                InternalServerError::default().into_response()
            }
        }
    }
}

impl Error {
    fn into_alert_response(self) -> Response {
        match self {
            Error::InvalidTimezoneError(timezone) => render_alert(
                StatusCode::INTERNAL_SERVER_ERROR,
                Alert::error(
                    "Invalid Timezone Settings",
                    &format!(
                        "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                    ),
                ),
            ),
            Error::EmptyStartDate => render_alert(
                StatusCode::BAD_REQUEST,
                Alert::error(
                    "Invalid start date",
                    "The budget start date is required. Pick a start date and try again.",
                ),
            ),
            Error::NegativeAmount(amount) => render_alert(
                StatusCode::BAD_REQUEST,
                Alert::error(
                    "Invalid budget amount",
                    &format!("The budget amount must be zero or more, got {amount}."),
                ),
            ),
            Error::InvalidDateFormat(error, date_string) => render_alert(
                StatusCode::BAD_REQUEST,
                Alert::error(
                    "Invalid date",
                    &format!("Could not parse the date \"{date_string}\": {error}"),
                ),
            ),
            Error::InvalidCategoryTree(details) => render_alert(
                StatusCode::BAD_REQUEST,
                Alert::error(
                    "Invalid categories",
                    &format!("The categories could not be read: {details}"),
                ),
            ),
            Error::UpdateMissingBudget => render_alert(
                StatusCode::NOT_FOUND,
                Alert::error(
                    "Could not update budget",
                    "The budget could not be found. \
                    Try refreshing the page to see if the budget has been deleted.",
                ),
            ),
            _ => render_alert(
                StatusCode::INTERNAL_SERVER_ERROR,
                Alert::error(
                    "Something went wrong",
                    "An unexpected error occurred, check the server logs for more details.",
                ),
            ),
        }
    }
}
