//! Defines the templates and route handlers for the page to display for an internal server error.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};

use crate::{endpoints, html::error_view};

pub struct InternalServerError<'a> {
    pub description: &'a str,
    pub fix: &'a str,
}

impl Default for InternalServerError<'_> {
    fn default() -> Self {
        Self {
            description: "Sorry, something went wrong.",
            fix: "Try again later or check the server logs",
        }
    }
}

impl IntoResponse for InternalServerError<'_> {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            error_view("Internal Server Error", "500", self.description, self.fix),
        )
            .into_response()
    }
}

pub async fn get_internal_server_error_page() -> Response {
    InternalServerError::default().into_response()
}

/// A redirect to the internal server error page, for handlers that cannot
/// render an error in place.
pub fn get_internal_server_error_redirect() -> Response {
    Redirect::to(endpoints::INTERNAL_ERROR_VIEW).into_response()
}
