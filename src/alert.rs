//! Pop-up alerts that notify the user of the outcome of an action without
//! navigating away from the current page.
//!
//! Alerts are rendered as out-of-band swaps into the `#alert-container`
//! element that [crate::html::base] adds to every page.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};

/// A notification shown at the bottom of the screen.
#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    /// Tells the user an action succeeded.
    SuccessSimple {
        /// A short, descriptive message, e.g. "Budget deleted".
        message: String,
    },
    /// Tells the user an action failed and why.
    Error {
        /// A short, descriptive message, e.g. "Could not delete budget".
        message: String,
        /// What went wrong and what the user can do about it.
        details: String,
    },
}

impl Alert {
    /// Convenience constructor for [Alert::Error].
    pub fn error(message: &str, details: &str) -> Self {
        Self::Error {
            message: message.to_owned(),
            details: details.to_owned(),
        }
    }

    fn into_markup(self) -> Markup {
        let (message, details, color_style) = match self {
            Alert::SuccessSimple { message } => (
                message,
                None,
                "text-green-800 bg-green-50 dark:bg-gray-800 dark:text-green-400",
            ),
            Alert::Error { message, details } => (
                message,
                Some(details),
                "text-red-800 bg-red-50 dark:bg-gray-800 dark:text-red-400",
            ),
        };

        html!(
            div hx-swap-oob="innerHTML:#alert-container"
            {
                div
                    class={ "flex items-start gap-3 p-4 mb-4 rounded-lg shadow " (color_style) }
                    role="alert"
                {
                    div class="flex-1"
                    {
                        p class="font-medium" { (message) }

                        @if let Some(details) = details
                        {
                            p class="text-sm" { (details) }
                        }
                    }

                    button
                        type="button"
                        class="shrink-0 font-bold cursor-pointer"
                        aria-label="Dismiss"
                        onclick="dismissAlert(this)"
                    {
                        "✕"
                    }
                }
            }
        )
    }
}

impl IntoResponse for Alert {
    fn into_response(self) -> Response {
        self.into_markup().into_response()
    }
}

/// Render `alert` as an HTML fragment response with the given `status_code`.
///
/// The fragment swaps itself into `#alert-container`, so the caller's
/// hx-target is left untouched on error responses.
pub fn render_alert(status_code: StatusCode, alert: Alert) -> Response {
    (status_code, alert).into_response()
}

#[cfg(test)]
mod alert_tests {
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use scraper::Selector;

    use crate::test_utils::parse_html_fragment;

    use super::{Alert, render_alert};

    #[tokio::test]
    async fn error_alert_contains_message_and_details() {
        let response = Alert::error("Could not delete budget", "Something went wrong.")
            .into_response();

        let html = parse_html_fragment(response).await;

        let paragraph_selector = Selector::parse("p").unwrap();
        let text: Vec<String> = html
            .select(&paragraph_selector)
            .map(|p| p.text().collect())
            .collect();

        assert!(text.contains(&"Could not delete budget".to_owned()));
        assert!(text.contains(&"Something went wrong.".to_owned()));
    }

    #[tokio::test]
    async fn alert_targets_alert_container() {
        let response = Alert::SuccessSimple {
            message: "Budget deleted".to_owned(),
        }
        .into_response();

        let html = parse_html_fragment(response).await;

        let oob_selector = Selector::parse("div[hx-swap-oob]").unwrap();
        let oob_div = html
            .select(&oob_selector)
            .next()
            .expect("Alert should contain an out-of-band swap element");

        assert_eq!(
            oob_div.attr("hx-swap-oob"),
            Some("innerHTML:#alert-container")
        );
    }

    #[test]
    fn render_alert_sets_status_code() {
        let response = render_alert(
            StatusCode::BAD_REQUEST,
            Alert::error("Invalid start date", "The start date is required."),
        );

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn alert_response_is_html() {
        let response = Alert::SuccessSimple {
            message: "Budget deleted".to_owned(),
        }
        .into_response();

        let content_type = response
            .headers()
            .get("content-type")
            .expect("Response should have a content type");

        assert!(content_type.to_str().unwrap().starts_with("text/html"));
    }
}
