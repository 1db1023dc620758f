//! The page that tells the user how to reset their password.
//!
//! Passwords are reset with the `reset_password` command line tool on the
//! server, so this page only displays instructions.

use axum::response::{IntoResponse, Response};
use maud::html;

use crate::{
    endpoints,
    html::{base, link, log_in_register},
};

/// Display instructions for resetting a forgotten password.
pub async fn get_forgot_password_page() -> Response {
    let instructions = html! {
        div class="space-y-4 text-sm font-light text-gray-500 dark:text-gray-400"
        {
            p
            {
                "Since this app is self-hosted, passwords are reset from the \
                command line on the server that hosts the app."
            }

            p
            {
                "Run the command below on the server and follow the prompts:"
            }

            pre class="p-2.5 rounded bg-gray-100 dark:bg-gray-700 text-gray-900 dark:text-white overflow-x-auto"
            {
                code { "reset_password --db-path <path to database> --email <your email>" }
            }

            p
            {
                "Once your password has been reset, you can "
                (link(endpoints::LOG_IN_VIEW, "log in here"))
                "."
            }
        }
    };

    let content = log_in_register("Reset your password", &instructions);
    base("Forgot Password", &[], &content).into_response()
}

#[cfg(test)]
mod forgot_password_tests {
    use axum::http::StatusCode;

    use crate::{
        endpoints,
        test_utils::{assert_valid_html, parse_html_document},
    };

    use super::get_forgot_password_page;

    #[tokio::test]
    async fn page_shows_reset_command_and_log_in_link() {
        let response = get_forgot_password_page().await;

        assert_eq!(response.status(), StatusCode::OK);

        let document = parse_html_document(response).await;
        assert_valid_html(&document);

        let code_selector = scraper::Selector::parse("code").unwrap();
        let code = document
            .select(&code_selector)
            .next()
            .expect("expected a code block with the reset command");
        assert!(code.text().collect::<String>().contains("reset_password"));

        let link_selector = scraper::Selector::parse("a[href]").unwrap();
        let has_log_in_link = document
            .select(&link_selector)
            .any(|link| link.value().attr("href") == Some(endpoints::LOG_IN_VIEW));
        assert!(has_log_in_link, "expected a link to the log in page");
    }
}
