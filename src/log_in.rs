//! This file defines the routes for displaying the log-in page and handling log-in requests.
//! The auth module handles the lower level authentication and cookie auth logic.

use std::{
    str::FromStr,
    sync::{Arc, Mutex},
};

use axum::{
    Form,
    extract::{FromRef, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use email_address::EmailAddress;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::{
    AppState, Error,
    app_state::create_cookie_key,
    auth::{
        DEFAULT_COOKIE_DURATION, invalidate_auth_cookie, normalize_redirect_url, set_auth_cookie,
    },
    endpoints,
    html::{base, email_input, loading_spinner, log_in_register, password_input},
    timezone::get_local_offset,
    user::{User, get_user_by_email},
};

fn log_in_form(
    email: &str,
    password: &str,
    error_message: Option<&str>,
    redirect_url: Option<&str>,
) -> Markup {
    html! {
        form
            hx-post=(endpoints::LOG_IN_API)
            hx-indicator="#indicator"
            hx-disabled-elt="#email, #password, #submit-button"
            class="space-y-4 md:space-y-6"
        {
            @if let Some(redirect_url) = redirect_url {
                input type="hidden" name="redirect_url" value=(redirect_url);
            }

            (email_input(email, None))

            (password_input(password, 0, error_message))

            div class="flex items-center gap-x-3"
            {
                input
                    type="checkbox"
                    name="remember_me"
                    id="remember_me"
                    tabindex="0"
                    class="rounded-xs";

                label
                    for="remember_me"
                    class="block text-sm font-medium text-gray-900 dark:text-white"
                {
                    "Keep me logged in for one week"
                }
            }

            button
                type="submit" id="submit-button" tabindex="0"
                class="w-full px-4 py-2 bg-blue-500 dark:bg-blue-600 disabled:bg-blue-700
                    hover:enabled:bg-blue-600 hover:enabled:dark:bg-blue-700 text-white rounded"
            {
                span class="inline htmx-indicator" id="indicator"
                {
                    (loading_spinner())
                }
                "Log in"
            }

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Forgot your password? "

                a
                    href=(endpoints::FORGOT_PASSWORD_VIEW) tabindex="0"
                    class="font-semibold leading-6 text-blue-600 hover:text-blue-500 dark:text-blue-500 dark:hover:text-blue-400"
                {
                  "Reset it here"
                }
            }

            p class="text-sm font-light text-gray-500 dark:text-gray-400" {
                "Don't have an account? "
                a
                    href=(endpoints::REGISTER_VIEW) tabindex="0"
                    class="font-semibold leading-6 text-blue-600 hover:text-blue-500 dark:text-blue-500 dark:hover:text-blue-400"
                {
                  "Register here"
                }
            }
        }
    }
}

fn parse_redirect_url(raw_url: Option<&str>, source: &str) -> Option<String> {
    match raw_url.and_then(normalize_redirect_url) {
        Some(redirect_url) => Some(redirect_url),
        None => {
            if let Some(redirect_url) = raw_url {
                tracing::warn!("Invalid redirect URL from {source}: {redirect_url}");
            }
            None
        }
    }
}

/// Display the log-in page.
pub async fn get_log_in_page(Query(query): Query<RedirectQuery>) -> Response {
    let redirect_url = parse_redirect_url(query.redirect_url.as_deref(), "log-in query");
    let log_in_form = log_in_form("", "", None, redirect_url.as_deref());
    let content = log_in_register("Log in to your account", &log_in_form);
    base("Log In", &[], &content).into_response()
}

/// How long the auth cookie should last if the user selects "remember me" at log-in.
const REMEMBER_ME_COOKIE_DURATION: Duration = Duration::days(7);

/// The state needed to perform a login.
#[derive(Debug, Clone)]
pub struct LoginState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl LoginState {
    /// Create the cookie key from a string and set the default cookie duration.
    pub fn new(
        cookie_secret: &str,
        local_timezone: &str,
        db_connection: Arc<Mutex<Connection>>,
    ) -> Self {
        Self {
            cookie_key: create_cookie_key(cookie_secret),
            cookie_duration: DEFAULT_COOKIE_DURATION,
            local_timezone: local_timezone.to_owned(),
            db_connection: db_connection.clone(),
        }
    }
}

impl FromRef<AppState> for LoginState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<LoginState> for Key {
    fn from_ref(state: &LoginState) -> Self {
        state.cookie_key.clone()
    }
}

pub const INVALID_CREDENTIALS_ERROR_MSG: &str = "Incorrect email or password.";

/// Handler for log-in requests via the POST method.
///
/// On a successful log-in request, the auth cookie is set and the client is redirected to the budgets page.
/// Otherwise, the form is returned with an error message explaining the problem.
///
/// The same error message is used for an unknown email and an incorrect
/// password so that the response does not reveal which emails are registered.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn post_log_in(
    State(state): State<LoginState>,
    jar: PrivateCookieJar,
    Form(user_data): Form<LogInData>,
) -> Response {
    let redirect_url = parse_redirect_url(user_data.redirect_url.as_deref(), "log-in form");
    let redirect_url = redirect_url.as_deref();

    let email = match EmailAddress::from_str(&user_data.email) {
        Ok(email) => email,
        Err(_) => {
            return log_in_form(
                &user_data.email,
                "",
                Some(INVALID_CREDENTIALS_ERROR_MSG),
                redirect_url,
            )
            .into_response();
        }
    };

    let user: User = match get_user_by_email(
        &email,
        &state
            .db_connection
            .lock()
            .expect("Could acquire lock to database connection"),
    ) {
        Ok(user) => user,
        Err(Error::NotFound) => {
            return log_in_form(
                &user_data.email,
                "",
                Some(INVALID_CREDENTIALS_ERROR_MSG),
                redirect_url,
            )
            .into_response();
        }
        Err(error) => {
            tracing::error!("Unhandled error while verifying credentials: {error}");
            return log_in_form(
                &user_data.email,
                "",
                Some("An internal error occurred. Please try again later."),
                redirect_url,
            )
            .into_response();
        }
    };

    let is_password_valid = match user.password_hash.verify(&user_data.password) {
        Ok(is_password_valid) => is_password_valid,
        Err(error) => {
            tracing::error!("Unhandled error while verifying credentials: {error}");
            return log_in_form(
                &user_data.email,
                "",
                Some("An internal error occurred. Please try again later."),
                redirect_url,
            )
            .into_response();
        }
    };

    if !is_password_valid {
        return log_in_form(
            &user_data.email,
            "",
            Some(INVALID_CREDENTIALS_ERROR_MSG),
            redirect_url,
        )
        .into_response();
    }

    let cookie_duration = if user_data.remember_me.is_some() {
        REMEMBER_ME_COOKIE_DURATION
    } else {
        state.cookie_duration
    };

    let local_timezone = match get_local_offset(&state.local_timezone) {
        Some(offset) => offset,
        None => return Error::InvalidTimezoneError(state.local_timezone).into_response(),
    };

    let redirect_url = redirect_url.unwrap_or(endpoints::BUDGETS_VIEW);

    set_auth_cookie(jar.clone(), user.id, cookie_duration, local_timezone)
        .map(|updated_jar| {
            (
                StatusCode::SEE_OTHER,
                HxRedirect(redirect_url.to_owned()),
                updated_jar,
            )
        })
        .map_err(|err| {
            tracing::error!("Error setting auth cookie: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                HxRedirect(endpoints::INTERNAL_ERROR_VIEW.to_owned()),
                invalidate_auth_cookie(jar),
            )
        })
        .into_response()
}

#[derive(Deserialize)]
pub struct RedirectQuery {
    pub redirect_url: Option<String>,
}

/// The raw data entered by the user in the log-in form.
///
/// The password is stored as a plain string. There is no need for validation here since
/// it will be compared against the password in the database, which has been verified.
#[derive(Clone, Serialize, Deserialize)]
pub struct LogInData {
    /// Email entered during log-in.
    pub email: String,

    /// Password entered during log-in.
    pub password: String,

    /// Whether to extend the initial auth cookie duration.
    ///
    /// This value comes from a checkbox, so it either has a string value or is not set
    /// (see the [MDN docs](https://developer.mozilla.org/en-US/docs/Web/HTML/Element/input/checkbox#value_2)).
    /// The `Some` variant should be interpreted as `true` irregardless of the
    /// string value, and the `None` variant should be interpreted as `false`.
    pub remember_me: Option<String>,

    /// Optional URL to redirect to after logging in.
    /// Only accepted from the log-in form submission.
    pub redirect_url: Option<String>,
}

#[cfg(test)]
mod log_in_page_tests {
    use std::{collections::HashMap, iter::zip};

    use axum::{
        extract::Query,
        http::{StatusCode, header::CONTENT_TYPE},
    };

    use crate::{
        endpoints,
        test_utils::{assert_valid_html, parse_html_document},
    };

    use super::{RedirectQuery, get_log_in_page};

    #[tokio::test]
    async fn log_in_page_displays_form() {
        let response = get_log_in_page(Query(RedirectQuery { redirect_url: None })).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(
            response
                .headers()
                .get(CONTENT_TYPE)
                .unwrap()
                .to_str()
                .unwrap()
                .starts_with("text/html")
        );

        let document = parse_html_document(response).await;
        assert_valid_html(&document);

        let form_selector = scraper::Selector::parse("form").unwrap();
        let forms = document.select(&form_selector).collect::<Vec<_>>();
        assert_eq!(forms.len(), 1, "want 1 form, got {}", forms.len());
        let form = forms.first().unwrap();
        let hx_post = form.value().attr("hx-post");
        assert_eq!(
            hx_post,
            Some(endpoints::LOG_IN_API),
            "want form with attribute hx-post=\"{}\", got {:?}",
            endpoints::LOG_IN_API,
            hx_post
        );

        let mut expected_form_elements: HashMap<&str, Vec<&str>> = HashMap::new();
        expected_form_elements.insert("input", vec!["email", "password"]);
        expected_form_elements.insert("button", vec!["submit"]);

        for (tag, element_types) in expected_form_elements {
            for element_type in element_types {
                let selector_string = format!("{tag}[type={element_type}]");
                let input_selector = scraper::Selector::parse(&selector_string).unwrap();
                let inputs = form.select(&input_selector).collect::<Vec<_>>();
                assert_eq!(
                    inputs.len(),
                    1,
                    "want 1 {element_type} {tag}, got {}",
                    inputs.len()
                );
            }
        }

        let register_link_selector = scraper::Selector::parse("a[href]").unwrap();
        let links = form.select(&register_link_selector).collect::<Vec<_>>();
        assert_eq!(links.len(), 2, "want 2 link, got {}", links.len());
        let want_endpoints = [endpoints::FORGOT_PASSWORD_VIEW, endpoints::REGISTER_VIEW];

        for (link, endpoint) in zip(links, want_endpoints) {
            assert_eq!(
                link.value().attr("href"),
                Some(endpoint),
                "want link to {}, got {:?}",
                endpoint,
                link.value().attr("href")
            );
        }
    }

    #[tokio::test]
    async fn log_in_page_preserves_redirect_url() {
        let redirect_url = "/budgets/1/edit?foo=bar".to_string();
        let response = get_log_in_page(Query(RedirectQuery {
            redirect_url: Some(redirect_url.clone()),
        }))
        .await;

        let document = parse_html_document(response).await;
        assert_valid_html(&document);

        let input_selector = scraper::Selector::parse("input[name=redirect_url]").unwrap();
        let inputs = document.select(&input_selector).collect::<Vec<_>>();
        assert_eq!(
            inputs.len(),
            1,
            "want 1 redirect_url input, got {}",
            inputs.len()
        );
        let input = inputs.first().unwrap();
        assert_eq!(
            input.value().attr("value"),
            Some(redirect_url.as_str()),
            "expected redirect_url value to be preserved"
        );
    }
}
