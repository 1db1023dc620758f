//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router,
    http::StatusCode,
    middleware,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post, put},
};
use tower_http::services::ServeDir;

use crate::{
    AppState,
    auth::{auth_guard, auth_guard_hx},
    budget::{
        create_budget_endpoint, delete_budget_endpoint, get_budget_page, get_budgets_page,
        get_create_budget_page, get_edit_budget_page, update_budget_endpoint,
    },
    endpoints,
    forgot_password::get_forgot_password_page,
    internal_server_error::get_internal_server_error_page,
    log_in::{get_log_in_page, post_log_in},
    log_out::get_log_out,
    not_found::get_404_not_found,
    register_user::{get_register_page, register_user},
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::COFFEE, get(get_coffee))
        .route(endpoints::LOG_IN_VIEW, get(get_log_in_page))
        .route(endpoints::LOG_IN_API, post(post_log_in))
        .route(endpoints::LOG_OUT, get(get_log_out))
        .route(endpoints::REGISTER_VIEW, get(get_register_page))
        .route(
            endpoints::FORGOT_PASSWORD_VIEW,
            get(get_forgot_password_page),
        )
        .route(endpoints::USERS, post(register_user))
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        );

    let protected_routes = Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::BUDGETS_VIEW, get(get_budgets_page))
        .route(endpoints::NEW_BUDGET_VIEW, get(get_create_budget_page))
        .route(endpoints::BUDGET_VIEW, get(get_budget_page))
        .route(endpoints::EDIT_BUDGET_VIEW, get(get_edit_budget_page))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    // These POST/PUT/DELETE routes need to use the HX-REDIRECT header for auth
    // redirects to work properly for HTMX requests.
    let protected_routes = protected_routes.merge(
        Router::new()
            .route(endpoints::POST_BUDGET, post(create_budget_endpoint))
            .route(
                endpoints::PUT_BUDGET,
                put(update_budget_endpoint).delete(delete_budget_endpoint),
            )
            .layer(middleware::from_fn_with_state(state.clone(), auth_guard_hx)),
    );

    protected_routes
        .merge(unprotected_routes)
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .with_state(state)
}

/// Attempt to get a cup of coffee from the server.
async fn get_coffee() -> Response {
    (StatusCode::IM_A_TEAPOT, Html("I'm a teapot")).into_response()
}

/// The root path '/' redirects to the budgets page.
async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::BUDGETS_VIEW)
}
