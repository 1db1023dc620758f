//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/budgets/{budget_id}', use [format_endpoint].

/// The root route which redirects to the budgets or log in page.
pub const ROOT: &str = "/";
/// The page listing the logged in user's budgets.
pub const BUDGETS_VIEW: &str = "/budgets";
/// The page for creating a new budget.
pub const NEW_BUDGET_VIEW: &str = "/budgets/new";
/// The page showing a single budget and its category tree.
pub const BUDGET_VIEW: &str = "/budgets/{budget_id}";
/// The page for editing an existing budget.
pub const EDIT_BUDGET_VIEW: &str = "/budgets/{budget_id}/edit";
/// The route for getting the registration page.
pub const REGISTER_VIEW: &str = "/register";
/// The route for getting the log in page.
pub const LOG_IN_VIEW: &str = "/log_in";
/// The route for instructions for resetting the user's password.
pub const FORGOT_PASSWORD_VIEW: &str = "/forgot_password";
/// The page to display when an internal server error occurs.
pub const INTERNAL_ERROR_VIEW: &str = "/error";
/// The route for static files.
pub const STATIC: &str = "/static";

/// The route to request a cup of coffee (experimental).
pub const COFFEE: &str = "/api/coffee";
/// The route for logging in a user.
pub const LOG_IN_API: &str = "/api/log_in";
/// The route for the client to log out the current user.
pub const LOG_OUT: &str = "/api/log_out";
/// The route to access users.
pub const USERS: &str = "/api/users";
/// The route to create a budget.
pub const POST_BUDGET: &str = "/api/budgets";
/// The route to update a budget.
pub const PUT_BUDGET: &str = "/api/budgets/{budget_id}";
/// The route to delete a budget.
pub const DELETE_BUDGET: &str = "/api/budgets/{budget_id}";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/users/{user_id}', '{user_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let mut param_start = None;
    let mut param_end = None;

    for (i, c) in endpoint_path.chars().enumerate() {
        if c == '{' {
            param_start = Some(i);
        } else if param_start.is_some() && c == '}' {
            param_end = Some(i + 1);
            break;
        }
    }

    let param_start = match param_start {
        Some(start) => start,
        None => return endpoint_path.to_string(),
    };

    let param_end = param_end.unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
