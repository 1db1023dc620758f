//! Defines the route handler for the page for creating a new budget.

use axum::response::{IntoResponse, Response};
use maud::{Markup, html};

use crate::{
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base,
        dollar_input_styles, loading_spinner,
    },
    navigation::NavBar,
};

fn create_budget_view() -> Markup {
    let nav_bar = NavBar::new(endpoints::NEW_BUDGET_VIEW).into_html();
    let spinner = loading_spinner();

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            form
                hx-post=(endpoints::POST_BUDGET)
                hx-target-error="#alert-container"
                class="w-full space-y-4 md:space-y-6"
            {
                h2 class="text-xl font-bold" { "New Budget" }

                div
                {
                    label for="name" class=(FORM_LABEL_STYLE) { "Name" }

                    input
                        name="name"
                        id="name"
                        type="text"
                        placeholder="e.g. Groceries 2024"
                        required
                        autofocus
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                div
                {
                    label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }

                    // w-full needed to ensure input takes the full width when prefilled with a value
                    div class="input-wrapper w-full"
                    {
                        input
                            name="amount"
                            id="amount"
                            type="number"
                            step="0.01"
                            min="0"
                            placeholder="0.00"
                            required
                            class=(FORM_TEXT_INPUT_STYLE);
                    }
                }

                div
                {
                    label for="start_date" class=(FORM_LABEL_STYLE) { "Start Date" }

                    input
                        name="start_date"
                        id="start_date"
                        type="date"
                        required
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                div
                {
                    label for="end_date" class=(FORM_LABEL_STYLE) { "End Date" }

                    input
                        name="end_date"
                        id="end_date"
                        type="date"
                        class=(FORM_TEXT_INPUT_STYLE);

                    p class="mt-1 text-xs text-gray-500 dark:text-gray-400"
                    {
                        "Leave blank for a single-day budget starting and ending on the start date."
                    }
                }

                div
                {
                    label for="categories" class=(FORM_LABEL_STYLE) { "Categories" }

                    textarea
                        name="categories"
                        id="categories"
                        rows="8"
                        placeholder=r#"[{"name": "Flights", "amount": 400}]"#
                        class=(FORM_TEXT_INPUT_STYLE)
                    {}

                    p class="mt-1 text-xs text-gray-500 dark:text-gray-400"
                    {
                        "A JSON list of categories. Each category may have subcategories, in \
                        which case its own amount is ignored."
                    }
                }

                button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
                {
                    span
                        id="indicator"
                        class="inline htmx-indicator"
                    {
                        (spinner)
                    }
                    " Create Budget"
                }
            }
        }
    };

    base("Create Budget", &[dollar_input_styles()], &content)
}

/// Renders the page for creating a budget.
pub async fn get_create_budget_page() -> Response {
    create_budget_view().into_response()
}
