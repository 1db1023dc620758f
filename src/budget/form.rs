//! Form data types and validation for the budget endpoints.
//!
//! Validation happens here, before any handler takes the database lock, so a
//! bad submission never touches the database.

use serde::Deserialize;
use time::Date;

use crate::{Error, user::UserID};

use super::core::{BudgetCategory, NewBudget, parse_categories, parse_date};

/// The form data for creating a budget.
#[derive(Debug, Deserialize)]
pub struct BudgetForm {
    /// The budget's display name.
    pub name: String,
    /// The overall spending ceiling in dollars.
    pub amount: f64,
    /// The first day of the budget period, e.g. "2024-01-01".
    pub start_date: String,
    /// The last day of the budget period. A blank string collapses to the
    /// start date.
    #[serde(default)]
    pub end_date: String,
    /// The category tree as a JSON document. A blank string is an empty tree.
    #[serde(default)]
    pub categories: String,
}

/// Validate `form` and turn it into a [NewBudget] owned by `user_id`.
///
/// # Errors
///
/// This function will return a:
/// - [Error::EmptyStartDate] if the start date is blank.
/// - [Error::NegativeAmount] if the overall amount is negative.
/// - [Error::InvalidDateFormat] if a date could not be parsed.
/// - [Error::InvalidCategoryTree] if the categories JSON could not be parsed.
pub fn parse_new_budget(form: BudgetForm, user_id: UserID) -> Result<NewBudget, Error> {
    if form.start_date.trim().is_empty() {
        return Err(Error::EmptyStartDate);
    }

    if form.amount < 0.0 {
        return Err(Error::NegativeAmount(form.amount));
    }

    let start_date = parse_date(&form.start_date)?;
    let end_date = parse_end_date(&form.end_date, start_date)?;
    let categories = parse_categories(&form.categories)?;

    Ok(NewBudget {
        user_id,
        name: form.name,
        amount: form.amount,
        start_date,
        end_date,
        categories,
    })
}

/// The form data for updating a budget.
///
/// Every field is optional so a client can submit only the fields it wants to
/// change. An absent field keeps the stored value.
///
/// The `end_date` and `categories` fields use a nested `Option` because a
/// field that is present but blank means something different from an absent
/// field, and serde_html_form deserializes blank values as `None`. The outer
/// `Option` is presence, the inner one blankness.
#[derive(Debug, Default, Deserialize)]
pub struct EditBudgetForm {
    /// The budget's display name.
    pub name: Option<String>,
    /// The overall spending ceiling in dollars.
    pub amount: Option<f64>,
    /// The first day of the budget period.
    pub start_date: Option<String>,
    /// The last day of the budget period. Present but blank collapses to the
    /// (possibly updated) start date, absent keeps the stored value.
    #[serde(default, deserialize_with = "presence::deserialize")]
    pub end_date: Option<Option<String>>,
    /// The category tree as a JSON document. Present replaces the whole tree,
    /// present but blank clears it, absent keeps the stored tree.
    #[serde(default, deserialize_with = "presence::deserialize")]
    pub categories: Option<Option<String>>,
}

mod presence {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Only called when the field is present, so the outer Option is
        // always Some here. An absent field falls through to the default.
        Option::<String>::deserialize(deserializer).map(Some)
    }
}

/// The validated changes from an [EditBudgetForm], ready to merge over a
/// stored budget.
#[derive(Debug, PartialEq)]
pub struct BudgetChanges {
    pub name: Option<String>,
    pub amount: Option<f64>,
    pub start_date: Option<Date>,
    /// `None` keeps the stored end date, `Some(None)` collapses it to the
    /// merged start date and `Some(Some(date))` sets it.
    pub end_date: Option<Option<Date>>,
    pub categories: Option<Vec<BudgetCategory>>,
}

/// Validate `form` and turn it into a set of [BudgetChanges].
///
/// # Errors
///
/// This function will return a:
/// - [Error::EmptyStartDate] if the start date is present but blank.
/// - [Error::NegativeAmount] if the overall amount is negative.
/// - [Error::InvalidDateFormat] if a date could not be parsed.
/// - [Error::InvalidCategoryTree] if the categories JSON could not be parsed.
pub fn parse_budget_changes(form: EditBudgetForm) -> Result<BudgetChanges, Error> {
    if let Some(amount) = form.amount
        && amount < 0.0
    {
        return Err(Error::NegativeAmount(amount));
    }

    let start_date = match form.start_date.as_deref() {
        // The start date anchors the budget period so it cannot be unset.
        Some(text) if text.trim().is_empty() => return Err(Error::EmptyStartDate),
        Some(text) => Some(parse_date(text)?),
        None => None,
    };

    let end_date = match form.end_date {
        Some(Some(text)) if text.trim().is_empty() => Some(None),
        Some(Some(text)) => Some(Some(parse_date(&text)?)),
        Some(None) => Some(None),
        None => None,
    };

    let categories = match form.categories {
        Some(Some(text)) => Some(parse_categories(&text)?),
        Some(None) => Some(Vec::new()),
        None => None,
    };

    Ok(BudgetChanges {
        name: form.name,
        amount: form.amount,
        start_date,
        end_date,
        categories,
    })
}

fn parse_end_date(text: &str, start_date: Date) -> Result<Date, Error> {
    if text.trim().is_empty() {
        // An open-ended budget collapses to a single-day period so the end
        // date column is never null.
        Ok(start_date)
    } else {
        parse_date(text)
    }
}


#[cfg(test)]
mod parse_budget_changes_tests {
    use time::macros::date;

    use crate::Error;

    use super::{EditBudgetForm, parse_budget_changes};

    #[test]
    fn absent_fields_are_kept() {
        let changes = parse_budget_changes(EditBudgetForm::default()).unwrap();

        assert_eq!(changes.name, None);
        assert_eq!(changes.amount, None);
        assert_eq!(changes.start_date, None);
        assert_eq!(changes.end_date, None);
        assert_eq!(changes.categories, None);
    }

    #[test]
    fn blank_end_date_requests_collapse() {
        let form = EditBudgetForm {
            end_date: Some(None),
            ..EditBudgetForm::default()
        };

        let changes = parse_budget_changes(form).unwrap();

        assert_eq!(changes.end_date, Some(None));
    }

    #[test]
    fn set_end_date_is_parsed() {
        let form = EditBudgetForm {
            end_date: Some(Some("2024-02-01".to_owned())),
            ..EditBudgetForm::default()
        };

        let changes = parse_budget_changes(form).unwrap();

        assert_eq!(changes.end_date, Some(Some(date!(2024 - 02 - 01))));
    }

    #[test]
    fn blank_categories_clear_the_tree() {
        let form = EditBudgetForm {
            categories: Some(None),
            ..EditBudgetForm::default()
        };

        let changes = parse_budget_changes(form).unwrap();

        assert_eq!(changes.categories, Some(Vec::new()));
    }

    #[test]
    fn rejects_blank_start_date() {
        let form = EditBudgetForm {
            start_date: Some(String::new()),
            ..EditBudgetForm::default()
        };

        assert_eq!(parse_budget_changes(form), Err(Error::EmptyStartDate));
    }

    #[test]
    fn rejects_negative_amount() {
        let form = EditBudgetForm {
            amount: Some(-5.0),
            ..EditBudgetForm::default()
        };

        assert_eq!(parse_budget_changes(form), Err(Error::NegativeAmount(-5.0)));
    }

    #[test]
    fn form_fields_are_optional_in_urlencoded_data() {
        // The PUT endpoint receives this type through axum_extra's Form
        // extractor, which uses serde_html_form semantics.
        let form: EditBudgetForm = serde_html_form::from_str("name=Trip").unwrap();

        assert_eq!(form.name, Some("Trip".to_owned()));
        assert_eq!(form.amount, None);
        assert_eq!(form.start_date, None);
        assert_eq!(form.end_date, None);
        assert_eq!(form.categories, None);
    }

    #[test]
    fn empty_amount_field_is_treated_as_absent() {
        let form: EditBudgetForm = serde_html_form::from_str("amount=").unwrap();

        assert_eq!(form.amount, None);
    }

    #[test]
    fn blank_end_date_field_is_distinguished_from_absent() {
        let form: EditBudgetForm = serde_html_form::from_str("end_date=").unwrap();

        assert_eq!(form.end_date, Some(None));
    }
}
