//! The budget domain model: the budget document, its recursive category tree,
//! the allocation aggregation and the database CRUD functions.
//!
//! A budget's category tree is stored as a single JSON document in the
//! `categories` column, so the whole tree is replaced atomically on update.

use rusqlite::{Connection, Row, params};
use serde::{Deserialize, Serialize};
use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

use crate::{Error, database_id::DatabaseID, user::UserID};

mod lenient_amount {
    //! Deserializes a category amount, treating missing, null or non-numeric
    //! values as zero instead of rejecting the whole tree.

    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawAmount {
        Number(f64),
        Text(String),
        Other(serde::de::IgnoredAny),
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<RawAmount>::deserialize(deserializer)?;

        Ok(match raw {
            Some(RawAmount::Number(number)) => number,
            Some(RawAmount::Text(text)) => text.trim().parse().unwrap_or(0.0),
            _ => 0.0,
        })
    }
}

/// A node in a budget's category tree.
///
/// A category either carries its own allocation (a leaf) or derives it from
/// its subcategories, in which case its own `amount` is ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetCategory {
    /// An identifier that is unique within the owning budget.
    #[serde(default)]
    pub id: i64,

    /// The category's display name.
    pub name: String,

    /// The allocation in dollars. Only meaningful for leaf categories.
    #[serde(default, deserialize_with = "lenient_amount::deserialize")]
    pub amount: f64,

    /// The child categories, in display order.
    #[serde(default)]
    pub subcategories: Vec<BudgetCategory>,
}

/// A budget with its full category tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    /// The budget's ID in the application database.
    pub id: DatabaseID,
    /// The user that owns this budget. All queries are scoped to this user.
    pub user_id: UserID,
    /// The budget's display name.
    pub name: String,
    /// The overall spending ceiling in dollars.
    pub amount: f64,
    /// The first day of the budget period.
    pub start_date: Date,
    /// The last day of the budget period. Never before `start_date` in
    /// practice since a blank end date collapses to the start date.
    pub end_date: Date,
    /// The category tree roots, in display order.
    pub categories: Vec<BudgetCategory>,
}

/// The data required to create a new budget.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBudget {
    /// The user that will own the budget.
    pub user_id: UserID,
    /// The budget's display name.
    pub name: String,
    /// The overall spending ceiling in dollars.
    pub amount: f64,
    /// The first day of the budget period.
    pub start_date: Date,
    /// The last day of the budget period.
    pub end_date: Date,
    /// The category tree roots, in display order.
    pub categories: Vec<BudgetCategory>,
}

/// Compute the total amount allocated by `categories`.
///
/// Each category contributes its *effective* allocation: its own `amount` if
/// it has no subcategories, otherwise the sum of its subcategories' effective
/// allocations with the category's own `amount` ignored.
///
/// This is a pure function so the same computation backs both the list/detail
/// pages and the remaining-budget display.
pub fn total_allocated(categories: &[BudgetCategory]) -> f64 {
    categories.iter().map(effective_allocation).sum()
}

/// The effective allocation of a single category, per the leaf-vs-parent rule.
pub(crate) fn effective_allocation(category: &BudgetCategory) -> f64 {
    if category.subcategories.is_empty() {
        category.amount
    } else {
        total_allocated(&category.subcategories)
    }
}

const DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

/// Parse a date string from a form input, e.g. "2024-01-01".
///
/// # Errors
///
/// Returns an [Error::InvalidDateFormat] if `text` is not a valid date.
pub(crate) fn parse_date(text: &str) -> Result<Date, Error> {
    Date::parse(text, DATE_FORMAT)
        .map_err(|error| Error::InvalidDateFormat(error.to_string(), text.to_owned()))
}

/// Parse a category tree submitted as a JSON document.
///
/// A blank string is treated as an empty tree.
///
/// # Errors
///
/// Returns an [Error::InvalidCategoryTree] if `text` cannot be parsed.
pub(crate) fn parse_categories(text: &str) -> Result<Vec<BudgetCategory>, Error> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    serde_json::from_str(text).map_err(|error| Error::InvalidCategoryTree(error.to_string()))
}

/// Create the budget table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_budget_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS budget (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL REFERENCES user(id),
                name TEXT NOT NULL,
                amount REAL NOT NULL,
                start_date TEXT NOT NULL,
                end_date TEXT NOT NULL,
                categories TEXT
                )",
        (),
    )?;

    Ok(())
}

/// Whether `error` is SQLite telling us that `column` does not exist.
///
/// Databases created by older versions of the app may not have the
/// `categories` column, so queries referencing it are retried once with the
/// column omitted instead of failing outright.
fn is_unknown_column_error(error: &rusqlite::Error, column: &str) -> bool {
    match error {
        rusqlite::Error::SqliteFailure(_, Some(message)) => {
            (message.contains("no such column") || message.contains("has no column named"))
                && message.contains(column)
        }
        _ => false,
    }
}

/// Create and insert a new budget into the database.
///
/// If the budget table has no `categories` column, the insert is retried once
/// without the category tree.
///
/// # Errors
///
/// This function will return a:
/// - [Error::JSONSerializationError] if the category tree cannot be serialized.
/// - [Error::SqlError] if an SQL related error occurred.
pub fn create_budget(budget: NewBudget, connection: &Connection) -> Result<Budget, Error> {
    let categories_json = serde_json::to_string(&budget.categories)
        .map_err(|error| Error::JSONSerializationError(error.to_string()))?;

    let insert_result = connection.execute(
        "INSERT INTO budget (user_id, name, amount, start_date, end_date, categories)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            budget.user_id.as_i64(),
            budget.name,
            budget.amount,
            budget.start_date,
            budget.end_date,
            categories_json,
        ],
    );

    let mut stored_categories = budget.categories;

    match insert_result {
        Ok(_) => {}
        Err(error) if is_unknown_column_error(&error, "categories") => {
            tracing::warn!(
                "The budget table has no categories column, inserting without the category \
                tree: {error}"
            );

            connection.execute(
                "INSERT INTO budget (user_id, name, amount, start_date, end_date)
                    VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    budget.user_id.as_i64(),
                    budget.name,
                    budget.amount,
                    budget.start_date,
                    budget.end_date,
                ],
            )?;

            stored_categories = Vec::new();
        }
        Err(error) => return Err(error.into()),
    }

    let id = connection.last_insert_rowid();

    Ok(Budget {
        id,
        user_id: budget.user_id,
        name: budget.name,
        amount: budget.amount,
        start_date: budget.start_date,
        end_date: budget.end_date,
        categories: stored_categories,
    })
}

/// Get the budget with the ID `budget_id` owned by `user_id`.
///
/// Another user's budget is reported as [Error::NotFound], the same as a
/// budget that does not exist.
///
/// # Errors
///
/// This function will return a:
/// - [Error::NotFound] if `budget_id` does not belong to a budget owned by `user_id`.
/// - [Error::SqlError] if an SQL related error occurred.
pub fn get_budget(
    budget_id: DatabaseID,
    user_id: UserID,
    connection: &Connection,
) -> Result<Budget, Error> {
    let select_result = connection
        .prepare(
            "SELECT id, user_id, name, amount, start_date, end_date, categories
                FROM budget WHERE id = :id AND user_id = :user_id",
        )
        .and_then(|mut statement| {
            statement.query_row(
                &[(":id", &budget_id), (":user_id", &user_id.as_i64())],
                map_row_to_budget,
            )
        });

    match select_result {
        Ok(budget) => Ok(budget),
        Err(error) if is_unknown_column_error(&error, "categories") => {
            tracing::warn!(
                "The budget table has no categories column, selecting without it: {error}"
            );

            connection
                .prepare(
                    "SELECT id, user_id, name, amount, start_date, end_date
                        FROM budget WHERE id = :id AND user_id = :user_id",
                )?
                .query_row(
                    &[(":id", &budget_id), (":user_id", &user_id.as_i64())],
                    map_row_to_budget_without_categories,
                )
                .map_err(|error| error.into())
        }
        Err(error) => Err(error.into()),
    }
}

/// Get all budgets owned by `user_id`, most recent start date first.
///
/// Budgets that share a start date are ordered by descending ID so the most
/// recently created comes first. An owner with no budgets gets an empty list,
/// not an error.
///
/// # Errors
///
/// This function will return an [Error::SqlError] if an SQL related error occurred.
pub fn list_budgets(user_id: UserID, connection: &Connection) -> Result<Vec<Budget>, Error> {
    let select_result = connection
        .prepare(
            "SELECT id, user_id, name, amount, start_date, end_date, categories
                FROM budget WHERE user_id = :user_id
                ORDER BY start_date DESC, id DESC",
        )
        .and_then(|mut statement| {
            statement
                .query_map(&[(":user_id", &user_id.as_i64())], map_row_to_budget)?
                .collect::<Result<Vec<Budget>, rusqlite::Error>>()
        });

    match select_result {
        Ok(budgets) => Ok(budgets),
        Err(error) if is_unknown_column_error(&error, "categories") => {
            tracing::warn!(
                "The budget table has no categories column, selecting without it: {error}"
            );

            connection
                .prepare(
                    "SELECT id, user_id, name, amount, start_date, end_date
                        FROM budget WHERE user_id = :user_id
                        ORDER BY start_date DESC, id DESC",
                )?
                .query_map(
                    &[(":user_id", &user_id.as_i64())],
                    map_row_to_budget_without_categories,
                )?
                .collect::<Result<Vec<Budget>, rusqlite::Error>>()
                .map_err(|error| error.into())
        }
        Err(error) => Err(error.into()),
    }
}

/// Write `budget` over the stored budget with the same ID and owner.
///
/// The whole row is replaced, including the full category tree. Concurrent
/// updates to the same budget follow last-write-wins semantics.
///
/// # Errors
///
/// This function will return a:
/// - [Error::UpdateMissingBudget] if no budget matches `budget.id` and `budget.user_id`.
/// - [Error::JSONSerializationError] if the category tree cannot be serialized.
/// - [Error::SqlError] if an SQL related error occurred.
pub fn update_budget(budget: &Budget, connection: &Connection) -> Result<(), Error> {
    let categories_json = serde_json::to_string(&budget.categories)
        .map_err(|error| Error::JSONSerializationError(error.to_string()))?;

    let update_result = connection.execute(
        "UPDATE budget
            SET name = ?1, amount = ?2, start_date = ?3, end_date = ?4, categories = ?5
            WHERE id = ?6 AND user_id = ?7",
        params![
            budget.name,
            budget.amount,
            budget.start_date,
            budget.end_date,
            categories_json,
            budget.id,
            budget.user_id.as_i64(),
        ],
    );

    let rows_affected = match update_result {
        Ok(rows_affected) => rows_affected,
        Err(error) if is_unknown_column_error(&error, "categories") => {
            tracing::warn!(
                "The budget table has no categories column, updating without the category \
                tree: {error}"
            );

            connection.execute(
                "UPDATE budget
                    SET name = ?1, amount = ?2, start_date = ?3, end_date = ?4
                    WHERE id = ?5 AND user_id = ?6",
                params![
                    budget.name,
                    budget.amount,
                    budget.start_date,
                    budget.end_date,
                    budget.id,
                    budget.user_id.as_i64(),
                ],
            )?
        }
        Err(error) => return Err(error.into()),
    };

    if rows_affected == 0 {
        return Err(Error::UpdateMissingBudget);
    }

    Ok(())
}

/// Delete the budget with the ID `budget_id` owned by `user_id`.
///
/// Deleting a budget that does not exist (or that belongs to another user) is
/// not an error, so the operation is idempotent. The number of deleted rows
/// is returned so callers can distinguish the two cases if they care.
///
/// # Errors
///
/// This function will return an [Error::SqlError] if an SQL related error occurred.
pub fn delete_budget(
    budget_id: DatabaseID,
    user_id: UserID,
    connection: &Connection,
) -> Result<usize, Error> {
    connection
        .execute(
            "DELETE FROM budget WHERE id = ?1 AND user_id = ?2",
            params![budget_id, user_id.as_i64()],
        )
        .map_err(|error| error.into())
}

fn map_row_to_budget(row: &Row) -> Result<Budget, rusqlite::Error> {
    let raw_categories: Option<String> = row.get(6)?;
    let categories = match raw_categories {
        Some(text) => serde_json::from_str(&text).map_err(|error| {
            rusqlite::Error::FromSqlConversionFailure(
                6,
                rusqlite::types::Type::Text,
                Box::new(error),
            )
        })?,
        None => Vec::new(),
    };

    Ok(Budget {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        name: row.get(2)?,
        amount: row.get(3)?,
        start_date: row.get(4)?,
        end_date: row.get(5)?,
        categories,
    })
}

fn map_row_to_budget_without_categories(row: &Row) -> Result<Budget, rusqlite::Error> {
    Ok(Budget {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        name: row.get(2)?,
        amount: row.get(3)?,
        start_date: row.get(4)?,
        end_date: row.get(5)?,
        categories: Vec::new(),
    })
}
