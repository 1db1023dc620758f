//! Creates the application's database tables.

use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::{Error, budget::create_budget_table, user::create_user_table};

/// Create the tables for the application in the database connected to by `connection`.
///
/// The tables are created in a single exclusive transaction so that a
/// partially initialized database is never left behind.
///
/// # Errors
/// Returns an error if the tables could not be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_budget_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}
