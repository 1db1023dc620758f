//! Code for creating the user table and fetching users from the database.

use std::fmt::Display;

use email_address::EmailAddress;
use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{Error, PasswordHash};

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A user of the application.
///
/// The caller should ensure that `id` is unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The email address the user registered with.
    pub email: EmailAddress,
    /// The user's password hash.
    pub password_hash: PasswordHash,
}

impl User {
    /// Create a new user.
    ///
    /// The caller should ensure that `id` is unique.
    pub fn new(id: UserID, email: EmailAddress, password_hash: PasswordHash) -> Self {
        Self {
            id,
            email,
            password_hash,
        }
    }
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                email TEXT UNIQUE NOT NULL,
                password TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Create and insert a new user into the database.
///
/// # Errors
///
/// This function will return a:
/// - [Error::DuplicateEmail] if `email` belongs to a registered user.
/// - [Error::SqlError] if an SQL related error occurred.
pub fn create_user(
    email: EmailAddress,
    password_hash: PasswordHash,
    connection: &Connection,
) -> Result<User, Error> {
    connection.execute(
        "INSERT INTO user (email, password) VALUES (?1, ?2)",
        (email.to_string(), password_hash.to_string()),
    )?;

    let id = UserID::new(connection.last_insert_rowid());

    Ok(User::new(id, email, password_hash))
}

/// Get the user from the database with an ID equal to `user_id`.
///
/// # Errors
///
/// This function will return an error if:
/// - `user_id` does not belong to a registered user.
/// - there was an error trying to access the store.
pub fn get_user_by_id(user_id: UserID, db_connection: &Connection) -> Result<User, Error> {
    db_connection
        .prepare("SELECT id, email, password FROM user WHERE id = :id")?
        .query_row(&[(":id", &user_id.as_i64())], map_row_to_user)
        .map_err(|error| error.into())
}

/// Get the user from the database with the email address `email`.
///
/// # Errors
///
/// This function will return an error if:
/// - `email` does not belong to a registered user.
/// - there was an error trying to access the store.
pub fn get_user_by_email(email: &EmailAddress, db_connection: &Connection) -> Result<User, Error> {
    db_connection
        .prepare("SELECT id, email, password FROM user WHERE email = :email")?
        .query_row(&[(":email", &email.to_string())], map_row_to_user)
        .map_err(|error| error.into())
}

fn map_row_to_user(row: &Row) -> Result<User, rusqlite::Error> {
    let raw_id = row.get(0)?;
    let raw_email: String = row.get(1)?;
    let raw_password_hash: String = row.get(2)?;

    let id = UserID::new(raw_id);
    let email = EmailAddress::new_unchecked(raw_email);
    let password_hash = PasswordHash::new_unchecked(&raw_password_hash);

    Ok(User {
        id,
        email,
        password_hash,
    })
}
