//! Code for creating the user table and fetching users from the database.

use std::fmt::Display;

use email_address::EmailAddress;
use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{Error, auth::PasswordHash};

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors.
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

/// A registered user of the application.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The display name.
    pub name: String,
    /// The email address used to log in, unique across users.
    pub email: String,
    /// The user's password hash.
    pub password_hash: PasswordHash,
}

/// The public parts of a [User] that are safe to send to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// The user's ID.
    pub id: UserID,
    /// The display name.
    pub name: String,
    /// The email address used to log in.
    pub email: String,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
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
                name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                password TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Trim and check a display name.
///
/// # Errors
///
/// Returns [Error::EmptyName] if `name` is empty or only whitespace.
pub fn validate_name(name: &str) -> Result<String, Error> {
    let name = name.trim();

    if name.is_empty() {
        Err(Error::EmptyName)
    } else {
        Ok(name.to_owned())
    }
}

/// Trim, lowercase and check an email address.
///
/// # Errors
///
/// Returns [Error::InvalidEmail] if `email` is not a valid email address.
pub fn validate_email(email: &str) -> Result<String, Error> {
    let email = email.trim().to_lowercase();

    if EmailAddress::is_valid(&email) {
        Ok(email)
    } else {
        Err(Error::InvalidEmail(email))
    }
}

/// Create and insert a new user into the database.
///
/// `name` and `email` are validated with [validate_name] and [validate_email].
///
/// # Errors
///
/// Returns a:
/// - [Error::EmptyName] or [Error::InvalidEmail] for invalid input,
/// - [Error::DuplicateEmail] if the email address is already registered,
/// - [Error::SqlError] if an SQL related error occurred.
pub fn create_user(
    name: &str,
    email: &str,
    password_hash: PasswordHash,
    connection: &Connection,
) -> Result<User, Error> {
    let name = validate_name(name)?;
    let email = validate_email(email)?;

    connection
        .execute(
            "INSERT INTO user (name, email, password) VALUES (?1, ?2, ?3)",
            (&name, &email, password_hash.as_ref()),
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(sql_error, _)
                if sql_error.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
            {
                Error::DuplicateEmail
            }
            error => error.into(),
        })?;

    let id = UserID::new(connection.last_insert_rowid());

    Ok(User {
        id,
        name,
        email,
        password_hash,
    })
}

/// Get the user from the database with an ID equal to `user_id`.
///
/// # Errors
///
/// This function will return an error if:
/// - `user_id` does not belong to a registered user.
/// - there was an error trying to access the store.
pub fn get_user_by_id(user_id: UserID, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare("SELECT id, name, email, password FROM user WHERE id = :id")?
        .query_row(&[(":id", &user_id.as_i64())], map_user_row)
        .map_err(|error| error.into())
}

/// Get the user registered with `email`.
///
/// The email is compared after trimming and lowercasing.
///
/// # Errors
///
/// Returns [Error::NotFound] if no user has the email address.
pub fn get_user_by_email(email: &str, connection: &Connection) -> Result<User, Error> {
    let email = email.trim().to_lowercase();

    connection
        .prepare("SELECT id, name, email, password FROM user WHERE email = :email")?
        .query_row(&[(":email", &email)], map_user_row)
        .map_err(|error| error.into())
}

/// Get the IDs of every registered user in ascending order.
pub fn get_all_user_ids(connection: &Connection) -> Result<Vec<UserID>, Error> {
    connection
        .prepare("SELECT id FROM user ORDER BY id ASC")?
        .query_map([], |row| row.get(0).map(UserID::new))?
        .map(|maybe_id| maybe_id.map_err(Error::from))
        .collect()
}

/// Change the display name of a user.
///
/// # Errors
///
/// Returns [Error::EmptyName] for an empty name or [Error::NotFound] if the user does not exist.
pub fn update_user_name(
    user_id: UserID,
    name: &str,
    connection: &Connection,
) -> Result<String, Error> {
    let name = validate_name(name)?;

    let rows_affected = connection.execute(
        "UPDATE user SET name = ?1 WHERE id = ?2",
        (&name, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(name)
}

/// Replace the password hash of a user.
///
/// # Errors
///
/// Returns [Error::NotFound] if the user does not exist.
pub fn update_password(
    user_id: UserID,
    password_hash: &PasswordHash,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE user SET password = ?1 WHERE id = ?2",
        (password_hash.as_ref(), user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

fn map_user_row(row: &Row) -> Result<User, rusqlite::Error> {
    let raw_id = row.get(0)?;
    let name = row.get(1)?;
    let email = row.get(2)?;
    let raw_password_hash: String = row.get(3)?;

    Ok(User {
        id: UserID::new(raw_id),
        name,
        email,
        password_hash: PasswordHash::new_unchecked(&raw_password_hash),
    })
}
