//! Defines the route handler for registering a new user.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use rusqlite::Connection;
use serde::Deserialize;
use time::Duration;

use crate::{
    AppState, Error,
    auth::{
        PasswordHash, User, UserProfile, ValidatedPassword, create_user, set_auth_cookie,
        user::{validate_email, validate_name},
    },
    extract::ApiJson,
};

/// The state needed for registering a user.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    /// The database connection for storing users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            db_connection: state.db_connection.clone(),
        }
    }
}

impl FromRef<RegistrationState> for Key {
    fn from_ref(state: &RegistrationState) -> Self {
        state.cookie_key.clone()
    }
}

/// The data sent by the client to register.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterData {
    /// The display name.
    pub name: String,
    /// The email address used to log in.
    pub email: String,
    /// The plain text password.
    pub password: String,
}

/// Handler for registering a user.
///
/// A successful registration also logs the user in by setting the auth cookie,
/// and responds with `201 Created` and the user's profile.
pub async fn register_user(
    State(state): State<RegistrationState>,
    jar: PrivateCookieJar,
    ApiJson(user_data): ApiJson<RegisterData>,
) -> Response {
    let user = match register(&user_data, PasswordHash::DEFAULT_COST, &state.db_connection) {
        Ok(user) => user,
        Err(error) => {
            tracing::debug!("Could not register user: {error}");
            return error.into_response();
        }
    };

    tracing::info!("Registered user {}", user.id);

    match set_auth_cookie(jar, user.id, state.cookie_duration) {
        Ok(jar) => (StatusCode::CREATED, jar, Json(UserProfile::from(user))).into_response(),
        Err(error) => {
            tracing::error!("Error setting auth cookie: {error}");
            error.into_response()
        }
    }
}

/// Validate the registration data, hash the password and store the new user.
///
/// The password is hashed before the database lock is taken since hashing is slow.
fn register(
    user_data: &RegisterData,
    cost: u32,
    db_connection: &Mutex<Connection>,
) -> Result<User, Error> {
    let name = validate_name(&user_data.name)?;
    let email = validate_email(&user_data.email)?;
    let password = ValidatedPassword::new(&user_data.password, &[&name, &email])?;
    let password_hash = PasswordHash::new(password, cost).inspect_err(|error| {
        tracing::error!("an error occurred while hashing a password: {error}");
    })?;

    let connection = db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    create_user(&name, &email, password_hash, &connection)
}

#[cfg(test)]
mod register_tests {
    use std::sync::Mutex;

    use rusqlite::Connection;

    use crate::{Error, auth::get_user_by_email, db::initialize};

    use super::{RegisterData, register};

    fn get_test_connection() -> Mutex<Connection> {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        Mutex::new(connection)
    }

    fn register_data(email: &str, password: &str) -> RegisterData {
        RegisterData {
            name: "Siti".to_owned(),
            email: email.to_owned(),
            password: password.to_owned(),
        }
    }

    #[test]
    fn register_stores_user_with_hashed_password() {
        let connection = get_test_connection();

        let user = register(
            &register_data("siti@example.com", "averysafeandsecurepassword"),
            4,
            &connection,
        )
        .unwrap();

        let stored = get_user_by_email("siti@example.com", &connection.lock().unwrap()).unwrap();
        assert_eq!(stored, user);
        assert!(stored.password_hash.verify("averysafeandsecurepassword").unwrap());
    }

    #[test]
    fn register_rejects_weak_password() {
        let connection = get_test_connection();

        let result = register(&register_data("siti@example.com", "password"), 4, &connection);

        assert!(matches!(result, Err(Error::TooWeak(_))));
    }

    #[test]
    fn register_rejects_duplicate_email() {
        let connection = get_test_connection();
        let data = register_data("siti@example.com", "averysafeandsecurepassword");
        register(&data, 4, &connection).unwrap();

        let result = register(&data, 4, &connection);

        assert_eq!(result, Err(Error::DuplicateEmail));
    }

    #[test]
    fn register_rejects_invalid_email() {
        let connection = get_test_connection();

        let result = register(
            &register_data("siti-at-example", "averysafeandsecurepassword"),
            4,
            &connection,
        );

        assert!(matches!(result, Err(Error::InvalidEmail(_))));
    }
}
