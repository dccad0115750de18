//! Defines the route handler for logging in with an email address and password.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use rusqlite::Connection;
use serde::Deserialize;
use time::Duration;

use crate::{
    AppState, Error,
    auth::{
        UserProfile,
        cookie::{REMEMBER_ME_COOKIE_DURATION, set_auth_cookie},
        get_user_by_email,
    },
    extract::ApiJson,
};

/// The state needed to perform a login.
#[derive(Debug, Clone)]
pub struct LogInState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    /// The database connection for looking up users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for LogInState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<LogInState> for Key {
    fn from_ref(state: &LogInState) -> Self {
        state.cookie_key.clone()
    }
}

/// The credentials sent by the client to log in.
#[derive(Clone, Deserialize)]
pub struct LogInData {
    /// The email address the user registered with.
    pub email: String,
    /// The plain text password, compared against the stored hash.
    pub password: String,
    /// Whether to keep the user logged in for a week.
    #[serde(default)]
    pub remember_me: bool,
}

/// Handler for log-in requests.
///
/// On success the auth cookie is set and the user's profile is returned.
/// An unknown email and a wrong password both produce [Error::InvalidCredentials]
/// so that clients cannot find out which emails are registered.
pub async fn post_log_in(
    State(state): State<LogInState>,
    jar: PrivateCookieJar,
    ApiJson(user_data): ApiJson<LogInData>,
) -> Response {
    let user = {
        let connection = match state.db_connection.lock() {
            Ok(connection) => connection,
            Err(error) => {
                tracing::error!("could not acquire database lock: {error}");
                return Error::DatabaseLockError.into_response();
            }
        };

        match get_user_by_email(&user_data.email, &connection) {
            Ok(user) => user,
            Err(Error::NotFound) => return Error::InvalidCredentials.into_response(),
            Err(error) => {
                tracing::error!("Unhandled error while verifying credentials: {error}");
                return error.into_response();
            }
        }
    };

    match user.password_hash.verify(&user_data.password) {
        Ok(true) => {}
        Ok(false) => return Error::InvalidCredentials.into_response(),
        Err(error) => {
            tracing::error!("Unhandled error while verifying credentials: {error}");
            return Error::HashingError(error.to_string()).into_response();
        }
    }

    let cookie_duration = if user_data.remember_me {
        REMEMBER_ME_COOKIE_DURATION
    } else {
        state.cookie_duration
    };

    match set_auth_cookie(jar, user.id, cookie_duration) {
        Ok(jar) => {
            tracing::info!("User {} logged in", user.id);
            (jar, Json(UserProfile::from(user))).into_response()
        }
        Err(error) => {
            tracing::error!("Error setting auth cookie: {error}");
            error.into_response()
        }
    }
}
