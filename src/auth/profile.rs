//! Route handlers for viewing and editing the logged in user's profile.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    auth::{
        PasswordHash, UserID, UserProfile, ValidatedPassword, get_user_by_id, update_password,
        update_user_name,
    },
    extract::ApiJson,
};

/// The state needed for the profile endpoints.
#[derive(Debug, Clone)]
pub struct ProfileState {
    /// The database connection for managing users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ProfileState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request body for changing the display name.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateProfileData {
    /// The new display name.
    pub name: String,
}

/// The request body for changing the password.
#[derive(Debug, Clone, Deserialize)]
pub struct ChangePasswordData {
    /// The password the user currently logs in with.
    pub current_password: String,
    /// The replacement password.
    pub new_password: String,
}

#[derive(Debug, Serialize)]
struct SuccessResponse {
    success: bool,
}

/// Handler for getting the profile of the logged in user.
pub async fn get_profile(
    State(state): State<ProfileState>,
    Extension(user_id): Extension<UserID>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match get_user_by_id(user_id, &connection) {
        Ok(user) => Json(UserProfile::from(user)).into_response(),
        Err(error) => error.into_response(),
    }
}

/// Handler for changing the display name of the logged in user.
pub async fn update_profile(
    State(state): State<ProfileState>,
    Extension(user_id): Extension<UserID>,
    ApiJson(data): ApiJson<UpdateProfileData>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    let result = update_user_name(user_id, &data.name, &connection)
        .and_then(|_| get_user_by_id(user_id, &connection));

    match result {
        Ok(user) => Json(UserProfile::from(user)).into_response(),
        Err(error) => error.into_response(),
    }
}

/// Handler for changing the password of the logged in user.
///
/// The current password must be supplied and correct, otherwise
/// [Error::InvalidCredentials] is returned.
pub async fn change_password(
    State(state): State<ProfileState>,
    Extension(user_id): Extension<UserID>,
    ApiJson(data): ApiJson<ChangePasswordData>,
) -> Response {
    match change_user_password(user_id, &data, PasswordHash::DEFAULT_COST, &state.db_connection) {
        Ok(()) => {
            tracing::info!("User {user_id} changed their password");
            Json(SuccessResponse { success: true }).into_response()
        }
        Err(error) => error.into_response(),
    }
}

fn change_user_password(
    user_id: UserID,
    data: &ChangePasswordData,
    cost: u32,
    db_connection: &Mutex<Connection>,
) -> Result<(), Error> {
    let user = {
        let connection = db_connection.lock().map_err(|error| {
            tracing::error!("could not acquire database lock: {error}");
            Error::DatabaseLockError
        })?;
        get_user_by_id(user_id, &connection)?
    };

    let is_current = user
        .password_hash
        .verify(&data.current_password)
        .map_err(|error| Error::HashingError(error.to_string()))?;

    if !is_current {
        return Err(Error::InvalidCredentials);
    }

    let password = ValidatedPassword::new(&data.new_password, &[&user.name, &user.email])?;
    let password_hash = PasswordHash::new(password, cost)?;

    let connection = db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    update_password(user_id, &password_hash, &connection)
}
