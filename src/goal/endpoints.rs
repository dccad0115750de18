//! Route handlers for saving goals.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::json;
use time::Date;

use crate::{
    AppState, Error,
    auth::UserID,
    extract::ApiJson,
    goal::{
        GoalFields, GoalId, build_goal_overview, create_goal, delete_goal, get_goals,
        goal_progress, top_up_goal, update_goal,
    },
    timezone::local_today,
};

/// The state needed for the saving goal endpoints.
#[derive(Debug, Clone)]
pub struct GoalState {
    /// The local timezone as a canonical timezone name, used to count the days to a deadline.
    pub local_timezone: String,
    /// The database connection for managing saving goals.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for GoalState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request body for creating or editing a saving goal.
#[derive(Debug, Clone, Deserialize)]
pub struct GoalData {
    /// What the user is saving for.
    pub title: String,
    /// The amount to save.
    pub target_amount: f64,
    /// The amount already saved.
    #[serde(default)]
    pub current_amount: f64,
    /// When the user wants to reach the target.
    #[serde(default)]
    pub deadline: Option<Date>,
    /// An emoji, the default icon is used when empty.
    #[serde(default)]
    pub icon: String,
    /// A CSS color, the default color is used when empty.
    #[serde(default)]
    pub color: String,
}

impl From<GoalData> for GoalFields {
    fn from(data: GoalData) -> Self {
        Self {
            title: data.title,
            target_amount: data.target_amount,
            current_amount: data.current_amount,
            deadline: data.deadline,
            icon: data.icon,
            color: data.color,
        }
    }
}

/// The request body for adding savings to a goal.
#[derive(Debug, Clone, Deserialize)]
pub struct TopUpData {
    /// The amount to add, must be positive.
    pub amount: f64,
}

/// Handler for listing the user's saving goals with their progress and totals.
pub async fn get_goals_endpoint(
    State(state): State<GoalState>,
    Extension(user_id): Extension<UserID>,
) -> Response {
    let Some(today) = local_today(&state.local_timezone) else {
        return Error::InvalidTimezoneError(state.local_timezone).into_response();
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match get_goals(user_id, &connection) {
        Ok(goals) => Json(build_goal_overview(goals, today)).into_response(),
        Err(error) => error.into_response(),
    }
}

/// Handler for creating a saving goal.
pub async fn create_goal_endpoint(
    State(state): State<GoalState>,
    Extension(user_id): Extension<UserID>,
    ApiJson(data): ApiJson<GoalData>,
) -> Response {
    let Some(today) = local_today(&state.local_timezone) else {
        return Error::InvalidTimezoneError(state.local_timezone).into_response();
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match create_goal(user_id, data.into(), &connection) {
        Ok(goal) => (StatusCode::CREATED, Json(goal_progress(goal, today))).into_response(),
        Err(error) => {
            tracing::debug!("Could not create saving goal: {error}");
            error.into_response()
        }
    }
}

/// Handler for editing a saving goal.
pub async fn update_goal_endpoint(
    Path(goal_id): Path<GoalId>,
    State(state): State<GoalState>,
    Extension(user_id): Extension<UserID>,
    ApiJson(data): ApiJson<GoalData>,
) -> Response {
    let Some(today) = local_today(&state.local_timezone) else {
        return Error::InvalidTimezoneError(state.local_timezone).into_response();
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match update_goal(user_id, goal_id, data.into(), &connection) {
        Ok(goal) => Json(goal_progress(goal, today)).into_response(),
        Err(error) => error.into_response(),
    }
}

/// Handler for adding savings to a goal.
pub async fn top_up_goal_endpoint(
    Path(goal_id): Path<GoalId>,
    State(state): State<GoalState>,
    Extension(user_id): Extension<UserID>,
    ApiJson(data): ApiJson<TopUpData>,
) -> Response {
    let Some(today) = local_today(&state.local_timezone) else {
        return Error::InvalidTimezoneError(state.local_timezone).into_response();
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match top_up_goal(user_id, goal_id, data.amount, &connection) {
        Ok(goal) => {
            if goal.is_completed {
                tracing::info!("User {user_id} completed saving goal {goal_id}");
            }

            Json(goal_progress(goal, today)).into_response()
        }
        Err(error) => error.into_response(),
    }
}

/// Handler for deleting a saving goal.
pub async fn delete_goal_endpoint(
    Path(goal_id): Path<GoalId>,
    State(state): State<GoalState>,
    Extension(user_id): Extension<UserID>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match delete_goal(user_id, goal_id, &connection) {
        Ok(()) => Json(json!({ "success": true })).into_response(),
        Err(error) => error.into_response(),
    }
}
