//! Defines the route handler for logging out.

use axum::{
    Json,
    response::{IntoResponse, Response},
};
use axum_extra::extract::PrivateCookieJar;
use serde_json::json;

use crate::auth::invalidate_auth_cookie;

/// Invalidate the auth cookie, logging the user out.
pub async fn get_log_out(jar: PrivateCookieJar) -> Response {
    (invalidate_auth_cookie(jar), Json(json!({ "success": true }))).into_response()
}
