#![allow(missing_docs)]

use std::sync::{Arc, Mutex};

use axum::{body::Body, response::Response};
use axum_test::TestServer;
use rusqlite::Connection;
use serde_json::Value;

use crate::{
    AppState,
    auth::{PasswordHash, User, ValidatedPassword, create_user},
    build_router,
    db::initialize,
};

pub(crate) const TEST_PASSWORD: &str = "averysafeandsecurepassword";

/// Read the whole response body and parse it as JSON.
#[track_caller]
pub(crate) async fn parse_json_body(response: Response<Body>) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Could not read response body");

    serde_json::from_slice(&body).expect("Response body is not valid JSON")
}

/// An in-memory database with every table created.
pub(crate) fn get_test_connection() -> Connection {
    let connection = Connection::open_in_memory().expect("Could not open in-memory database");
    initialize(&connection).expect("Could not initialize database");
    connection
}

/// Insert a user whose password is [TEST_PASSWORD].
pub(crate) fn create_test_user(email: &str, connection: &Connection) -> User {
    let password_hash = PasswordHash::new(ValidatedPassword::new_unchecked(TEST_PASSWORD), 4)
        .expect("Could not hash password");

    create_user("Test User", email, password_hash, connection).expect("Could not create user")
}

/// Wrap a connection for handler state.
pub(crate) fn shared(connection: Connection) -> Arc<Mutex<Connection>> {
    Arc::new(Mutex::new(connection))
}

/// A test server for the full router.
pub(crate) fn get_test_server() -> (TestServer, AppState) {
    let state = AppState::new(
        Connection::open_in_memory().expect("Could not open in-memory database"),
        "test secret",
        "Etc/UTC",
    )
    .expect("Could not create app state");

    let server =
        TestServer::try_new(build_router(state.clone())).expect("Could not create test server.");

    (server, state)
}
