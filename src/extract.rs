//! Request extractors whose rejections use the crate's JSON error format.

use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};
use serde::de::DeserializeOwned;

use crate::Error;

/// A JSON request body.
///
/// Works like [axum::Json] except that a missing, malformed or mistyped body is
/// rejected with [Error::InvalidJson], so clients always get an `{"error": ...}` body.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(request, state).await?;

        Ok(Self(value))
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!("rejected request body: {rejection}");
        Error::InvalidJson(rejection.body_text())
    }
}

#[cfg(test)]
mod api_json_tests {
    use axum::{Router, routing::post};
    use axum_test::TestServer;
    use serde::Deserialize;
    use serde_json::{Value, json};

    use super::ApiJson;

    #[derive(Deserialize)]
    struct Payload {
        day: u8,
    }

    fn test_server() -> TestServer {
        let app = Router::new().route(
            "/payload",
            post(|ApiJson(payload): ApiJson<Payload>| async move { payload.day.to_string() }),
        );

        TestServer::try_new(app).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn valid_body_is_extracted() {
        let response = test_server().post("/payload").json(&json!({ "day": 5 })).await;

        response.assert_status_ok();
        response.assert_text("5");
    }

    #[tokio::test]
    async fn mistyped_body_gets_json_error() {
        let response = test_server().post("/payload").json(&json!({ "day": "lima" })).await;

        response.assert_status_bad_request();
        let body = response.json::<Value>();
        assert!(body["error"].as_str().is_some_and(|message| message.contains("day")));
    }

    #[tokio::test]
    async fn missing_content_type_gets_json_error() {
        let response = test_server().post("/payload").text("{\"day\": 5}").await;

        response.assert_status_bad_request();
        let body = response.json::<Value>();
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn malformed_body_gets_json_error() {
        let response = test_server()
            .post("/payload")
            .text("{\"day\": ")
            .content_type("application/json")
            .await;

        response.assert_status_bad_request();
        let body = response.json::<Value>();
        assert!(body["error"].is_string());
    }
}
