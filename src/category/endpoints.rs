//! Route handlers for listing and managing categories.

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

use crate::{
    AppState, Error,
    auth::UserID,
    category::{
        CategoryId, CategoryName, NewCategory, create_category, delete_category,
        get_all_categories, get_category, update_category,
    },
    extract::ApiJson,
    transaction::TransactionType,
};

/// The state needed for the category endpoints.
#[derive(Debug, Clone)]
pub struct CategoryState {
    /// The database connection for managing categories.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CategoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request body for creating or updating a category.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryData {
    /// The display name.
    pub name: String,
    /// Whether the category is meant for income or expenses.
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// An emoji, the default icon is used when omitted.
    pub icon: Option<String>,
    /// A CSS color, the default color is used when omitted.
    pub color: Option<String>,
}

impl CategoryData {
    fn validate(&self) -> Result<NewCategory, Error> {
        let name = CategoryName::new(&self.name)?;

        Ok(NewCategory::new(name, self.kind)
            .icon(self.icon.as_deref())
            .color(self.color.as_deref()))
    }
}

/// Handler for listing all categories ordered by name.
pub async fn get_categories_endpoint(State(state): State<CategoryState>) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match get_all_categories(&connection) {
        Ok(categories) => Json(categories).into_response(),
        Err(error) => error.into_response(),
    }
}

/// Handler for creating a category.
pub async fn create_category_endpoint(
    State(state): State<CategoryState>,
    ApiJson(data): ApiJson<CategoryData>,
) -> Response {
    let new_category = match data.validate() {
        Ok(new_category) => new_category,
        Err(error) => return error.into_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match create_category(new_category, &connection) {
        Ok(category) => (StatusCode::CREATED, Json(category)).into_response(),
        Err(error) => {
            tracing::error!("Could not create category with {data:?}: {error}");
            error.into_response()
        }
    }
}

/// Handler for replacing a category's fields.
pub async fn update_category_endpoint(
    Path(category_id): Path<CategoryId>,
    State(state): State<CategoryState>,
    ApiJson(data): ApiJson<CategoryData>,
) -> Response {
    let new_category = match data.validate() {
        Ok(new_category) => new_category,
        Err(error) => return error.into_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match update_category(category_id, &new_category, &connection)
        .and_then(|_| get_category(category_id, &connection))
    {
        Ok(category) => Json(category).into_response(),
        Err(error) => error.into_response(),
    }
}

/// Handler for deleting a category the user has no transactions in.
pub async fn delete_category_endpoint(
    Path(category_id): Path<CategoryId>,
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserID>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match delete_category(category_id, user_id, &connection) {
        Ok(()) => Json(json!({ "success": true })).into_response(),
        Err(Error::CategoryInUse) => {
            tracing::debug!("User {user_id} tried to delete category {category_id} which is in use");
            Error::CategoryInUse.into_response()
        }
        Err(error) => error.into_response(),
    }
}

#[cfg(test)]
mod category_endpoint_tests {
    use axum::{
        Extension,
        extract::{Path, State},
        http::StatusCode,
    };
    use time::macros::date;

    use crate::{
        category::{CategoryName, NewCategory, create_category, get_category},
        extract::ApiJson,
        test_utils::{create_test_user, get_test_connection, parse_json_body, shared},
        transaction::{NewTransaction, TransactionType, create_transaction},
    };

    use super::{
        CategoryData, CategoryState, create_category_endpoint, delete_category_endpoint,
        get_categories_endpoint, update_category_endpoint,
    };

    fn category_data(name: &str) -> CategoryData {
        CategoryData {
            name: name.to_owned(),
            kind: TransactionType::Expense,
            icon: None,
            color: None,
        }
    }

    #[tokio::test]
    async fn create_then_list() {
        let state = CategoryState {
            db_connection: shared(get_test_connection()),
        };

        let response =
            create_category_endpoint(State(state.clone()), ApiJson(category_data("Kopi"))).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = parse_json_body(response).await;
        assert_eq!(created["name"], "Kopi");
        assert_eq!(created["type"], "expense");
        assert_eq!(created["icon"], "📦");

        let response = get_categories_endpoint(State(state)).await;
        let body = parse_json_body(response).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn create_rejects_empty_name() {
        let state = CategoryState {
            db_connection: shared(get_test_connection()),
        };

        let response = create_category_endpoint(State(state), ApiJson(category_data("  "))).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn update_missing_category_is_not_found() {
        let state = CategoryState {
            db_connection: shared(get_test_connection()),
        };

        let response =
            update_category_endpoint(Path(99), State(state), ApiJson(category_data("Kopi"))).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_in_use_category_is_rejected() {
        let connection = get_test_connection();
        let user = create_test_user("siti@example.com", &connection);
        let category = create_category(
            NewCategory::new(CategoryName::new_unchecked("Kopi"), TransactionType::Expense),
            &connection,
        )
        .unwrap();
        create_transaction(
            user.id,
            NewTransaction::new(
                category.id,
                18_000.0,
                TransactionType::Expense,
                date!(2025 - 03 - 02),
            ),
            &connection,
        )
        .unwrap();
        let state = CategoryState {
            db_connection: shared(connection),
        };

        let response =
            delete_category_endpoint(Path(category.id), State(state.clone()), Extension(user.id))
                .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = parse_json_body(response).await;
        assert_eq!(
            body["error"],
            "the category is still used by transactions and cannot be deleted"
        );
        let connection = state.db_connection.lock().unwrap();
        assert!(get_category(category.id, &connection).is_ok());
    }
}
