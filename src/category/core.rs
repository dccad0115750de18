//! Defines the category model and its database queries.

use std::fmt::Display;

use rusqlite::{Connection, Row, params};
use serde::{Deserialize, Serialize};

use crate::{
    Error, auth::UserID, database_id::DatabaseId, transaction::TransactionType,
};

/// Database identifier for a category.
pub type CategoryId = DatabaseId;

/// The icon used when a category is created without one.
pub const DEFAULT_CATEGORY_ICON: &str = "📦";
/// The color used when a category is created without one.
pub const DEFAULT_CATEGORY_COLOR: &str = "#6b7280";

/// A validated, non-empty category name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct CategoryName(String);

impl CategoryName {
    /// Create a category name.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::EmptyName] if `name` is empty or only whitespace.
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = name.trim();

        if name.is_empty() {
            Err(Error::EmptyName)
        } else {
            Ok(Self(name.to_string()))
        }
    }

    /// Create a category name without validation.
    ///
    /// The caller should ensure that the string is not empty.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl AsRef<str> for CategoryName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for CategoryName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A label for grouping transactions, e.g. 'Gaji' or 'Transport'.
///
/// Categories are shared by all users.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    /// The ID of the category.
    pub id: CategoryId,
    /// The display name.
    pub name: CategoryName,
    /// Whether the category is meant for income or expenses.
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// An emoji shown next to the name.
    pub icon: String,
    /// A CSS color, e.g. "#22c55e".
    pub color: String,
}

/// The fields needed to create or replace a category.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCategory {
    /// The display name.
    pub name: CategoryName,
    /// Whether the category is meant for income or expenses.
    pub kind: TransactionType,
    /// An emoji shown next to the name.
    pub icon: String,
    /// A CSS color.
    pub color: String,
}

impl NewCategory {
    /// Create category fields with the default icon and color.
    pub fn new(name: CategoryName, kind: TransactionType) -> Self {
        Self {
            name,
            kind,
            icon: DEFAULT_CATEGORY_ICON.to_owned(),
            color: DEFAULT_CATEGORY_COLOR.to_owned(),
        }
    }

    /// Set the icon, keeping the default for `None` or blank strings.
    pub fn icon(mut self, icon: Option<&str>) -> Self {
        if let Some(icon) = icon.map(str::trim).filter(|icon| !icon.is_empty()) {
            self.icon = icon.to_owned();
        }
        self
    }

    /// Set the color, keeping the default for `None` or blank strings.
    pub fn color(mut self, color: Option<&str>) -> Self {
        if let Some(color) = color.map(str::trim).filter(|color| !color.is_empty()) {
            self.color = color.to_owned();
        }
        self
    }
}

/// The categories inserted into an empty database: (name, type, icon, color).
const DEFAULT_CATEGORIES: [(&str, TransactionType, &str, &str); 12] = [
    ("Gaji", TransactionType::Income, "💼", "#22c55e"),
    ("Freelance", TransactionType::Income, "💻", "#16a34a"),
    ("Investasi", TransactionType::Income, "📈", "#15803d"),
    ("Bonus", TransactionType::Income, "🎁", "#166534"),
    ("Makan & Minum", TransactionType::Expense, "🍜", "#ef4444"),
    ("Transport", TransactionType::Expense, "🚗", "#f97316"),
    ("Belanja", TransactionType::Expense, "🛍️", "#eab308"),
    ("Hiburan", TransactionType::Expense, "🎮", "#8b5cf6"),
    ("Kesehatan", TransactionType::Expense, "💊", "#06b6d4"),
    ("Tagihan", TransactionType::Expense, "📱", "#64748b"),
    ("Pendidikan", TransactionType::Expense, "📚", "#f59e0b"),
    ("Lainnya", TransactionType::Expense, "📦", "#6b7280"),
];

/// Create the category table.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS category (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            type TEXT NOT NULL CHECK (type IN ('income', 'expense')),
            icon TEXT NOT NULL DEFAULT '📦',
            color TEXT NOT NULL DEFAULT '#6b7280'
        );

        CREATE INDEX IF NOT EXISTS idx_category_name ON category(name);",
    )?;

    Ok(())
}

/// Create a category and return it with its generated ID.
pub fn create_category(category: NewCategory, connection: &Connection) -> Result<Category, Error> {
    connection.execute(
        "INSERT INTO category (name, type, icon, color) VALUES (?1, ?2, ?3, ?4)",
        params![
            category.name.as_ref(),
            category.kind,
            category.icon,
            category.color
        ],
    )?;

    let id = connection.last_insert_rowid();

    Ok(Category {
        id,
        name: category.name,
        kind: category.kind,
        icon: category.icon,
        color: category.color,
    })
}

/// Retrieve a single category by ID.
///
/// # Errors
/// Returns [Error::NotFound] if `category_id` does not refer to a category.
pub fn get_category(category_id: CategoryId, connection: &Connection) -> Result<Category, Error> {
    connection
        .prepare("SELECT id, name, type, icon, color FROM category WHERE id = :id")?
        .query_row(&[(":id", &category_id)], map_category_row)
        .map_err(|error| error.into())
}

/// Retrieve all categories ordered alphabetically by name.
pub fn get_all_categories(connection: &Connection) -> Result<Vec<Category>, Error> {
    connection
        .prepare("SELECT id, name, type, icon, color FROM category ORDER BY name ASC, id ASC")?
        .query_map([], map_category_row)?
        .map(|maybe_category| maybe_category.map_err(|error| error.into()))
        .collect()
}

/// Replace every field of a category.
///
/// # Errors
/// Returns [Error::UpdateMissingCategory] if the category doesn't exist.
pub fn update_category(
    category_id: CategoryId,
    category: &NewCategory,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE category SET name = ?1, type = ?2, icon = ?3, color = ?4 WHERE id = ?5",
        params![
            category.name.as_ref(),
            category.kind,
            category.icon,
            category.color,
            category_id
        ],
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingCategory);
    }

    Ok(())
}

/// Delete a category on behalf of `user_id`.
///
/// A category cannot be deleted while the user has transactions in it. Transactions, recurring
/// transactions and budgets of other users also keep the category alive through the foreign key.
///
/// # Errors
/// Returns a:
/// - [Error::CategoryInUse] if any transaction, recurring transaction or budget still refers to
///   the category,
/// - [Error::DeleteMissingCategory] if the category doesn't exist.
pub fn delete_category(
    category_id: CategoryId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let transaction_count: i64 = connection.query_row(
        "SELECT COUNT(id) FROM \"transaction\" WHERE category_id = ?1 AND user_id = ?2",
        (category_id, user_id.as_i64()),
        |row| row.get(0),
    )?;

    if transaction_count > 0 {
        return Err(Error::CategoryInUse);
    }

    let rows_affected = connection
        .execute("DELETE FROM category WHERE id = ?1", [category_id])
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(sql_error, _)
                if sql_error.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY =>
            {
                Error::CategoryInUse
            }
            error => error.into(),
        })?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingCategory);
    }

    Ok(())
}

/// Get the total number of categories in the database.
pub fn count_categories(connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM category", [], |row| row.get(0))
        .map_err(|error| error.into())
}

/// Insert the default categories if there are no categories yet.
///
/// Returns the number of categories inserted, which is zero when the table was not empty.
pub fn seed_default_categories(connection: &Connection) -> Result<usize, Error> {
    if count_categories(connection)? > 0 {
        return Ok(0);
    }

    let mut statement =
        connection.prepare("INSERT INTO category (name, type, icon, color) VALUES (?1, ?2, ?3, ?4)")?;

    for (name, kind, icon, color) in DEFAULT_CATEGORIES {
        statement.execute(params![name, kind, icon, color])?;
    }

    tracing::info!("Seeded {} default categories", DEFAULT_CATEGORIES.len());

    Ok(DEFAULT_CATEGORIES.len())
}

fn map_category_row(row: &Row) -> Result<Category, rusqlite::Error> {
    let id = row.get(0)?;
    let raw_name: String = row.get(1)?;
    let kind = row.get(2)?;
    let icon = row.get(3)?;
    let color = row.get(4)?;

    Ok(Category {
        id,
        name: CategoryName::new_unchecked(&raw_name),
        kind,
        icon,
        color,
    })
}


#[cfg(test)]
mod category_query_tests {
    use time::macros::date;

    use crate::{
        Error,
        budget::{get_budgets, upsert_budget},
        category::{
            CategoryName, DEFAULT_CATEGORY_COLOR, DEFAULT_CATEGORY_ICON, NewCategory,
            count_categories, create_category, delete_category, get_all_categories, get_category,
            seed_default_categories, update_category,
        },
        month::MonthWindow,
        test_utils::{create_test_user, get_test_connection},
        transaction::{NewTransaction, TransactionType, create_transaction},
    };

    fn new_category(name: &str) -> NewCategory {
        NewCategory::new(CategoryName::new_unchecked(name), TransactionType::Expense)
    }

    #[test]
    fn create_category_uses_defaults() {
        let connection = get_test_connection();

        let category = create_category(new_category("Kopi"), &connection).unwrap();

        assert!(category.id > 0);
        assert_eq!(category.icon, DEFAULT_CATEGORY_ICON);
        assert_eq!(category.color, DEFAULT_CATEGORY_COLOR);
        assert_eq!(get_category(category.id, &connection), Ok(category));
    }

    #[test]
    fn blank_icon_keeps_default() {
        let category = new_category("Kopi").icon(Some("  ")).color(Some("#000000"));

        assert_eq!(category.icon, DEFAULT_CATEGORY_ICON);
        assert_eq!(category.color, "#000000");
    }

    #[test]
    fn get_category_with_invalid_id_returns_not_found() {
        let connection = get_test_connection();

        assert_eq!(get_category(999, &connection), Err(Error::NotFound));
    }

    #[test]
    fn all_categories_are_sorted_by_name() {
        let connection = get_test_connection();
        create_category(new_category("Zakat"), &connection).unwrap();
        create_category(new_category("Arisan"), &connection).unwrap();

        let names: Vec<String> = get_all_categories(&connection)
            .unwrap()
            .into_iter()
            .map(|category| category.name.to_string())
            .collect();

        assert_eq!(names, vec!["Arisan", "Zakat"]);
    }

    #[test]
    fn update_category_succeeds() {
        let connection = get_test_connection();
        let category = create_category(new_category("Kopi"), &connection).unwrap();
        let replacement = NewCategory::new(
            CategoryName::new_unchecked("Ngopi"),
            TransactionType::Expense,
        )
        .icon(Some("☕"));

        update_category(category.id, &replacement, &connection).unwrap();

        let got = get_category(category.id, &connection).unwrap();
        assert_eq!(got.name.as_ref(), "Ngopi");
        assert_eq!(got.icon, "☕");
    }

    #[test]
    fn update_missing_category_fails() {
        let connection = get_test_connection();

        assert_eq!(
            update_category(42, &new_category("Kopi"), &connection),
            Err(Error::UpdateMissingCategory)
        );
    }

    #[test]
    fn delete_unused_category_succeeds() {
        let connection = get_test_connection();
        let user = create_test_user("siti@example.com", &connection);
        let category = create_category(new_category("Kopi"), &connection).unwrap();

        delete_category(category.id, user.id, &connection).unwrap();

        assert_eq!(get_category(category.id, &connection), Err(Error::NotFound));
    }

    #[test]
    fn delete_missing_category_fails() {
        let connection = get_test_connection();
        let user = create_test_user("siti@example.com", &connection);

        assert_eq!(
            delete_category(42, user.id, &connection),
            Err(Error::DeleteMissingCategory)
        );
    }

    #[test]
    fn delete_category_with_transactions_is_rejected() {
        let connection = get_test_connection();
        let user = create_test_user("siti@example.com", &connection);
        let category = create_category(new_category("Kopi"), &connection).unwrap();
        create_transaction(
            user.id,
            NewTransaction::new(
                category.id,
                25_000.0,
                TransactionType::Expense,
                date!(2025 - 01 - 10),
            ),
            &connection,
        )
        .unwrap();

        let result = delete_category(category.id, user.id, &connection);

        assert_eq!(result, Err(Error::CategoryInUse));
        assert!(get_category(category.id, &connection).is_ok());
    }

    #[test]
    fn delete_category_used_by_another_user_is_rejected() {
        let connection = get_test_connection();
        let owner = create_test_user("siti@example.com", &connection);
        let other = create_test_user("budi@example.com", &connection);
        let category = create_category(new_category("Kopi"), &connection).unwrap();
        create_transaction(
            owner.id,
            NewTransaction::new(
                category.id,
                25_000.0,
                TransactionType::Expense,
                date!(2025 - 01 - 10),
            ),
            &connection,
        )
        .unwrap();

        let result = delete_category(category.id, other.id, &connection);

        assert_eq!(result, Err(Error::CategoryInUse));
    }

    #[test]
    fn delete_category_budgeted_by_another_user_is_rejected() {
        let connection = get_test_connection();
        let owner = create_test_user("siti@example.com", &connection);
        let other = create_test_user("budi@example.com", &connection);
        let category = create_category(new_category("Kopi"), &connection).unwrap();
        let window = MonthWindow::new(3, 2025).unwrap();
        upsert_budget(owner.id, category.id, 500_000.0, window, &connection).unwrap();

        let result = delete_category(category.id, other.id, &connection);

        assert_eq!(result, Err(Error::CategoryInUse));
        assert!(get_category(category.id, &connection).is_ok());
        assert_eq!(get_budgets(owner.id, window, &connection).unwrap().len(), 1);
    }

    #[test]
    fn seed_only_fills_empty_table() {
        let connection = get_test_connection();

        assert_eq!(seed_default_categories(&connection), Ok(12));
        assert_eq!(seed_default_categories(&connection), Ok(0));
        assert_eq!(count_categories(&connection), Ok(12));

        let gaji = get_all_categories(&connection)
            .unwrap()
            .into_iter()
            .find(|category| category.name.as_ref() == "Gaji")
            .unwrap();
        assert_eq!(gaji.kind, TransactionType::Income);
    }
}
