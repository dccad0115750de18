//! Defines the saving goal model and its database queries.

use rusqlite::{Connection, Row, params};
use serde::Serialize;
use time::{Date, OffsetDateTime};

use crate::{
    Error, auth::UserID, database_id::DatabaseId, transaction::validate_positive_amount,
};

/// Database identifier for a saving goal.
pub type GoalId = DatabaseId;

/// The icon used when a goal is created without one.
pub const DEFAULT_GOAL_ICON: &str = "🎯";
/// The color used when a goal is created without one.
pub const DEFAULT_GOAL_COLOR: &str = "#3b82f6";

/// An amount of money the user is saving up for.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SavingGoal {
    /// The ID of the goal.
    pub id: GoalId,
    /// The user that owns the goal.
    pub user_id: UserID,
    /// What the user is saving for, e.g. "New laptop".
    pub title: String,
    /// The amount to save, always positive.
    pub target_amount: f64,
    /// The amount saved so far.
    pub current_amount: f64,
    /// When the user wants to reach the target.
    pub deadline: Option<Date>,
    /// An emoji shown next to the title.
    pub icon: String,
    /// A CSS color.
    pub color: String,
    /// Whether the saved amount has reached the target.
    pub is_completed: bool,
    /// When the goal was created.
    pub created_at: OffsetDateTime,
}

/// The user editable fields of a saving goal.
#[derive(Debug, Clone, PartialEq)]
pub struct GoalFields {
    /// What the user is saving for.
    pub title: String,
    /// The amount to save.
    pub target_amount: f64,
    /// The amount saved so far.
    pub current_amount: f64,
    /// When the user wants to reach the target.
    pub deadline: Option<Date>,
    /// An emoji shown next to the title.
    pub icon: String,
    /// A CSS color.
    pub color: String,
}

impl GoalFields {
    /// Trim and check the fields.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::EmptyTitle] if the title is empty,
    /// - [Error::InvalidAmount] if the target is not positive or the saved amount is negative.
    pub fn validate(mut self) -> Result<Self, Error> {
        self.title = self.title.trim().to_owned();

        if self.title.is_empty() {
            return Err(Error::EmptyTitle);
        }

        validate_positive_amount(self.target_amount)?;

        if !self.current_amount.is_finite() || self.current_amount < 0.0 {
            return Err(Error::InvalidAmount(self.current_amount));
        }

        if self.icon.trim().is_empty() {
            DEFAULT_GOAL_ICON.clone_into(&mut self.icon);
        }

        if self.color.trim().is_empty() {
            DEFAULT_GOAL_COLOR.clone_into(&mut self.color);
        }

        Ok(self)
    }

    fn is_completed(&self) -> bool {
        self.current_amount >= self.target_amount
    }
}

const GOAL_COLUMNS: &str = "id, user_id, title, target_amount, current_amount, deadline, icon, \
                            color, is_completed, created_at";

/// Create the saving goal table.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_goal_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS saving_goal (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            title TEXT NOT NULL,
            target_amount REAL NOT NULL CHECK (target_amount > 0),
            current_amount REAL NOT NULL DEFAULT 0 CHECK (current_amount >= 0),
            deadline TEXT,
            icon TEXT NOT NULL DEFAULT '🎯',
            color TEXT NOT NULL DEFAULT '#3b82f6',
            is_completed INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            FOREIGN KEY(user_id) REFERENCES user(id) ON DELETE CASCADE
        )",
        (),
    )?;

    Ok(())
}

/// Create a saving goal owned by `user_id`.
///
/// # Errors
/// Returns an error if `fields` are invalid, see [GoalFields::validate].
pub fn create_goal(
    user_id: UserID,
    fields: GoalFields,
    connection: &Connection,
) -> Result<SavingGoal, Error> {
    let fields = fields.validate()?;

    connection
        .prepare(&format!(
            "INSERT INTO saving_goal
                (user_id, title, target_amount, current_amount, deadline, icon, color, is_completed, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             RETURNING {GOAL_COLUMNS}"
        ))?
        .query_row(
            params![
                user_id.as_i64(),
                fields.title,
                fields.target_amount,
                fields.current_amount,
                fields.deadline,
                fields.icon,
                fields.color,
                fields.is_completed(),
                OffsetDateTime::now_utc(),
            ],
            map_goal_row,
        )
        .map_err(|error| error.into())
}

/// Retrieve a saving goal owned by `user_id`.
///
/// # Errors
/// Returns [Error::NotFound] if the user has no goal with `id`.
pub fn get_goal(user_id: UserID, id: GoalId, connection: &Connection) -> Result<SavingGoal, Error> {
    connection
        .prepare(&format!(
            "SELECT {GOAL_COLUMNS} FROM saving_goal WHERE id = ?1 AND user_id = ?2"
        ))?
        .query_row((id, user_id.as_i64()), map_goal_row)
        .map_err(|error| error.into())
}

/// Retrieve the user's saving goals, newest first.
pub fn get_goals(user_id: UserID, connection: &Connection) -> Result<Vec<SavingGoal>, Error> {
    connection
        .prepare(&format!(
            "SELECT {GOAL_COLUMNS} FROM saving_goal WHERE user_id = ?1
             ORDER BY created_at DESC, id DESC"
        ))?
        .query_map([user_id.as_i64()], map_goal_row)?
        .map(|maybe_goal| maybe_goal.map_err(Error::from))
        .collect()
}

/// Replace the user editable fields of a saving goal.
///
/// # Errors
/// Returns [Error::UpdateMissingGoal] if the user has no goal with `id`, or an error if `fields`
/// are invalid.
pub fn update_goal(
    user_id: UserID,
    id: GoalId,
    fields: GoalFields,
    connection: &Connection,
) -> Result<SavingGoal, Error> {
    let fields = fields.validate()?;

    let rows_affected = connection.execute(
        "UPDATE saving_goal
         SET title = ?1, target_amount = ?2, current_amount = ?3, deadline = ?4, icon = ?5,
             color = ?6, is_completed = ?7
         WHERE id = ?8 AND user_id = ?9",
        params![
            fields.title,
            fields.target_amount,
            fields.current_amount,
            fields.deadline,
            fields.icon,
            fields.color,
            fields.is_completed(),
            id,
            user_id.as_i64(),
        ],
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingGoal);
    }

    get_goal(user_id, id, connection)
}

/// Add `amount` to the saved amount of a goal.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidAmount] if `amount` is not positive,
/// - [Error::UpdateMissingGoal] if the user has no goal with `id`.
pub fn top_up_goal(
    user_id: UserID,
    id: GoalId,
    amount: f64,
    connection: &Connection,
) -> Result<SavingGoal, Error> {
    validate_positive_amount(amount)?;

    let rows_affected = connection.execute(
        "UPDATE saving_goal
         SET current_amount = current_amount + ?1,
             is_completed = (current_amount + ?1) >= target_amount
         WHERE id = ?2 AND user_id = ?3",
        params![amount, id, user_id.as_i64()],
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingGoal);
    }

    get_goal(user_id, id, connection)
}

/// Delete a saving goal owned by `user_id`.
///
/// # Errors
/// Returns [Error::DeleteMissingGoal] if the user has no goal with `id`.
pub fn delete_goal(user_id: UserID, id: GoalId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM saving_goal WHERE id = ?1 AND user_id = ?2",
        (id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingGoal);
    }

    Ok(())
}

fn map_goal_row(row: &Row) -> Result<SavingGoal, rusqlite::Error> {
    Ok(SavingGoal {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        title: row.get(2)?,
        target_amount: row.get(3)?,
        current_amount: row.get(4)?,
        deadline: row.get(5)?,
        icon: row.get(6)?,
        color: row.get(7)?,
        is_completed: row.get(8)?,
        created_at: row.get(9)?,
    })
}

#[cfg(test)]
mod goal_query_tests {
    use time::macros::date;

    use crate::{
        Error,
        test_utils::{create_test_user, get_test_connection},
    };

    use super::{
        DEFAULT_GOAL_COLOR, DEFAULT_GOAL_ICON, GoalFields, create_goal, delete_goal, get_goal,
        get_goals, top_up_goal, update_goal,
    };

    fn fields(title: &str, target_amount: f64, current_amount: f64) -> GoalFields {
        GoalFields {
            title: title.to_owned(),
            target_amount,
            current_amount,
            deadline: Some(date!(2025 - 12 - 31)),
            icon: String::new(),
            color: String::new(),
        }
    }

    #[test]
    fn create_applies_defaults() {
        let connection = get_test_connection();
        let user = create_test_user("siti@example.com", &connection);

        let goal = create_goal(user.id, fields(" Laptop ", 10_000_000.0, 0.0), &connection)
            .unwrap();

        assert_eq!(goal.title, "Laptop");
        assert_eq!(goal.icon, DEFAULT_GOAL_ICON);
        assert_eq!(goal.color, DEFAULT_GOAL_COLOR);
        assert!(!goal.is_completed);
        assert_eq!(goal.deadline, Some(date!(2025 - 12 - 31)));
        assert_eq!(get_goal(user.id, goal.id, &connection), Ok(goal));
    }

    #[test]
    fn create_validates_fields() {
        let connection = get_test_connection();
        let user = create_test_user("siti@example.com", &connection);

        assert_eq!(
            create_goal(user.id, fields("  ", 10.0, 0.0), &connection),
            Err(Error::EmptyTitle)
        );
        assert_eq!(
            create_goal(user.id, fields("Laptop", 0.0, 0.0), &connection),
            Err(Error::InvalidAmount(0.0))
        );
        assert_eq!(
            create_goal(user.id, fields("Laptop", 10.0, -1.0), &connection),
            Err(Error::InvalidAmount(-1.0))
        );
    }

    #[test]
    fn top_up_completes_goal_at_target() {
        let connection = get_test_connection();
        let user = create_test_user("siti@example.com", &connection);
        let goal = create_goal(user.id, fields("Liburan", 1_000.0, 600.0), &connection).unwrap();

        let partial = top_up_goal(user.id, goal.id, 300.0, &connection).unwrap();
        let complete = top_up_goal(user.id, goal.id, 100.0, &connection).unwrap();

        assert_eq!(partial.current_amount, 900.0);
        assert!(!partial.is_completed);
        assert_eq!(complete.current_amount, 1_000.0);
        assert!(complete.is_completed);
    }

    #[test]
    fn top_up_rejects_non_positive_amount() {
        let connection = get_test_connection();
        let user = create_test_user("siti@example.com", &connection);
        let goal = create_goal(user.id, fields("Liburan", 1_000.0, 0.0), &connection).unwrap();

        assert_eq!(
            top_up_goal(user.id, goal.id, 0.0, &connection),
            Err(Error::InvalidAmount(0.0))
        );
    }

    #[test]
    fn update_derives_completion() {
        let connection = get_test_connection();
        let user = create_test_user("siti@example.com", &connection);
        let goal = create_goal(user.id, fields("Liburan", 1_000.0, 0.0), &connection).unwrap();

        let updated =
            update_goal(user.id, goal.id, fields("Liburan", 500.0, 600.0), &connection).unwrap();
        let lowered =
            update_goal(user.id, goal.id, fields("Liburan", 800.0, 600.0), &connection).unwrap();

        assert!(updated.is_completed);
        assert!(!lowered.is_completed);
    }

    #[test]
    fn missing_goal_errors() {
        let connection = get_test_connection();
        let user = create_test_user("siti@example.com", &connection);

        assert_eq!(
            update_goal(user.id, 9, fields("Liburan", 1.0, 0.0), &connection),
            Err(Error::UpdateMissingGoal)
        );
        assert_eq!(
            top_up_goal(user.id, 9, 1.0, &connection),
            Err(Error::UpdateMissingGoal)
        );
        assert_eq!(delete_goal(user.id, 9, &connection), Err(Error::DeleteMissingGoal));
    }

    #[test]
    fn goals_are_listed_newest_first_per_user() {
        let connection = get_test_connection();
        let user = create_test_user("siti@example.com", &connection);
        let other = create_test_user("budi@example.com", &connection);
        let first = create_goal(user.id, fields("A", 1.0, 0.0), &connection).unwrap();
        let second = create_goal(user.id, fields("B", 1.0, 0.0), &connection).unwrap();
        create_goal(other.id, fields("C", 1.0, 0.0), &connection).unwrap();

        let ids: Vec<_> = get_goals(user.id, &connection)
            .unwrap()
            .into_iter()
            .map(|goal| goal.id)
            .collect();

        assert_eq!(ids, vec![second.id, first.id]);
    }
}
