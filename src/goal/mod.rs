//! Saving goals and the progress made towards them.

mod core;
mod endpoints;
mod progress;

pub use core::{
    GoalFields, GoalId, SavingGoal, create_goal, create_goal_table, delete_goal, get_goals,
    top_up_goal, update_goal,
};
pub use endpoints::{
    create_goal_endpoint, delete_goal_endpoint, get_goals_endpoint, top_up_goal_endpoint,
    update_goal_endpoint,
};
pub use progress::{build_goal_overview, goal_progress};
