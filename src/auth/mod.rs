//! User accounts and cookie based authentication.

mod cookie;
mod log_in;
mod log_out;
mod middleware;
mod password;
mod profile;
mod register_user;
mod token;
mod user;

pub use cookie::{DEFAULT_COOKIE_DURATION, invalidate_auth_cookie, set_auth_cookie};
pub use log_in::post_log_in;
pub use log_out::get_log_out;
pub use middleware::auth_guard;
pub use password::{PasswordHash, ValidatedPassword};
pub use profile::{change_password, get_profile, update_profile};
pub use register_user::register_user;
pub(super) use token::Token;
pub use user::{
    User, UserID, UserProfile, create_user, create_user_table, get_all_user_ids, get_user_by_email,
    get_user_by_id, update_password, update_user_name,
};

#[cfg(test)]
pub(crate) use cookie::COOKIE_TOKEN;
