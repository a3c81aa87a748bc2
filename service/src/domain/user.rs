use doctrack_common::{Role, Username};
use serde::Serialize;

use crate::domain::document::lifecycle::UserId;

/// A staff account without its credentials
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub full_name: String,
    pub position: Option<String>,
    pub role: Role,
    pub avatar_path: Option<String>,
}

/// What authentication needs to know about an account
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: Username,
    pub password_hash: String,
    pub full_name: String,
    pub position: Option<String>,
    pub role: Role,
}

/// Profile changes. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub full_name: Option<String>,
    pub position: Option<String>,
    pub role: Option<Role>,
    pub password_hash: Option<String>,
}

/// Entry of the handler picker
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HandlerChoice {
    pub id: i64,
    pub full_name: String,
}
