use doctrack_common::Role;
use serde::{Deserialize, Serialize};

use crate::domain::user::User;
use crate::infrastructure::http::handlers::uploads::upload_url;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub full_name: String,
    pub position: Option<String>,
    pub role: Role,
    pub avatar_url: Option<String>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id.0,
            username: user.username,
            full_name: user.full_name,
            position: user.position,
            role: user.role,
            avatar_url: user.avatar_path.as_deref().map(upload_url),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    pub confirm_password: String,
    pub full_name: String,
    pub position: Option<String>,
    pub role: Option<String>,
}

/// Admin edit of any account
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateUserRequest {
    pub full_name: Option<String>,
    pub position: Option<String>,
    pub role: Option<String>,
    pub password: Option<String>,
    pub confirm_password: Option<String>,
}

/// Self-service edit, the role cannot be changed here
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub position: Option<String>,
    pub password: Option<String>,
    pub confirm_password: Option<String>,
}
