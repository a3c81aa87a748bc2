//! HTTP Basic authentication against the user store.

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use doctrack_common::verify_password;

use crate::domain::AppState;
use crate::domain::repository::UserRepository;
use crate::domain::user::User;
use crate::infrastructure::http::api::ApiError;

/// The authenticated caller
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// The authenticated caller, known to be an administrator
#[derive(Debug, Clone)]
pub struct AdminUser(pub User);

impl<S: AppState> FromRequestParts<S> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let (username, password) = basic_credentials(&parts.headers).ok_or(ApiError::Unauthorized)?;

        let Some(credentials) = state.users().find_credentials(&username).await? else {
            tracing::warn!(username = %username, "login with unknown username");
            return Err(ApiError::Unauthorized);
        };

        let password_hash = credentials.password_hash;
        let valid = tokio::task::spawn_blocking(move || verify_password(&password, &password_hash))
            .await
            .map_err(|e| ApiError::InternalServerError(e.to_string()))?;

        if !valid {
            tracing::warn!(username = %username, "login with wrong password");
            return Err(ApiError::Unauthorized);
        }
        Ok(CurrentUser(credentials.user))
    }
}

impl<S: AppState> FromRequestParts<S> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        if !user.role.is_admin() {
            tracing::warn!(username = %user.username, "admin route refused");
            return Err(ApiError::Forbidden);
        }
        Ok(AdminUser(user))
    }
}

/// `(username, password)` from an `Authorization: Basic` header
fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, encoded) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn basic_credentials_are_decoded() {
        let encoded = STANDARD.encode("admin:pa:ss");
        assert_eq!(
            basic_credentials(&headers(&format!("Basic {encoded}"))),
            Some(("admin".to_string(), "pa:ss".to_string()))
        );
    }

    #[test]
    fn other_schemes_and_garbage_are_ignored() {
        assert_eq!(basic_credentials(&HeaderMap::new()), None);
        assert_eq!(basic_credentials(&headers("Bearer abc")), None);
        assert_eq!(basic_credentials(&headers("Basic !!!")), None);
        let no_colon = STANDARD.encode("admin");
        assert_eq!(basic_credentials(&headers(&format!("Basic {no_colon}"))), None);
    }
}
