use axum::http::StatusCode;

pub mod documents;
pub mod uploads;
pub mod users;

// health check handler
pub async fn health_check() -> StatusCode {
    StatusCode::OK
}
