use axum::{
    http::{header::HeaderName, StatusCode},
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

use crate::auth::SessionError;
use crate::domain::ValidationError;

/// htmx follows this header with a full page navigation.
pub const HX_REDIRECT: HeaderName = HeaderName::from_static("hx-redirect");

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Internal server error: {0}")]
    Internal(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Config(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".into()),
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::Conflict("Record already exists".into())
            }
            _ => {
                tracing::error!(error = %err, "Database error");
                AppError::Internal(err.to_string())
            }
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::BadRequest(err.0)
    }
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Db(e) => e.into(),
        }
    }
}

impl From<argon2::password_hash::Error> for AppError {
    fn from(err: argon2::password_hash::Error) -> Self {
        tracing::error!(error = %err, "Password hashing failed");
        AppError::Internal("Password hashing failed".into())
    }
}

impl From<handlebars::RenderError> for AppError {
    fn from(err: handlebars::RenderError) -> Self {
        tracing::error!(error = %err, "Template rendering failed");
        AppError::Internal(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            // Details of server-side failures stay in the logs.
            AppError::Config(_) | AppError::Internal(_) => "Something went wrong".to_string(),
            AppError::NotFound(msg)
            | AppError::BadRequest(msg)
            | AppError::Conflict(msg)
            | AppError::Unauthorized(msg) => msg,
        };

        let body = Html(format!(
            r#"<div class="error" role="alert"><h2>{} {}</h2><p>{}</p><p><a href="/">Back to home</a></p></div>"#,
            status.as_u16(),
            status.canonical_reason().unwrap_or("Error"),
            handlebars::html_escape(&message),
        ));

        if status == StatusCode::UNAUTHORIZED {
            return (status, [(HX_REDIRECT, "/auth/login")], body).into_response();
        }
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_row_not_found_maps_to_404() {
        let err: AppError = sqlx::Error::RowNotFound.into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_validation_error_maps_to_400() {
        let err: AppError = ValidationError::new("Name is required").into();
        assert!(matches!(err, AppError::BadRequest(ref msg) if msg == "Name is required"));
    }

    #[tokio::test]
    async fn test_message_is_escaped() {
        let response = AppError::BadRequest("<script>alert(1)</script>".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_text(response).await;
        assert!(!body.contains("<script>"));
        assert!(body.contains("&lt;script&gt;"));
    }

    #[tokio::test]
    async fn test_internal_details_hidden() {
        let response = AppError::Internal("disk I/O error at /var/db".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_text(response).await;
        assert!(!body.contains("/var/db"));
    }

    #[test]
    fn test_unauthorized_sets_hx_redirect() {
        let response = AppError::Unauthorized("Not authenticated".into()).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get("hx-redirect").unwrap(),
            "/auth/login"
        );
    }
}
