//! HTTP error responses
//!
//! Validation and authorization outcomes are handled inside the handlers
//! (form re-render, flash + redirect). What reaches [`AppError`] is a missing
//! row, a failed provider login, a malformed request or an infrastructure
//! failure.

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};

use crate::services::{
    CommentServiceError, OAuthError, PostServiceError, TagServiceError, UploadError,
    UserServiceError,
};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found")]
    NotFound,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0:#}")]
    Internal(#[from] anyhow::Error),
}

fn page(status: StatusCode, message: &str) -> Response {
    let body = format!(
        "<!DOCTYPE html><html><head><title>{code}</title></head>\
         <body><h1>{code}</h1><p>{message}</p><p><a href=\"/\">Back to the home page</a></p></body></html>",
        code = status.as_u16(),
        message = message,
    );
    (status, Html(body)).into_response()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::NotFound => page(StatusCode::NOT_FOUND, "The page you were looking for doesn't exist."),
            AppError::Unauthorized => page(StatusCode::UNAUTHORIZED, "You could not be signed in."),
            AppError::BadRequest(msg) => {
                tracing::debug!("Bad request: {}", msg);
                page(StatusCode::BAD_REQUEST, "The request could not be understood.")
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {:?}", e);
                page(StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong.")
            }
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

/// Validation errors are expected to be handled by the caller; one that
/// slips through is reported as a bad request.
fn unhandled_validation(errors: impl std::fmt::Display) -> AppError {
    AppError::BadRequest(errors.to_string())
}

impl From<PostServiceError> for AppError {
    fn from(err: PostServiceError) -> Self {
        match err {
            PostServiceError::NotFound(_) => AppError::NotFound,
            PostServiceError::ValidationError(errors) => unhandled_validation(errors),
            PostServiceError::UploadError(e) => e.into(),
            PostServiceError::InternalError(e) => AppError::Internal(e),
        }
    }
}

impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        AppError::Internal(anyhow::Error::new(err))
    }
}

impl From<TagServiceError> for AppError {
    fn from(err: TagServiceError) -> Self {
        match err {
            TagServiceError::NotFound(_) => AppError::NotFound,
            TagServiceError::ValidationError(errors) => unhandled_validation(errors),
            TagServiceError::InternalError(e) => AppError::Internal(e),
        }
    }
}

impl From<UserServiceError> for AppError {
    fn from(err: UserServiceError) -> Self {
        match err {
            UserServiceError::NotFound(_) => AppError::NotFound,
            UserServiceError::ValidationError(errors) => unhandled_validation(errors),
            UserServiceError::Forbidden(_) | UserServiceError::EmailTaken(_) => {
                AppError::Unauthorized
            }
            UserServiceError::InternalError(e) => AppError::Internal(e),
        }
    }
}

impl From<CommentServiceError> for AppError {
    fn from(err: CommentServiceError) -> Self {
        match err {
            CommentServiceError::NotFound(_) | CommentServiceError::PostNotFound(_) => {
                AppError::NotFound
            }
            CommentServiceError::ValidationError(errors) => unhandled_validation(errors),
            CommentServiceError::Forbidden { .. } => AppError::Unauthorized,
            CommentServiceError::InternalError(e) => AppError::Internal(e),
        }
    }
}

impl From<OAuthError> for AppError {
    fn from(err: OAuthError) -> Self {
        tracing::warn!("GitHub login failed: {}", err);
        AppError::Unauthorized
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Internal(anyhow::Error::new(err).context("Database transaction failed"))
    }
}

impl From<axum::extract::multipart::MultipartError> for AppError {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        AppError::BadRequest(err.body_text())
    }
}
