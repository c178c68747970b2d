//! Unified application error model and mapping helpers.
//! Every HTTP handler and filestore operation reports failures through `AppError`,
//! which carries a machine-readable code plus a human message and maps onto an
//! HTTP status and the `{success:false, error_code, message}` response body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use crate::filestore::git::GitError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppError {
    UserInput { code: String, message: String },
    NotFound { code: String, message: String },
    Conflict { code: String, message: String },
    Git { code: String, message: String },
    Io { code: String, message: String },
    Internal { code: String, message: String },
}

impl AppError {
    pub fn code_str(&self) -> &str {
        match self {
            AppError::UserInput { code, .. }
            | AppError::NotFound { code, .. }
            | AppError::Conflict { code, .. }
            | AppError::Git { code, .. }
            | AppError::Io { code, .. }
            | AppError::Internal { code, .. } => code.as_str(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AppError::UserInput { message, .. }
            | AppError::NotFound { message, .. }
            | AppError::Conflict { message, .. }
            | AppError::Git { message, .. }
            | AppError::Io { message, .. }
            | AppError::Internal { message, .. } => message.as_str(),
        }
    }

    pub fn user<C: Into<String>, M: Into<String>>(code: C, msg: M) -> Self { AppError::UserInput { code: code.into(), message: msg.into() } }
    pub fn not_found<C: Into<String>, M: Into<String>>(code: C, msg: M) -> Self { AppError::NotFound { code: code.into(), message: msg.into() } }
    pub fn conflict<C: Into<String>, M: Into<String>>(code: C, msg: M) -> Self { AppError::Conflict { code: code.into(), message: msg.into() } }
    pub fn git<C: Into<String>, M: Into<String>>(code: C, msg: M) -> Self { AppError::Git { code: code.into(), message: msg.into() } }
    pub fn io<C: Into<String>, M: Into<String>>(code: C, msg: M) -> Self { AppError::Io { code: code.into(), message: msg.into() } }
    pub fn internal<C: Into<String>, M: Into<String>>(code: C, msg: M) -> Self { AppError::Internal { code: code.into(), message: msg.into() } }

    /// Map to HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            AppError::UserInput { .. } => 400,
            AppError::NotFound { .. } => 404,
            AppError::Conflict { .. } => 409,
            AppError::Git { .. } => 502,
            AppError::Io { .. } => 503,
            AppError::Internal { .. } => 500,
        }
    }

    /// Error code used for per-item failures in batch responses.
    /// Validation problems keep a stable `VALIDATION_ERROR` code; everything
    /// else uses the operation-specific fallback supplied by the caller.
    pub fn batch_code(&self, fallback: &str) -> String {
        match self {
            AppError::UserInput { .. } => "VALIDATION_ERROR".to_string(),
            AppError::NotFound { .. } => "NOT_FOUND".to_string(),
            _ => fallback.to_string(),
        }
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code_str(), self.message())
    }
}

impl std::error::Error for AppError {}

pub type AppResult<T> = Result<T, AppError>;

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => AppError::not_found("not_found", err.to_string()),
            std::io::ErrorKind::AlreadyExists => AppError::conflict("already_exists", err.to_string()),
            std::io::ErrorKind::InvalidInput | std::io::ErrorKind::InvalidData => {
                AppError::internal("io_error", err.to_string())
            }
            _ => AppError::io("io_error", err.to_string()),
        }
    }
}

impl From<GitError> for AppError {
    fn from(err: GitError) -> Self {
        match &err {
            GitError::NotARepository => AppError::not_found("not_a_git_repository", err.to_string()),
            GitError::InvalidQuery(_) => AppError::user("invalid_git_query", err.to_string()),
            _ => AppError::git("git_error", err.to_string()),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::internal("internal_error", err.to_string())
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    success: bool,
    error_code: &'a str,
    message: &'a str,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!(target: "server", code = self.code_str(), "request failed: {}", self.message());
        }
        let body = ErrorBody { success: false, error_code: self.code_str(), message: self.message() };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_mapping() {
        assert_eq!(AppError::user("bad_input", "oops").http_status(), 400);
        assert_eq!(AppError::not_found("not_found", "missing").http_status(), 404);
        assert_eq!(AppError::conflict("conflict", "dup").http_status(), 409);
        assert_eq!(AppError::git("git_error", "exit 128").http_status(), 502);
        assert_eq!(AppError::io("io", "io").http_status(), 503);
        assert_eq!(AppError::internal("internal", "panic").http_status(), 500);
    }

    #[test]
    fn batch_codes() {
        assert_eq!(AppError::user("invalid_path", "x").batch_code("SAVE_ERROR"), "VALIDATION_ERROR");
        assert_eq!(AppError::not_found("not_found", "x").batch_code("SAVE_ERROR"), "NOT_FOUND");
        assert_eq!(AppError::internal("io_error", "x").batch_code("SAVE_ERROR"), "SAVE_ERROR");
    }

    #[test]
    fn io_errors_map_by_kind() {
        let e: AppError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert_eq!(e.http_status(), 404);
        let e: AppError = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope").into();
        assert_eq!(e.http_status(), 503);
        let e: AppError = std::io::Error::new(std::io::ErrorKind::AlreadyExists, "dup").into();
        assert_eq!(e.http_status(), 409);
        let e: AppError = std::io::Error::new(std::io::ErrorKind::InvalidData, "bad").into();
        assert_eq!(e.http_status(), 500);
    }

    #[test]
    fn git_errors_map_by_kind() {
        let e: AppError = GitError::NotARepository.into();
        assert_eq!(e.code_str(), "not_a_git_repository");
        let e: AppError = GitError::InvalidQuery("page".into()).into();
        assert_eq!(e.http_status(), 400);
    }

    #[test]
    fn display_includes_code() {
        let e = AppError::user("invalid_path", "bad path");
        assert_eq!(e.to_string(), "invalid_path: bad path");
    }
}
