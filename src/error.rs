use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sea_orm::DbErr),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Auth error: {0}")]
    AuthError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Live draw already in progress for {0}")]
    AlreadyActive(String),

    #[error("No live draw in progress for {0}")]
    NotActive(String),

    #[error("No committed override for {0}")]
    OverrideMissing(String),

    #[error("Invalid prize digits: {0}")]
    InvalidDigits(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("JSON serialization/deserialization error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),
}

/// 连接层数据库错误视为“存储不可达”，对外映射为 503
fn is_store_unavailable(err: &sea_orm::DbErr) -> bool {
    matches!(
        err,
        sea_orm::DbErr::Conn(_) | sea_orm::DbErr::ConnectionAcquire(_)
    )
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let (status_code, error_code, message) = match self {
            AppError::ValidationError(msg) => {
                log::warn!("Validation error: {msg}");
                (
                    actix_web::http::StatusCode::BAD_REQUEST,
                    "VALIDATION_ERROR",
                    msg.clone(),
                )
            }
            AppError::AuthError(msg) => {
                log::warn!("Authentication error: {msg}");
                (
                    actix_web::http::StatusCode::UNAUTHORIZED,
                    "AUTH_ERROR",
                    msg.clone(),
                )
            }
            AppError::NotFound(msg) => (
                actix_web::http::StatusCode::NOT_FOUND,
                "NOT_FOUND",
                msg.clone(),
            ),
            AppError::AlreadyActive(city) => (
                actix_web::http::StatusCode::CONFLICT,
                "LIVE_DRAW_ACTIVE",
                format!("live draw already in progress for {city}"),
            ),
            AppError::NotActive(city) => (
                actix_web::http::StatusCode::NOT_FOUND,
                "LIVE_DRAW_NOT_ACTIVE",
                format!("no live draw in progress for {city}"),
            ),
            AppError::OverrideMissing(city) => (
                actix_web::http::StatusCode::BAD_REQUEST,
                "OVERRIDE_MISSING",
                format!("no committed numbers for {city}, override first"),
            ),
            AppError::InvalidDigits(msg) => (
                actix_web::http::StatusCode::BAD_REQUEST,
                "INVALID_DIGITS",
                msg.clone(),
            ),
            AppError::DatabaseError(err) if is_store_unavailable(err) => {
                log::error!("Database unavailable: {err}");
                (
                    actix_web::http::StatusCode::SERVICE_UNAVAILABLE,
                    "STORE_UNAVAILABLE",
                    "database unavailable".to_string(),
                )
            }
            AppError::DatabaseError(err) => {
                log::error!("Database error: {err}");
                (
                    actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "Database error".to_string(),
                )
            }
            _ => {
                log::error!("Internal error: {self}");
                (
                    actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Internal server error".to_string(),
                )
            }
        };

        HttpResponse::build(status_code).json(json!({
            "success": false,
            "error": {
                "code": error_code,
                "message": message
            }
        }))
    }
}
