use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 统一错误载荷, 见 error.rs 的响应包装
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}
