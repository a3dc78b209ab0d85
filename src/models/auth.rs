use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 管理员登录请求
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// 登录成功响应
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    /// 令牌有效期 (秒)
    pub expires_in: i64,
}
