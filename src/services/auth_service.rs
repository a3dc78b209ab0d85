use crate::config::AdminConfig;
use crate::error::{AppError, AppResult};
use crate::models::{AuthResponse, LoginRequest};
use crate::utils::{JwtService, verify_password};

/// 单管理员登录：用户名与 bcrypt 哈希来自配置，不落库
#[derive(Clone)]
pub struct AuthService {
    admin: AdminConfig,
    jwt_service: JwtService,
}

impl AuthService {
    pub fn new(admin: AdminConfig, jwt_service: JwtService) -> Self {
        Self { admin, jwt_service }
    }

    pub async fn login(&self, request: LoginRequest) -> AppResult<AuthResponse> {
        if self.admin.username.is_empty() || self.admin.password_hash.is_empty() {
            return Err(AppError::ConfigError(
                "admin credentials are not configured".to_string(),
            ));
        }

        if request.username.is_empty() || request.password.is_empty() {
            return Err(AppError::ValidationError(
                "username and password required".to_string(),
            ));
        }

        if request.username != self.admin.username {
            return Err(AppError::AuthError("Unauthorized".to_string()));
        }

        if !verify_password(&request.password, &self.admin.password_hash)? {
            return Err(AppError::AuthError("Unauthorized".to_string()));
        }

        let token = self.jwt_service.issue_token(&request.username)?;
        Ok(AuthResponse {
            token,
            expires_in: self.jwt_service.get_token_expires_in(),
        })
    }
}
