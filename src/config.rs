use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub admin: AdminConfig,
    #[serde(default)]
    pub live: LiveConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub token_expires_in: i64, // seconds
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    pub username: String,
    pub password_hash: String, // bcrypt
}

/// 开奖直播相关参数（奖级数固定为 3，不做配置）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveConfig {
    /// 每位数字揭示间隔（毫秒）
    #[serde(default = "default_digit_interval_ms")]
    pub digit_interval_ms: u64,
    /// 开奖前多少分钟自动进入直播
    #[serde(default = "default_lead_minutes")]
    pub lead_minutes: i64,
    /// 开奖结束后结果展示时长（分钟）
    #[serde(default = "default_display_minutes")]
    pub display_minutes: i64,
    /// 每个奖级的数字位数
    #[serde(default = "default_digit_count")]
    pub digit_count: usize,
    /// 时刻表解释所用的固定时区偏移（小时，雅加达 +7）
    #[serde(default = "default_utc_offset_hours")]
    pub utc_offset_hours: i32,
    /// 轮询循环兜底休眠（秒）
    #[serde(default = "default_poll_fallback_secs")]
    pub poll_fallback_secs: u64,
}

fn default_digit_interval_ms() -> u64 {
    60_000
}
fn default_lead_minutes() -> i64 {
    5
}
fn default_display_minutes() -> i64 {
    10
}
fn default_digit_count() -> usize {
    5
}
fn default_utc_offset_hours() -> i32 {
    7
}
fn default_poll_fallback_secs() -> u64 {
    60
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            digit_interval_ms: default_digit_interval_ms(),
            lead_minutes: default_lead_minutes(),
            display_minutes: default_display_minutes(),
            digit_count: default_digit_count(),
            utc_offset_hours: default_utc_offset_hours(),
            poll_fallback_secs: default_poll_fallback_secs(),
        }
    }
}

impl LiveConfig {
    pub fn digit_interval(&self) -> Duration {
        Duration::from_millis(self.digit_interval_ms)
    }

    pub fn display_period(&self) -> Duration {
        Duration::from_secs((self.display_minutes.max(0) as u64) * 60)
    }

    pub fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_hours * 3600)
            .unwrap_or_else(|| FixedOffset::east_opt(0).expect("zero offset"))
    }
}

impl Config {
    pub fn from_toml() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        // 尝试读取配置文件，如果不存在则完全依赖环境变量
        let config_result = std::fs::read_to_string(&config_path);

        let config: Config = match config_result {
            Ok(config_str) => {
                toml::from_str(&config_str).map_err(|e| format!("解析配置文件失败: {e}"))?
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                fn get_env(name: &str) -> Option<String> {
                    env::var(name).ok()
                }
                fn get_env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
                    env::var(name)
                        .ok()
                        .and_then(|v| v.parse::<T>().ok())
                        .unwrap_or(default)
                }

                // 数据库 URL 在无配置文件时必须提供
                let database_url = get_env("DATABASE_URL")
                    .ok_or("缺少 DATABASE_URL 环境变量，且未找到配置文件 config.toml")?;

                Config {
                    server: ServerConfig {
                        host: get_env("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                        port: get_env_parse("SERVER_PORT", 8080u16),
                    },
                    database: DatabaseConfig {
                        url: database_url,
                        max_connections: get_env_parse("DB_MAX_CONNECTIONS", 10u32),
                    },
                    jwt: JwtConfig {
                        secret: get_env("JWT_SECRET")
                            .unwrap_or_else(|| "change-me-in-production".to_string()),
                        token_expires_in: get_env_parse("JWT_EXPIRES_IN", 86_400i64),
                    },
                    admin: AdminConfig {
                        username: get_env("ADMIN_USERNAME").unwrap_or_default(),
                        password_hash: get_env("ADMIN_PASSWORD_HASH").unwrap_or_default(),
                    },
                    live: LiveConfig {
                        digit_interval_ms: get_env_parse(
                            "LIVE_DIGIT_INTERVAL_MS",
                            default_digit_interval_ms(),
                        ),
                        lead_minutes: get_env_parse("LIVE_LEAD_MINUTES", default_lead_minutes()),
                        display_minutes: get_env_parse(
                            "LIVE_DISPLAY_MINUTES",
                            default_display_minutes(),
                        ),
                        digit_count: get_env_parse("LIVE_DIGIT_COUNT", default_digit_count()),
                        utc_offset_hours: get_env_parse(
                            "LIVE_UTC_OFFSET_HOURS",
                            default_utc_offset_hours(),
                        ),
                        poll_fallback_secs: get_env_parse(
                            "LIVE_POLL_FALLBACK_SECS",
                            default_poll_fallback_secs(),
                        ),
                    },
                }
            }
            Err(e) => return Err(Box::new(e)),
        };

        Ok(config)
    }
}
