use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 推送给订阅端的当前直播元数据
/// 字段随时刻表或直播状态变化即时重新计算，从不落库
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LiveMeta {
    pub is_live: bool,
    pub next_close: Option<DateTime<Utc>>,
    pub next_draw: Option<DateTime<Utc>>,
    /// 开奖结束后结果展示的截止时刻；过期后订阅端应回到倒计时视图
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_expires_at: Option<DateTime<Utc>>,
}

/// 直播启动响应
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LiveDrawStarted {
    pub city: String,
    pub message: String,
}
