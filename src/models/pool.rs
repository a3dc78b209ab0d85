use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 新建池请求
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct CreatePoolRequest {
    pub city: String,
}

/// 公共池列表投影：城市 + 即时推导的窗口状态
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PoolSummary {
    pub city: String,
    pub is_live: bool,
    pub next_close: Option<DateTime<Utc>>,
    pub next_draw: Option<DateTime<Utc>>,
}

/// 删除池响应
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DeletePoolResponse {
    /// 级联删除的结果行数
    pub results_removed: u64,
}
