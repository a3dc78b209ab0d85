use crate::entities::{lottery_result_entity, override_entity};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 开奖结果响应，公共端附带即时推导的下一窗口
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResultResponse {
    pub city: String,
    pub draw_date: NaiveDate,
    pub first_prize: String,
    pub second_prize: String,
    pub third_prize: String,
    pub fetched_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_close: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_draw: Option<DateTime<Utc>>,
}

impl From<lottery_result_entity::Model> for ResultResponse {
    fn from(m: lottery_result_entity::Model) -> Self {
        ResultResponse {
            city: m.city,
            draw_date: m.draw_date,
            first_prize: m.first_prize,
            second_prize: m.second_prize,
            third_prize: m.third_prize,
            fetched_at: m.fetched_at,
            next_close: None,
            next_draw: None,
        }
    }
}

/// 管理员改号请求
/// draw_date 缺省为区域时区下的今天
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OverrideResultRequest {
    pub draw_date: Option<NaiveDate>,
    pub first_prize: String,
    pub second_prize: String,
    pub third_prize: String,
}

/// 改号流水响应
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OverrideLogResponse {
    pub id: i64,
    pub city: String,
    pub draw_date: NaiveDate,
    pub old_numbers: Option<String>,
    pub new_numbers: String,
    pub admin_username: String,
    pub created_at: DateTime<Utc>,
}

impl From<override_entity::Model> for OverrideLogResponse {
    fn from(m: override_entity::Model) -> Self {
        OverrideLogResponse {
            id: m.id,
            city: m.city,
            draw_date: m.draw_date,
            old_numbers: m.old_numbers,
            new_numbers: m.new_numbers,
            admin_username: m.admin_username,
            created_at: m.created_at,
        }
    }
}

/// 批量最新结果查询参数
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct LatestManyQuery {
    /// 逗号分隔的城市列表；为空时返回全部池
    pub cities: Option<String>,
}

/// 改号流水查询参数
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct OverrideLogQuery {
    /// 返回条数 (默认 10)
    pub limit: Option<u64>,
}

/// 后台统计响应
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub total_cities: u64,
    pub today_results: u64,
    pub fetch_errors: u64,
    pub last_override_time: Option<DateTime<Utc>>,
}
