use crate::entities::schedule_entity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 时刻表响应
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleResponse {
    pub city: String,
    pub close_time: String,
    pub draw_time: String,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<schedule_entity::Model> for ScheduleResponse {
    fn from(m: schedule_entity::Model) -> Self {
        ScheduleResponse {
            city: m.city,
            close_time: m.close_time,
            draw_time: m.draw_time,
            updated_at: m.updated_at,
        }
    }
}

/// 新建时刻表请求
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateScheduleRequest {
    pub city: String,
    pub close_time: String,
    pub draw_time: String,
}

/// 更新时刻表请求 (至少提供一个字段)
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateScheduleRequest {
    pub close_time: Option<String>,
    pub draw_time: Option<String>,
}
