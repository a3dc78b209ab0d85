use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 每日开/封盘时刻表，每个池唯一一份
/// close_time / draw_time 为 "HH:MM" 字符串，按固定区域时区 (UTC+7) 解释；
/// 下一次开/封盘时刻从不落库，总是相对当前时间即时推导
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "schedules")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub city: String,
    pub close_time: String,
    pub draw_time: String,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
