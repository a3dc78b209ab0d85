use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 管理员改号流水 (仅追加)
/// 说明:
/// - new_numbers 形如 "12345,23456,34567"，三个奖级逗号分隔
/// - 直播开奖以该池最近一条记录作为揭示数字的事实来源
/// - draw_date 标记这组号码面向的开奖日
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "overrides")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub city: String,
    pub draw_date: NaiveDate,
    /// 改号前的旧号码快照 (首次写入时为空)
    pub old_numbers: Option<String>,
    pub new_numbers: String,
    pub admin_username: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
