use crate::config::LiveConfig;
use crate::database::DbPool;
use crate::entities::{fetch_error_entity, lottery_result_entity, override_entity, pool_entity};
use crate::error::AppResult;
use crate::live::Clock;
use crate::models::StatsResponse;
use chrono::{DateTime, TimeZone, Utc};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};
use std::sync::Arc;

#[derive(Clone)]
pub struct StatsService {
    pool: DbPool,
    clock: Arc<dyn Clock>,
    live: LiveConfig,
}

impl StatsService {
    pub fn new(pool: DbPool, clock: Arc<dyn Clock>, live: LiveConfig) -> Self {
        Self { pool, clock, live }
    }

    /// 后台仪表盘统计
    pub async fn get_stats(&self) -> AppResult<StatsResponse> {
        let today_start = self.start_of_local_day();

        let total_cities = pool_entity::Entity::find().count(&self.pool).await?;

        let today_results = lottery_result_entity::Entity::find()
            .filter(lottery_result_entity::Column::FetchedAt.gte(today_start))
            .count(&self.pool)
            .await?;

        let fetch_errors = fetch_error_entity::Entity::find()
            .filter(fetch_error_entity::Column::CreatedAt.gte(today_start))
            .count(&self.pool)
            .await?;

        let last_override_time = override_entity::Entity::find()
            .order_by_desc(override_entity::Column::CreatedAt)
            .one(&self.pool)
            .await?
            .map(|m| m.created_at);

        Ok(StatsResponse {
            total_cities,
            today_results,
            fetch_errors,
            last_override_time,
        })
    }

    /// 区域时区下今天零点对应的 UTC 时刻
    fn start_of_local_day(&self) -> DateTime<Utc> {
        let now = self.clock.now_utc();
        let offset = self.live.offset();
        now.with_timezone(&offset)
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .and_then(|midnight| offset.from_local_datetime(&midnight).single())
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or(now)
    }
}
