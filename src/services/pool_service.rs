use crate::config::LiveConfig;
use crate::database::DbPool;
use crate::entities::{
    fetch_error_entity, lottery_result_entity, override_entity, pool_entity, schedule_entity,
};
use crate::error::{AppError, AppResult};
use crate::live::{Clock, LiveDrawService, LiveHub, MetaPublisher, compute_window};
use crate::models::{DeletePoolResponse, PoolSummary};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone)]
pub struct PoolService {
    pool: DbPool,
    hub: LiveHub,
    sequencer: LiveDrawService,
    meta: MetaPublisher,
    clock: Arc<dyn Clock>,
    live: LiveConfig,
}

impl PoolService {
    pub fn new(
        pool: DbPool,
        hub: LiveHub,
        sequencer: LiveDrawService,
        meta: MetaPublisher,
        clock: Arc<dyn Clock>,
        live: LiveConfig,
    ) -> Self {
        Self {
            pool,
            hub,
            sequencer,
            meta,
            clock,
            live,
        }
    }

    /// 公共池列表：每个池附带即时推导的窗口状态
    pub async fn list_pools(&self) -> AppResult<Vec<PoolSummary>> {
        let pools = pool_entity::Entity::find()
            .order_by_asc(pool_entity::Column::City)
            .all(&self.pool)
            .await?;

        let schedules: HashMap<String, schedule_entity::Model> = schedule_entity::Entity::find()
            .all(&self.pool)
            .await?
            .into_iter()
            .map(|s| (s.city.clone(), s))
            .collect();

        let now = self.clock.now_utc();
        let offset = self.live.offset();
        let registry = self.sequencer.registry();

        let summaries = pools
            .into_iter()
            .map(|p| {
                let window = schedules
                    .get(&p.city)
                    .map(|s| compute_window(&s.close_time, &s.draw_time, now, offset));
                let (next_close, next_draw, window_live) = match window {
                    Some(w) => (w.next_close, w.next_draw, w.is_live),
                    None => (None, None, false),
                };
                PoolSummary {
                    is_live: window_live || registry.has(&p.city),
                    city: p.city,
                    next_close,
                    next_draw,
                }
            })
            .collect();

        Ok(summaries)
    }

    pub async fn create_pool(&self, city: &str) -> AppResult<pool_entity::Model> {
        let city = city.trim();
        if city.is_empty() {
            return Err(AppError::ValidationError("city required".to_string()));
        }

        if pool_entity::Entity::find_by_id(city.to_string())
            .one(&self.pool)
            .await?
            .is_some()
        {
            return Err(AppError::ValidationError(format!("池已存在: {city}")));
        }

        let model = pool_entity::ActiveModel {
            city: Set(city.to_string()),
            created_at: Set(Some(Utc::now())),
        }
        .insert(&self.pool)
        .await?;

        log::info!("Pool created: {city}");
        Ok(model)
    }

    /// 删除池并级联清理：改号流水、补录错误、结果、时刻表、
    /// 进行中的直播状态与广播通道
    pub async fn delete_pool(&self, city: &str) -> AppResult<DeletePoolResponse> {
        if pool_entity::Entity::find_by_id(city.to_string())
            .one(&self.pool)
            .await?
            .is_none()
        {
            return Err(AppError::NotFound(format!("pool missing: {city}")));
        }

        // 直播进行中先停播，掐掉所有待触发的计时器
        match self.sequencer.stop_draw(city).await {
            Ok(()) => log::info!("Stopped live draw while deleting pool {city}"),
            Err(AppError::NotActive(_)) => {}
            Err(e) => return Err(e),
        }

        override_entity::Entity::delete_many()
            .filter(override_entity::Column::City.eq(city))
            .exec(&self.pool)
            .await?;
        fetch_error_entity::Entity::delete_many()
            .filter(fetch_error_entity::Column::City.eq(city))
            .exec(&self.pool)
            .await?;
        let results = lottery_result_entity::Entity::delete_many()
            .filter(lottery_result_entity::Column::City.eq(city))
            .exec(&self.pool)
            .await?;
        schedule_entity::Entity::delete_many()
            .filter(schedule_entity::Column::City.eq(city))
            .exec(&self.pool)
            .await?;
        pool_entity::Entity::delete_by_id(city.to_string())
            .exec(&self.pool)
            .await?;

        self.hub.drop_channel(city);
        self.meta.forget_pool(city);

        log::info!("Pool deleted: {city}");
        Ok(DeletePoolResponse {
            results_removed: results.rows_affected,
        })
    }
}
