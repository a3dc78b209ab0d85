use crate::database::DbPool;
use crate::entities::schedule_entity;
use crate::error::{AppError, AppResult};
use crate::live::{MetaPublisher, PoolSchedule};
use crate::models::{CreateScheduleRequest, ScheduleResponse, UpdateScheduleRequest};
use crate::utils::validate_time_of_day;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait, IntoActiveModel, QueryOrder, Set};

#[derive(Clone)]
pub struct ScheduleService {
    pool: DbPool,
    meta: MetaPublisher,
}

impl ScheduleService {
    pub fn new(pool: DbPool, meta: MetaPublisher) -> Self {
        Self { pool, meta }
    }

    pub async fn list_schedules(&self) -> AppResult<Vec<ScheduleResponse>> {
        let rows = schedule_entity::Entity::find()
            .order_by_asc(schedule_entity::Column::City)
            .all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// 新建时刻表；变更立即向该池订阅端重发元数据
    pub async fn create_schedule(
        &self,
        request: CreateScheduleRequest,
    ) -> AppResult<ScheduleResponse> {
        if request.city.trim().is_empty() {
            return Err(AppError::ValidationError(
                "city, drawTime and closeTime required".to_string(),
            ));
        }
        validate_time_of_day(&request.close_time)?;
        validate_time_of_day(&request.draw_time)?;

        if schedule_entity::Entity::find_by_id(request.city.clone())
            .one(&self.pool)
            .await?
            .is_some()
        {
            return Err(AppError::ValidationError(format!(
                "时刻表已存在: {}",
                request.city
            )));
        }

        let model = schedule_entity::ActiveModel {
            city: Set(request.city.clone()),
            close_time: Set(request.close_time),
            draw_time: Set(request.draw_time),
            updated_at: Set(Some(Utc::now())),
        }
        .insert(&self.pool)
        .await?;

        self.publish_meta(&model).await;
        Ok(model.into())
    }

    pub async fn update_schedule(
        &self,
        city: &str,
        request: UpdateScheduleRequest,
    ) -> AppResult<ScheduleResponse> {
        if request.close_time.is_none() && request.draw_time.is_none() {
            return Err(AppError::ValidationError(
                "drawTime or closeTime required".to_string(),
            ));
        }

        let existing = schedule_entity::Entity::find_by_id(city.to_string())
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("schedule missing: {city}")))?;

        let mut am = existing.into_active_model();
        if let Some(close_time) = request.close_time {
            validate_time_of_day(&close_time)?;
            am.close_time = Set(close_time);
        }
        if let Some(draw_time) = request.draw_time {
            validate_time_of_day(&draw_time)?;
            am.draw_time = Set(draw_time);
        }
        am.updated_at = Set(Some(Utc::now()));

        let model = am.update(&self.pool).await?;
        self.publish_meta(&model).await;
        Ok(model.into())
    }

    pub async fn delete_schedule(&self, city: &str) -> AppResult<()> {
        let result = schedule_entity::Entity::delete_by_id(city.to_string())
            .exec(&self.pool)
            .await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound(format!("schedule missing: {city}")));
        }

        // 时刻表没了，推一份回落到空窗口的元数据
        self.meta.publish_live_meta(city, None, false).await;
        Ok(())
    }

    async fn publish_meta(&self, model: &schedule_entity::Model) {
        let schedule = PoolSchedule {
            city: model.city.clone(),
            close_time: model.close_time.clone(),
            draw_time: model.draw_time.clone(),
        };
        self.meta
            .publish_live_meta(&model.city, Some(&schedule), false)
            .await;
    }
}
