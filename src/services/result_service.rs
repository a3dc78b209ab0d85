use crate::config::LiveConfig;
use crate::database::DbPool;
use crate::entities::{lottery_result_entity, override_entity, pool_entity, schedule_entity};
use crate::error::{AppError, AppResult};
use crate::live::{Clock, LiveEvent, LiveHub, compute_window, draw_date_of, parse_prize_digits};
use crate::models::{OverrideLogResponse, OverrideResultRequest, ResultResponse};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct ResultService {
    pool: DbPool,
    hub: LiveHub,
    clock: Arc<dyn Clock>,
    live: LiveConfig,
}

impl ResultService {
    pub fn new(pool: DbPool, hub: LiveHub, clock: Arc<dyn Clock>, live: LiveConfig) -> Self {
        Self {
            pool,
            hub,
            clock,
            live,
        }
    }

    /// 某池最新结果，附带即时推导的下一窗口
    pub async fn latest_by_city(&self, city: &str) -> AppResult<ResultResponse> {
        let result = lottery_result_entity::Entity::find()
            .filter(lottery_result_entity::Column::City.eq(city))
            .order_by_desc(lottery_result_entity::Column::DrawDate)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("result missing: {city}")))?;

        let mut response: ResultResponse = result.into();
        self.attach_window(&mut response).await?;
        Ok(response)
    }

    /// 多池最新结果；cities 为空时返回全部池
    pub async fn latest_many(&self, cities: Option<Vec<String>>) -> AppResult<Vec<ResultResponse>> {
        let cities = match cities {
            Some(cities) if !cities.is_empty() => cities,
            _ => pool_entity::Entity::find()
                .order_by_asc(pool_entity::Column::City)
                .all(&self.pool)
                .await?
                .into_iter()
                .map(|p| p.city)
                .collect(),
        };

        let mut responses = Vec::with_capacity(cities.len());
        for city in cities {
            let latest = lottery_result_entity::Entity::find()
                .filter(lottery_result_entity::Column::City.eq(city.as_str()))
                .order_by_desc(lottery_result_entity::Column::DrawDate)
                .one(&self.pool)
                .await?;
            if let Some(result) = latest {
                let mut response: ResultResponse = result.into();
                self.attach_window(&mut response).await?;
                responses.push(response);
            }
        }
        Ok(responses)
    }

    /// 全部历史结果，开奖日倒序
    pub async fn list_history(&self) -> AppResult<Vec<ResultResponse>> {
        let rows = lottery_result_entity::Entity::find()
            .order_by_desc(lottery_result_entity::Column::DrawDate)
            .order_by_asc(lottery_result_entity::Column::City)
            .all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// 管理员改号：结果 upsert + 追加改号流水 + 推送 resultUpdated。
    /// 流水是直播揭示数字的事实来源，号码格式在这里把关。
    pub async fn override_results(
        &self,
        city: &str,
        request: OverrideResultRequest,
        admin_username: &str,
    ) -> AppResult<ResultResponse> {
        let joined = format!(
            "{},{},{}",
            request.first_prize, request.second_prize, request.third_prize
        );
        parse_prize_digits(&joined, self.live.digit_count)?;

        let draw_date = request
            .draw_date
            .unwrap_or_else(|| draw_date_of(self.clock.now_utc(), self.live.offset()));

        // 改号前的旧号码快照
        let existing = lottery_result_entity::Entity::find()
            .filter(lottery_result_entity::Column::City.eq(city))
            .filter(lottery_result_entity::Column::DrawDate.eq(draw_date))
            .one(&self.pool)
            .await?;
        let old_numbers = existing.as_ref().map(|m| {
            format!("{},{},{}", m.first_prize, m.second_prize, m.third_prize)
        });

        let model = match existing {
            Some(model) => {
                let mut am = model.into_active_model();
                am.first_prize = Set(request.first_prize.clone());
                am.second_prize = Set(request.second_prize.clone());
                am.third_prize = Set(request.third_prize.clone());
                am.fetched_at = Set(Some(Utc::now()));
                am.update(&self.pool).await?
            }
            None => {
                lottery_result_entity::ActiveModel {
                    city: Set(city.to_string()),
                    draw_date: Set(draw_date),
                    first_prize: Set(request.first_prize.clone()),
                    second_prize: Set(request.second_prize.clone()),
                    third_prize: Set(request.third_prize.clone()),
                    fetched_at: Set(Some(Utc::now())),
                    ..Default::default()
                }
                .insert(&self.pool)
                .await?
            }
        };

        override_entity::ActiveModel {
            city: Set(city.to_string()),
            draw_date: Set(draw_date),
            old_numbers: Set(old_numbers),
            new_numbers: Set(joined),
            admin_username: Set(admin_username.to_string()),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;

        self.hub.publish(
            city,
            LiveEvent::ResultUpdated {
                city: city.to_string(),
            },
        );
        log::info!("Results overridden for {city} ({draw_date}) by {admin_username}");

        Ok(model.into())
    }

    pub async fn list_overrides(&self, limit: u64) -> AppResult<Vec<OverrideLogResponse>> {
        let rows = override_entity::Entity::find()
            .order_by_desc(override_entity::Column::CreatedAt)
            .order_by_desc(override_entity::Column::Id)
            .limit(limit)
            .all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn attach_window(&self, response: &mut ResultResponse) -> AppResult<()> {
        let schedule = schedule_entity::Entity::find_by_id(response.city.clone())
            .one(&self.pool)
            .await?;
        if let Some(schedule) = schedule {
            let window = compute_window(
                &schedule.close_time,
                &schedule.draw_time,
                self.clock.now_utc(),
                self.live.offset(),
            );
            response.next_close = window.next_close;
            response.next_draw = window.next_draw;
        }
        Ok(())
    }
}
