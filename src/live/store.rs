use crate::database::DbPool;
use crate::entities::{lottery_result_entity, override_entity, schedule_entity};
use crate::error::AppResult;
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter, QueryOrder, Set,
};

/// 轮询器/定序器读取的一行时刻表
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolSchedule {
    pub city: String,
    pub close_time: String,
    pub draw_time: String,
}

impl From<schedule_entity::Model> for PoolSchedule {
    fn from(m: schedule_entity::Model) -> Self {
        PoolSchedule {
            city: m.city,
            close_time: m.close_time,
            draw_time: m.draw_time,
        }
    }
}

/// 该池最近一次提交的号码，直播揭示的事实来源
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommittedOverride {
    pub draw_date: NaiveDate,
    pub new_numbers: String,
}

/// 核心所需的持久化契约；与具体存储解耦，测试注入内存实现
#[async_trait]
pub trait DrawStore: Send + Sync {
    async fn list_schedules(&self) -> AppResult<Vec<PoolSchedule>>;

    async fn find_schedule(&self, city: &str) -> AppResult<Option<PoolSchedule>>;

    async fn latest_override(&self, city: &str) -> AppResult<Option<CommittedOverride>>;

    async fn has_result(&self, city: &str, draw_date: NaiveDate) -> AppResult<bool>;

    /// (city, draw_date) 维度 upsert 三个奖级的结果串
    async fn upsert_result(
        &self,
        city: &str,
        draw_date: NaiveDate,
        prizes: [String; 3],
    ) -> AppResult<()>;

    async fn record_fetch_error(&self, city: &str, message: &str) -> AppResult<()>;
}

/// sea-orm 落地实现
#[derive(Clone)]
pub struct DbStore {
    pool: DbPool,
}

impl DbStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DrawStore for DbStore {
    async fn list_schedules(&self) -> AppResult<Vec<PoolSchedule>> {
        let rows = schedule_entity::Entity::find()
            .order_by_asc(schedule_entity::Column::City)
            .all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_schedule(&self, city: &str) -> AppResult<Option<PoolSchedule>> {
        let row = schedule_entity::Entity::find_by_id(city.to_string())
            .one(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    async fn latest_override(&self, city: &str) -> AppResult<Option<CommittedOverride>> {
        let row = override_entity::Entity::find()
            .filter(override_entity::Column::City.eq(city))
            .order_by_desc(override_entity::Column::CreatedAt)
            .order_by_desc(override_entity::Column::Id)
            .one(&self.pool)
            .await?;
        Ok(row.map(|m| CommittedOverride {
            draw_date: m.draw_date,
            new_numbers: m.new_numbers,
        }))
    }

    async fn has_result(&self, city: &str, draw_date: NaiveDate) -> AppResult<bool> {
        let row = lottery_result_entity::Entity::find()
            .filter(lottery_result_entity::Column::City.eq(city))
            .filter(lottery_result_entity::Column::DrawDate.eq(draw_date))
            .one(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    async fn upsert_result(
        &self,
        city: &str,
        draw_date: NaiveDate,
        prizes: [String; 3],
    ) -> AppResult<()> {
        let [first, second, third] = prizes;

        let existing = lottery_result_entity::Entity::find()
            .filter(lottery_result_entity::Column::City.eq(city))
            .filter(lottery_result_entity::Column::DrawDate.eq(draw_date))
            .one(&self.pool)
            .await?;

        match existing {
            Some(model) => {
                let mut am = model.into_active_model();
                am.first_prize = Set(first);
                am.second_prize = Set(second);
                am.third_prize = Set(third);
                am.fetched_at = Set(Some(Utc::now()));
                am.update(&self.pool).await?;
            }
            None => {
                lottery_result_entity::ActiveModel {
                    city: Set(city.to_string()),
                    draw_date: Set(draw_date),
                    first_prize: Set(first),
                    second_prize: Set(second),
                    third_prize: Set(third),
                    fetched_at: Set(Some(Utc::now())),
                    ..Default::default()
                }
                .insert(&self.pool)
                .await?;
            }
        }

        Ok(())
    }

    async fn record_fetch_error(&self, city: &str, message: &str) -> AppResult<()> {
        crate::entities::fetch_error_entity::ActiveModel {
            city: Set(city.to_string()),
            message: Set(message.to_string()),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use crate::error::AppError;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// 内存版 DrawStore 测试替身
    #[derive(Default)]
    pub struct MemStore {
        pub schedules: Mutex<Vec<PoolSchedule>>,
        pub overrides: Mutex<HashMap<String, CommittedOverride>>,
        pub results: Mutex<HashMap<(String, NaiveDate), [String; 3]>>,
        pub errors: Mutex<Vec<(String, String)>>,
        /// 置位后所有读写报内部错误，模拟存储故障
        pub fail: AtomicBool,
    }

    impl MemStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_override(self, city: &str, draw_date: NaiveDate, numbers: &str) -> Self {
            self.overrides.lock().unwrap().insert(
                city.to_string(),
                CommittedOverride {
                    draw_date,
                    new_numbers: numbers.to_string(),
                },
            );
            self
        }

        pub fn with_schedule(self, city: &str, close_time: &str, draw_time: &str) -> Self {
            self.schedules.lock().unwrap().push(PoolSchedule {
                city: city.to_string(),
                close_time: close_time.to_string(),
                draw_time: draw_time.to_string(),
            });
            self
        }

        pub fn result_for(&self, city: &str, draw_date: NaiveDate) -> Option<[String; 3]> {
            self.results
                .lock()
                .unwrap()
                .get(&(city.to_string(), draw_date))
                .cloned()
        }

        fn check_fail(&self) -> AppResult<()> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(AppError::InternalError("store offline".to_string()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl DrawStore for MemStore {
        async fn list_schedules(&self) -> AppResult<Vec<PoolSchedule>> {
            self.check_fail()?;
            Ok(self.schedules.lock().unwrap().clone())
        }

        async fn find_schedule(&self, city: &str) -> AppResult<Option<PoolSchedule>> {
            self.check_fail()?;
            Ok(self
                .schedules
                .lock()
                .unwrap()
                .iter()
                .find(|s| s.city == city)
                .cloned())
        }

        async fn latest_override(&self, city: &str) -> AppResult<Option<CommittedOverride>> {
            self.check_fail()?;
            Ok(self.overrides.lock().unwrap().get(city).cloned())
        }

        async fn has_result(&self, city: &str, draw_date: NaiveDate) -> AppResult<bool> {
            self.check_fail()?;
            Ok(self
                .results
                .lock()
                .unwrap()
                .contains_key(&(city.to_string(), draw_date)))
        }

        async fn upsert_result(
            &self,
            city: &str,
            draw_date: NaiveDate,
            prizes: [String; 3],
        ) -> AppResult<()> {
            self.check_fail()?;
            self.results
                .lock()
                .unwrap()
                .insert((city.to_string(), draw_date), prizes);
            Ok(())
        }

        async fn record_fetch_error(&self, city: &str, message: &str) -> AppResult<()> {
            self.check_fail()?;
            self.errors
                .lock()
                .unwrap()
                .push((city.to_string(), message.to_string()));
            Ok(())
        }
    }
}
