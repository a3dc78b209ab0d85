use crate::config::LiveConfig;
use crate::error::AppResult;
use crate::live::channel::{LiveEvent, LiveHub};
use crate::live::clock::Clock;
use crate::live::registry::DrawRegistry;
use crate::live::store::{DrawStore, PoolSchedule};
use crate::live::window::{LiveWindow, compute_window};
use crate::models::LiveMeta;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// 直播元数据发布器。
/// 时刻表或直播状态一变就向该池的订阅端推送 `liveMeta`；
/// 开奖刚结束 (或直播态回落) 时附带结果展示截止时刻，并在展示期满后
/// 重发一次，让订阅端回到倒计时视图。
#[derive(Clone)]
pub struct MetaPublisher {
    store: Arc<dyn DrawStore>,
    hub: LiveHub,
    registry: DrawRegistry,
    clock: Arc<dyn Clock>,
    live: LiveConfig,
    /// 上次发布的直播态，用于识别 true -> false 回落
    prev_live: Arc<Mutex<HashMap<String, bool>>>,
    /// 每池至多一个待触发的展示期满重发
    expiry_cancels: Arc<Mutex<HashMap<String, Arc<Notify>>>>,
}

impl MetaPublisher {
    pub fn new(
        store: Arc<dyn DrawStore>,
        hub: LiveHub,
        registry: DrawRegistry,
        clock: Arc<dyn Clock>,
        live: LiveConfig,
    ) -> Self {
        Self {
            store,
            hub,
            registry,
            clock,
            live,
            prev_live: Arc::new(Mutex::new(HashMap::new())),
            expiry_cancels: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// 即时计算当前元数据，不发布 (SSE 接入快照用)
    pub async fn current_meta(&self, city: &str, schedule: Option<&PoolSchedule>) -> LiveMeta {
        self.compute(city, schedule).await.unwrap_or_default()
    }

    async fn compute(&self, city: &str, schedule: Option<&PoolSchedule>) -> AppResult<LiveMeta> {
        let fetched;
        let schedule = match schedule {
            Some(s) => Some(s),
            None => {
                fetched = self.store.find_schedule(city).await?;
                fetched.as_ref()
            }
        };

        let now = self.clock.now_utc();
        let window = schedule
            .map(|s| compute_window(&s.close_time, &s.draw_time, now, self.live.offset()))
            .unwrap_or_else(LiveWindow::empty);

        Ok(LiveMeta {
            // 手动触发的直播可能落在窗口之外，注册表有条目就算在播
            is_live: window.is_live || self.registry.has(city),
            next_close: window.next_close,
            next_draw: window.next_draw,
            result_expires_at: None,
        })
    }

    /// 发布该池的直播元数据。
    /// `schedule` 传入时跳过一次冗余读库；`draw_just_ended` 由收官步骤置位。
    /// 读库失败不抛出，降级为 is_live=false 的兜底推送。
    pub async fn publish_live_meta(
        &self,
        city: &str,
        schedule: Option<&PoolSchedule>,
        draw_just_ended: bool,
    ) {
        let mut meta = match self.compute(city, schedule).await {
            Ok(meta) => meta,
            Err(e) => {
                log::error!("Failed to compute live meta for {city}: {e:?}");
                self.hub.publish(
                    city,
                    LiveEvent::Meta {
                        city: city.to_string(),
                        meta: LiveMeta::default(),
                    },
                );
                return;
            }
        };

        let fell = {
            let mut prev = self.prev_live.lock().unwrap();
            let was = prev.insert(city.to_string(), meta.is_live).unwrap_or(false);
            was && !meta.is_live
        };

        if draw_just_ended || fell {
            let display = chrono::Duration::from_std(self.live.display_period())
                .unwrap_or_else(|_| chrono::Duration::zero());
            meta.result_expires_at = Some(self.clock.now_utc() + display);
            self.schedule_expiry_republish(city);
        }

        self.hub.publish(
            city,
            LiveEvent::Meta {
                city: city.to_string(),
                meta,
            },
        );
    }

    /// 展示期满后一次性重发；同池已有待触发的先取消
    fn schedule_expiry_republish(&self, city: &str) {
        let cancel = Arc::new(Notify::new());
        {
            let mut cancels = self.expiry_cancels.lock().unwrap();
            if let Some(prev) = cancels.insert(city.to_string(), cancel.clone()) {
                prev.notify_one();
            }
        }

        let this = self.clone();
        let city = city.to_string();
        let display = self.live.display_period();
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.notified() => {}
                _ = tokio::time::sleep(display) => {
                    this.expiry_cancels.lock().unwrap().remove(&city);
                    this.publish_live_meta(&city, None, false).await;
                }
            }
        });
    }

    /// 池删除时丢弃其残留状态
    pub fn forget_pool(&self, city: &str) {
        self.prev_live.lock().unwrap().remove(city);
        if let Some(cancel) = self.expiry_cancels.lock().unwrap().remove(city) {
            cancel.notify_one();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::live::clock::SystemClock;
    use crate::live::store::testing::MemStore;
    use std::time::Duration;
    use tokio::time::timeout;

    fn harness(store: MemStore, display_minutes: i64) -> (MetaPublisher, LiveHub) {
        let registry = DrawRegistry::new();
        let hub = LiveHub::new(registry.clone());
        let live = LiveConfig {
            display_minutes,
            ..LiveConfig::default()
        };
        let publisher = MetaPublisher::new(
            Arc::new(store),
            hub.clone(),
            registry,
            Arc::new(SystemClock),
            live,
        );
        (publisher, hub)
    }

    async fn next_meta(
        sub: &mut crate::live::channel::LiveSubscription,
    ) -> crate::models::LiveMeta {
        loop {
            let event = timeout(Duration::from_secs(2), sub.receiver.recv())
                .await
                .expect("meta event expected")
                .expect("channel open");
            if let LiveEvent::Meta { meta, .. } = event {
                return meta;
            }
        }
    }

    #[tokio::test]
    async fn test_draw_end_publishes_expiry_then_republishes() {
        let store = MemStore::new().with_schedule("jakarta", "07:00", "08:00");
        let (publisher, hub) = harness(store, 0);
        let mut sub = hub.subscribe("jakarta");

        publisher.publish_live_meta("jakarta", None, true).await;

        let first = next_meta(&mut sub).await;
        assert!(first.result_expires_at.is_some());

        // 展示期为零，期满重发立即到达且不再带截止时刻
        let second = next_meta(&mut sub).await;
        assert!(second.result_expires_at.is_none());
    }

    #[tokio::test]
    async fn test_store_failure_degrades_to_idle_meta() {
        let store = MemStore::new();
        store.fail.store(true, std::sync::atomic::Ordering::SeqCst);
        let (publisher, hub) = harness(store, 10);
        let mut sub = hub.subscribe("jakarta");

        publisher.publish_live_meta("jakarta", None, false).await;

        let meta = next_meta(&mut sub).await;
        assert!(!meta.is_live);
        assert!(meta.next_draw.is_none());
    }

    #[tokio::test]
    async fn test_missing_schedule_means_never_live() {
        let (publisher, hub) = harness(MemStore::new(), 10);
        let mut sub = hub.subscribe("bali");

        publisher.publish_live_meta("bali", None, false).await;

        let meta = next_meta(&mut sub).await;
        assert!(!meta.is_live);
        assert!(meta.next_close.is_none());
    }
}
