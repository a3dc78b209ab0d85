use crate::config::LiveConfig;
use crate::live::clock::Clock;
use crate::live::registry::DrawRegistry;
use crate::live::sequencer::LiveDrawService;
use crate::live::store::DrawStore;
use crate::live::window::{compute_window, draw_date_of};
use crate::utils::parse_time_of_day;
use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, TimeZone, Utc};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

/// 两条循环共用的睡眠上限：封顶重算，保证新建的时刻表能被及时纳入
const MAX_SLEEP: Duration = Duration::from_secs(300);

/// 时刻表轮询器。
/// 不做固定间隔轮询：每一轮算出全部池里最近的下一个关键时刻，
/// 睡到那一刻再干活，既不空转也基本踩点。
/// 任何读库失败都按“本轮没有时刻表”处理，记日志后由兜底间隔重试。
#[derive(Clone)]
pub struct LivePoller {
    store: Arc<dyn DrawStore>,
    registry: DrawRegistry,
    sequencer: LiveDrawService,
    clock: Arc<dyn Clock>,
    live: LiveConfig,
}

fn push_wake(slot: &mut Option<DateTime<Utc>>, candidate: DateTime<Utc>) {
    match slot {
        Some(current) if *current <= candidate => {}
        _ => *slot = Some(candidate),
    }
}

/// 兜底补录的占位号码
fn generate_placeholder_prizes(digit_count: usize) -> [String; 3] {
    let mut rng = rand::thread_rng();
    std::array::from_fn(|_| {
        (0..digit_count)
            .map(|_| rng.gen_range(0..10u8).to_string())
            .collect()
    })
}

impl LivePoller {
    pub fn new(
        store: Arc<dyn DrawStore>,
        registry: DrawRegistry,
        sequencer: LiveDrawService,
        clock: Arc<dyn Clock>,
        live: LiveConfig,
    ) -> Self {
        Self {
            store,
            registry,
            sequencer,
            clock,
            live,
        }
    }

    /// 补录检查：开奖时刻已过且当日还没有结果行的池补一行占位结果。
    /// 返回下一次应醒来的时刻 (跨池取最小的下一个开奖时刻)。
    pub async fn result_check_pass(&self) -> Option<DateTime<Utc>> {
        let schedules = match self.store.list_schedules().await {
            Ok(schedules) => schedules,
            Err(e) => {
                log::error!("Result check: failed to read schedules: {e:?}");
                return None;
            }
        };

        let offset = self.live.offset();
        let now = self.clock.now_utc();
        let mut next_wake: Option<DateTime<Utc>> = None;

        for schedule in schedules {
            let Some((hour, minute)) = parse_time_of_day(&schedule.draw_time) else {
                continue;
            };
            let local_now = now.with_timezone(&offset);
            let Some(today_local) = local_now.date_naive().and_hms_opt(hour, minute, 0) else {
                continue;
            };
            let Some(today_draw) = offset
                .from_local_datetime(&today_local)
                .single()
                .map(|dt| dt.with_timezone(&Utc))
            else {
                continue;
            };

            if now >= today_draw {
                self.materialize_result(&schedule.city, draw_date_of(now, offset))
                    .await;
                push_wake(&mut next_wake, today_draw + ChronoDuration::days(1));
            } else {
                push_wake(&mut next_wake, today_draw);
            }
        }

        next_wake
    }

    async fn materialize_result(&self, city: &str, draw_date: NaiveDate) {
        // 直播中由收官步骤写结果，兜底不插手
        if self.registry.has(city) {
            return;
        }

        match self.store.has_result(city, draw_date).await {
            Ok(true) => return,
            Ok(false) => {}
            Err(e) => {
                log::error!("Result check: lookup failed for {city}: {e:?}");
                return;
            }
        }

        let prizes = generate_placeholder_prizes(self.live.digit_count);
        if let Err(e) = self.store.upsert_result(city, draw_date, prizes).await {
            log::error!("Result check: failed to materialize result for {city}: {e:?}");
            if let Err(e2) = self.store.record_fetch_error(city, &e.to_string()).await {
                log::warn!("Result check: failed to record fetch error for {city}: {e2:?}");
            }
        } else {
            log::info!("Materialized fallback result for {city} ({draw_date})");
        }
    }

    /// 直播预热：进入 [开奖-提前量, 开奖) 且未在播的池触发 start_draw。
    /// start_draw 的失败 (没改号、号码不合规、已在播) 只记日志，循环继续。
    /// 返回下一次应醒来的时刻 (跨池取最小的预热时刻)。
    pub async fn live_start_pass(&self) -> Option<DateTime<Utc>> {
        let schedules = match self.store.list_schedules().await {
            Ok(schedules) => schedules,
            Err(e) => {
                log::error!("Live start: failed to read schedules: {e:?}");
                return None;
            }
        };

        let offset = self.live.offset();
        let now = self.clock.now_utc();
        let lead = ChronoDuration::minutes(self.live.lead_minutes);
        let mut next_wake: Option<DateTime<Utc>> = None;

        for schedule in schedules {
            let window = compute_window(&schedule.close_time, &schedule.draw_time, now, offset);
            let Some(next_draw) = window.next_draw else {
                continue;
            };
            let lead_instant = next_draw - lead;

            if now >= lead_instant {
                if !self.registry.has(&schedule.city) {
                    if let Err(e) = self.sequencer.start_draw(&schedule.city).await {
                        log::warn!("Live start skipped for {}: {e:?}", schedule.city);
                    }
                }
                // 本窗口已处理，过了开奖点再重算明天的预热时刻
                push_wake(&mut next_wake, next_draw);
            } else {
                push_wake(&mut next_wake, lead_instant);
            }
        }

        next_wake
    }

    /// 距下一次醒来的睡眠时长：至少 1 秒防忙转，无候选用兜底间隔
    pub fn sleep_until(&self, next_wake: Option<DateTime<Utc>>) -> Duration {
        let fallback = Duration::from_secs(self.live.poll_fallback_secs.max(1));
        let Some(next_wake) = next_wake else {
            return fallback.min(MAX_SLEEP);
        };
        let delta = (next_wake - self.clock.now_utc())
            .to_std()
            .unwrap_or(Duration::from_secs(1));
        delta.clamp(Duration::from_secs(1), MAX_SLEEP)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::live::channel::LiveHub;
    use crate::live::clock::testing::ManualClock;
    use crate::live::meta::MetaPublisher;
    use crate::live::store::testing::MemStore;
    use chrono::{FixedOffset, TimeZone};
    use tokio::time::timeout;

    fn jakarta() -> FixedOffset {
        FixedOffset::east_opt(7 * 3600).unwrap()
    }

    /// 参考日 2025-07-21, 区域时间 HH:MM 对应的 UTC 时刻
    fn local(hour: u32, minute: u32) -> DateTime<Utc> {
        jakarta()
            .with_ymd_and_hms(2025, 7, 21, hour, minute, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 7, 21).unwrap()
    }

    fn harness(
        store: MemStore,
        now: DateTime<Utc>,
    ) -> (LivePoller, Arc<MemStore>, DrawRegistry) {
        let store = Arc::new(store);
        let registry = DrawRegistry::new();
        let hub = LiveHub::new(registry.clone());
        let clock = ManualClock::at(now);
        let live = LiveConfig {
            digit_interval_ms: 0,
            display_minutes: 0,
            digit_count: 5,
            ..LiveConfig::default()
        };
        let meta = MetaPublisher::new(
            store.clone() as Arc<dyn DrawStore>,
            hub.clone(),
            registry.clone(),
            clock.clone(),
            live.clone(),
        );
        let sequencer = LiveDrawService::new(
            store.clone() as Arc<dyn DrawStore>,
            registry.clone(),
            hub,
            meta,
            live.clone(),
        );
        let poller = LivePoller::new(
            store.clone() as Arc<dyn DrawStore>,
            registry.clone(),
            sequencer,
            clock,
            live,
        );
        (poller, store, registry)
    }

    #[tokio::test]
    async fn test_materializes_result_after_draw_instant() {
        let store = MemStore::new().with_schedule("jakarta", "07:00", "08:00");
        let (poller, store, _registry) = harness(store, local(8, 5));

        let next_wake = poller.result_check_pass().await;

        let prizes = store.result_for("jakarta", today()).expect("materialized");
        for prize in &prizes {
            assert_eq!(prize.len(), 5);
            assert!(prize.bytes().all(|b| b.is_ascii_digit()));
        }
        // 下一次醒来是明天的开奖时刻
        assert_eq!(next_wake, Some(local(8, 0) + ChronoDuration::days(1)));
    }

    #[tokio::test]
    async fn test_existing_result_not_overwritten() {
        let store = MemStore::new().with_schedule("jakarta", "07:00", "08:00");
        store.results.lock().unwrap().insert(
            ("jakarta".to_string(), today()),
            ["11111".into(), "22222".into(), "33333".into()],
        );
        let (poller, store, _registry) = harness(store, local(8, 5));

        poller.result_check_pass().await;

        assert_eq!(
            store.result_for("jakarta", today()).unwrap(),
            ["11111".to_string(), "22222".into(), "33333".into()]
        );
    }

    #[tokio::test]
    async fn test_no_materialization_while_draw_active() {
        let store = MemStore::new().with_schedule("jakarta", "07:00", "08:00");
        let (poller, store, registry) = harness(store, local(8, 5));
        registry.insert_empty("jakarta");

        poller.result_check_pass().await;

        assert!(store.result_for("jakarta", today()).is_none());
    }

    #[tokio::test]
    async fn test_before_draw_waits_for_draw_instant() {
        let store = MemStore::new().with_schedule("jakarta", "07:00", "08:00");
        let (poller, store, _registry) = harness(store, local(6, 0));

        let next_wake = poller.result_check_pass().await;

        assert!(store.result_for("jakarta", today()).is_none());
        assert_eq!(next_wake, Some(local(8, 0)));
    }

    #[tokio::test]
    async fn test_live_start_triggers_inside_lead_window() {
        let store = MemStore::new()
            .with_schedule("jakarta", "07:00", "08:00")
            .with_override("jakarta", today(), "12345,23456,34567");
        let (poller, store, _registry) = harness(store, local(7, 56));

        let next_wake = poller.live_start_pass().await;
        assert_eq!(next_wake, Some(local(8, 0)));

        // 零间隔下整场直播瞬间走完，结果已落库
        timeout(Duration::from_secs(2), async {
            loop {
                if store.result_for("jakarta", today()).is_some() {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("draw should complete and persist");
    }

    #[tokio::test]
    async fn test_live_start_outside_lead_window_waits() {
        let store = MemStore::new()
            .with_schedule("jakarta", "07:00", "08:00")
            .with_override("jakarta", today(), "12345,23456,34567");
        let (poller, _store, registry) = harness(store, local(7, 40));

        let next_wake = poller.live_start_pass().await;

        assert!(!registry.has("jakarta"));
        assert_eq!(next_wake, Some(local(7, 55)));
    }

    #[tokio::test]
    async fn test_live_start_failure_does_not_stop_pass() {
        // 第一个池没有改号提交，第二个池正常
        let store = MemStore::new()
            .with_schedule("aceh", "07:00", "08:00")
            .with_schedule("jakarta", "07:00", "08:00")
            .with_override("jakarta", today(), "12345,23456,34567");
        let (poller, store, _registry) = harness(store, local(7, 56));

        poller.live_start_pass().await;

        timeout(Duration::from_secs(2), async {
            loop {
                if store.result_for("jakarta", today()).is_some() {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("second pool should still draw");
        assert!(store.result_for("aceh", today()).is_none());
    }

    #[tokio::test]
    async fn test_store_failure_yields_fallback_sleep() {
        let store = MemStore::new();
        store.fail.store(true, std::sync::atomic::Ordering::SeqCst);
        let (poller, _store, _registry) = harness(store, local(6, 0));

        let next_wake = poller.result_check_pass().await;
        assert!(next_wake.is_none());
        assert_eq!(poller.sleep_until(next_wake), Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_sleep_until_clamps() {
        let (poller, _store, _registry) = harness(MemStore::new(), local(6, 0));

        // 过去的时刻至少睡 1 秒
        assert_eq!(
            poller.sleep_until(Some(local(5, 0))),
            Duration::from_secs(1)
        );
        // 远未来封顶
        assert_eq!(
            poller.sleep_until(Some(local(23, 0))),
            MAX_SLEEP
        );
    }
}
