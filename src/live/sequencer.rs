use crate::config::LiveConfig;
use crate::error::{AppError, AppResult};
use crate::live::channel::{LiveEvent, LiveHub};
use crate::live::meta::MetaPublisher;
use crate::live::registry::{DrawRegistry, PrizeTier};
use crate::live::store::DrawStore;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

/// 把 "12345,23456,34567" 解析为三个奖级的数字序列
/// 位数不符或含非数字字符一律拒绝
pub fn parse_prize_digits(numbers: &str, digit_count: usize) -> AppResult<[Vec<u8>; 3]> {
    let parts: Vec<&str> = numbers.split(',').collect();
    if parts.len() != 3 {
        return Err(AppError::InvalidDigits(format!(
            "需要逗号分隔的 3 组号码，实际 {} 组",
            parts.len()
        )));
    }

    let mut digits: [Vec<u8>; 3] = Default::default();
    for (i, part) in parts.iter().enumerate() {
        if part.len() != digit_count || !part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AppError::InvalidDigits(format!(
                "第 {} 组号码必须是 {digit_count} 位数字: {part}",
                i + 1
            )));
        }
        digits[i] = part.bytes().map(|b| b - b'0').collect();
    }
    Ok(digits)
}

/// 直播开奖定序器。
/// 每个池一条线性的定时任务链：三个奖级按序，每奖级逐位揭示，
/// 位与位之间跑一个纯展示的每秒倒计时；全部揭示后等结果展示期满收官。
/// 每池一个取消句柄，所有等待点都对它 select，停播后不会有残留计时器
/// 复活后续揭示。
#[derive(Clone)]
pub struct LiveDrawService {
    store: Arc<dyn DrawStore>,
    registry: DrawRegistry,
    hub: LiveHub,
    meta: MetaPublisher,
    live: LiveConfig,
    cancels: Arc<Mutex<HashMap<String, Arc<Notify>>>>,
}

impl LiveDrawService {
    pub fn new(
        store: Arc<dyn DrawStore>,
        registry: DrawRegistry,
        hub: LiveHub,
        meta: MetaPublisher,
        live: LiveConfig,
    ) -> Self {
        Self {
            store,
            registry,
            hub,
            meta,
            live,
            cancels: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn registry(&self) -> &DrawRegistry {
        &self.registry
    }

    /// 触发一场直播开奖。
    /// 揭示的数字来自该池最近一次改号提交，定序器自己不造号。
    /// 注册表占位在任何异步工作之前完成，这个先后是并发互斥的关键。
    pub async fn start_draw(&self, city: &str) -> AppResult<()> {
        if self.registry.has(city) {
            return Err(AppError::AlreadyActive(city.to_string()));
        }

        let committed = self
            .store
            .latest_override(city)
            .await?
            .ok_or_else(|| AppError::OverrideMissing(city.to_string()))?;
        let digits = parse_prize_digits(&committed.new_numbers, self.live.digit_count)?;

        if !self.registry.insert_empty(city) {
            return Err(AppError::AlreadyActive(city.to_string()));
        }

        let cancel = Arc::new(Notify::new());
        self.cancels
            .lock()
            .unwrap()
            .insert(city.to_string(), cancel.clone());

        self.hub.publish(
            city,
            LiveEvent::DrawStarted {
                city: city.to_string(),
            },
        );
        self.meta.publish_live_meta(city, None, false).await;

        let this = self.clone();
        let city = city.to_string();
        tokio::spawn(async move {
            log::info!("Live draw started for {city}");
            this.run_sequence(&city, digits, committed.draw_date, cancel)
                .await;
        });

        Ok(())
    }

    /// 管理员提前停播：清注册表、掐掉所有待触发的计时器、重发元数据。
    /// 不落任何半截结果。
    pub async fn stop_draw(&self, city: &str) -> AppResult<()> {
        if self.registry.remove(city).is_none() {
            return Err(AppError::NotActive(city.to_string()));
        }
        if let Some(cancel) = self.cancels.lock().unwrap().remove(city) {
            cancel.notify_one();
        }
        self.meta.publish_live_meta(city, None, false).await;
        log::info!("Live draw stopped for {city}");
        Ok(())
    }

    async fn run_sequence(
        &self,
        city: &str,
        digits: [Vec<u8>; 3],
        draw_date: NaiveDate,
        cancel: Arc<Notify>,
    ) {
        let interval = self.live.digit_interval();

        for (tier_index, tier) in PrizeTier::ALL.into_iter().enumerate() {
            if !self.registry.set_prize(city, tier) {
                // 已被停止
                return;
            }
            self.hub.publish(
                city,
                LiveEvent::PrizeStart {
                    city: city.to_string(),
                    prize: tier,
                },
            );

            for (index, &digit) in digits[tier_index].iter().enumerate() {
                // 倒计时纯属观感，揭示计时器才是唯一推进进度的路径
                let ticker = self.spawn_countdown(city, tier, index, interval);
                let cancelled = tokio::select! {
                    _ = cancel.notified() => true,
                    _ = tokio::time::sleep(interval) => false,
                };
                ticker.abort();
                if cancelled {
                    return;
                }

                if !self.registry.push_digit(city, tier, digit) {
                    return;
                }
                self.hub.publish(
                    city,
                    LiveEvent::DrawNumber {
                        city: city.to_string(),
                        prize: tier,
                        index,
                        number: digit,
                    },
                );
            }

            // 奖级之间停一个揭示间隔
            if tier_index + 1 < PrizeTier::ALL.len() {
                let cancelled = tokio::select! {
                    _ = cancel.notified() => true,
                    _ = tokio::time::sleep(interval) => false,
                };
                if cancelled {
                    return;
                }
            }
        }

        // 最后一位揭完，结果展示期满后收官
        let cancelled = tokio::select! {
            _ = cancel.notified() => true,
            _ = tokio::time::sleep(self.live.display_period()) => false,
        };
        if cancelled {
            return;
        }

        self.finalize(city, draw_date).await;
    }

    /// 收官：结果恰好落库一次，注册表无条件清理。
    /// 写失败只记录——丢一次写比池永久卡在直播态可取。
    async fn finalize(&self, city: &str, fallback_date: NaiveDate) {
        // 直播期间可能重新提交过，收官前重读最近一次改号拿目标开奖日
        let draw_date = match self.store.latest_override(city).await {
            Ok(Some(committed)) => committed.draw_date,
            Ok(None) => fallback_date,
            Err(e) => {
                log::error!("Failed to re-read override for {city} at finalize: {e:?}");
                fallback_date
            }
        };

        let Some(progress) = self.registry.get(city) else {
            // 揭示完成与收官之间被停止
            self.cancels.lock().unwrap().remove(city);
            return;
        };
        let prizes = [
            progress.digits.prize_string(PrizeTier::First),
            progress.digits.prize_string(PrizeTier::Second),
            progress.digits.prize_string(PrizeTier::Third),
        ];

        if let Err(e) = self.store.upsert_result(city, draw_date, prizes).await {
            log::error!("Failed to persist live draw result for {city}: {e:?}");
        }

        self.registry.remove(city);
        self.cancels.lock().unwrap().remove(city);

        self.meta.publish_live_meta(city, None, true).await;
        self.hub.publish(
            city,
            LiveEvent::DrawEnded {
                city: city.to_string(),
            },
        );
        log::info!("Live draw finished for {city} ({draw_date})");
    }

    fn spawn_countdown(
        &self,
        city: &str,
        tier: PrizeTier,
        index: usize,
        interval: Duration,
    ) -> tokio::task::JoinHandle<()> {
        let hub = self.hub.clone();
        let city = city.to_string();
        let mut remaining = interval.as_secs();
        tokio::spawn(async move {
            loop {
                hub.publish(
                    &city,
                    LiveEvent::DigitCountdown {
                        city: city.clone(),
                        prize: tier,
                        index,
                        remaining,
                    },
                );
                if remaining == 0 {
                    break;
                }
                tokio::time::sleep(Duration::from_secs(1)).await;
                remaining -= 1;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::live::clock::SystemClock;
    use crate::live::store::testing::MemStore;
    use chrono::NaiveDate;
    use tokio::time::timeout;

    fn draw_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 7, 21).unwrap()
    }

    fn harness(
        store: MemStore,
        digit_interval_ms: u64,
    ) -> (LiveDrawService, Arc<MemStore>, DrawRegistry, LiveHub) {
        let store = Arc::new(store);
        let registry = DrawRegistry::new();
        let hub = LiveHub::new(registry.clone());
        let live = LiveConfig {
            digit_interval_ms,
            display_minutes: 0,
            digit_count: 5,
            ..LiveConfig::default()
        };
        let meta = MetaPublisher::new(
            store.clone() as Arc<dyn DrawStore>,
            hub.clone(),
            registry.clone(),
            Arc::new(SystemClock),
            live.clone(),
        );
        let service = LiveDrawService::new(
            store.clone() as Arc<dyn DrawStore>,
            registry.clone(),
            hub.clone(),
            meta,
            live,
        );
        (service, store, registry, hub)
    }

    async fn recv_event(sub: &mut crate::live::channel::LiveSubscription) -> LiveEvent {
        timeout(Duration::from_secs(2), sub.receiver.recv())
            .await
            .expect("event expected before timeout")
            .expect("channel open")
    }

    #[test]
    fn test_parse_prize_digits() {
        let digits = parse_prize_digits("12345,23456,34567", 5).unwrap();
        assert_eq!(digits[0], vec![1, 2, 3, 4, 5]);
        assert_eq!(digits[2], vec![3, 4, 5, 6, 7]);

        assert!(parse_prize_digits("12345,23456", 5).is_err());
        assert!(parse_prize_digits("1234,23456,34567", 5).is_err());
        assert!(parse_prize_digits("12a45,23456,34567", 5).is_err());
    }

    #[tokio::test]
    async fn test_full_sequence_persists_committed_digits() {
        let store = MemStore::new().with_override("jakarta", draw_date(), "12345,23456,34567");
        let (service, store, registry, hub) = harness(store, 0);
        let mut sub = hub.subscribe("jakarta");

        service.start_draw("jakarta").await.unwrap();

        let mut reveals: Vec<(PrizeTier, usize, u8)> = Vec::new();
        loop {
            match recv_event(&mut sub).await {
                LiveEvent::DrawNumber {
                    prize,
                    index,
                    number,
                    ..
                } => reveals.push((prize, index, number)),
                LiveEvent::DrawEnded { .. } => break,
                _ => {}
            }
        }

        // 注册表已清空，收官通知已到
        assert!(!registry.has("jakarta"));

        // 结果恰好落库一次，等于各奖级揭示数字的拼接
        let result = store.result_for("jakarta", draw_date()).unwrap();
        assert_eq!(result, ["12345".to_string(), "23456".into(), "34567".into()]);

        // 每个奖级 5 位，按序揭示，与提交号码逐位一致
        assert_eq!(reveals.len(), 15);
        let expected = [
            (PrizeTier::First, [1u8, 2, 3, 4, 5]),
            (PrizeTier::Second, [2, 3, 4, 5, 6]),
            (PrizeTier::Third, [3, 4, 5, 6, 7]),
        ];
        let mut cursor = 0;
        for (tier, values) in expected {
            for (index, value) in values.into_iter().enumerate() {
                assert_eq!(reveals[cursor], (tier, index, value));
                cursor += 1;
            }
        }
    }

    #[tokio::test]
    async fn test_second_start_rejected_while_active() {
        let store = MemStore::new().with_override("bali", draw_date(), "11111,22222,33333");
        let (service, _store, registry, _hub) = harness(store, 200);

        service.start_draw("bali").await.unwrap();
        let err = service.start_draw("bali").await.unwrap_err();
        assert!(matches!(err, AppError::AlreadyActive(_)));
        assert_eq!(registry.active_pools().len(), 1);

        service.stop_draw("bali").await.unwrap();
    }

    #[tokio::test]
    async fn test_start_without_override_rejected() {
        let (service, _store, registry, _hub) = harness(MemStore::new(), 0);

        let err = service.start_draw("medan").await.unwrap_err();
        assert!(matches!(err, AppError::OverrideMissing(_)));
        assert!(!registry.has("medan"));
    }

    #[tokio::test]
    async fn test_start_with_malformed_numbers_rejected() {
        let store = MemStore::new().with_override("medan", draw_date(), "123,456,789");
        let (service, _store, registry, _hub) = harness(store, 0);

        let err = service.start_draw("medan").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidDigits(_)));
        assert!(!registry.has("medan"));
    }

    #[tokio::test]
    async fn test_stop_without_active_draw() {
        let (service, _store, _registry, _hub) = harness(MemStore::new(), 0);
        let err = service.stop_draw("surabaya").await.unwrap_err();
        assert!(matches!(err, AppError::NotActive(_)));
    }

    #[tokio::test]
    async fn test_stop_halts_further_reveals() {
        let store = MemStore::new().with_override("jakarta", draw_date(), "12345,23456,34567");
        let (service, store, registry, hub) = harness(store, 500);
        let mut sub = hub.subscribe("jakarta");

        service.start_draw("jakarta").await.unwrap();

        // 等到第一位揭示后停播
        loop {
            if let LiveEvent::DrawNumber { .. } = recv_event(&mut sub).await {
                break;
            }
        }
        service.stop_draw("jakarta").await.unwrap();
        assert!(!registry.has("jakarta"));

        // 已排程的计时器不得再揭示任何数字
        let mut extra_reveals = 0;
        while let Ok(Ok(event)) =
            timeout(Duration::from_millis(800), sub.receiver.recv()).await
        {
            if matches!(event, LiveEvent::DrawNumber { .. }) {
                extra_reveals += 1;
            }
        }
        assert_eq!(extra_reveals, 0);

        // 半截结果不落库
        assert!(store.result_for("jakarta", draw_date()).is_none());
    }
}
