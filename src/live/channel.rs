use crate::live::registry::{DrawProgress, DrawRegistry, PrizeTier};
use crate::models::LiveMeta;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 256;

/// 推送到订阅端的具名事件
#[derive(Debug, Clone)]
pub enum LiveEvent {
    Meta {
        city: String,
        meta: LiveMeta,
    },
    DrawStarted {
        city: String,
    },
    PrizeStart {
        city: String,
        prize: PrizeTier,
    },
    /// 纯展示用的每秒倒计时，不推动进度
    DigitCountdown {
        city: String,
        prize: PrizeTier,
        index: usize,
        remaining: u64,
    },
    DrawNumber {
        city: String,
        prize: PrizeTier,
        index: usize,
        number: u8,
    },
    DrawEnded {
        city: String,
    },
    ResultUpdated {
        city: String,
    },
    /// 中途加入的订阅端先收到的当前进度快照
    Snapshot {
        city: String,
        progress: DrawProgress,
    },
}

impl LiveEvent {
    pub fn name(&self) -> &'static str {
        match self {
            LiveEvent::Meta { .. } => "liveMeta",
            LiveEvent::DrawStarted { .. } => "live-draw-start",
            LiveEvent::PrizeStart { .. } => "prizeStart",
            LiveEvent::DigitCountdown { .. } => "digitCountdown",
            LiveEvent::DrawNumber { .. } => "drawNumber",
            LiveEvent::DrawEnded { .. } => "live-draw-end",
            LiveEvent::ResultUpdated { .. } => "resultUpdated",
            LiveEvent::Snapshot { .. } => "liveSnapshot",
        }
    }

    pub fn data(&self) -> Value {
        match self {
            LiveEvent::Meta { meta, .. } => json!(meta),
            LiveEvent::DrawStarted { city } => json!({ "city": city }),
            LiveEvent::PrizeStart { city, prize } => {
                json!({ "city": city, "prize": prize.as_str() })
            }
            LiveEvent::DigitCountdown {
                city,
                prize,
                index,
                remaining,
            } => json!({
                "city": city,
                "prize": prize.as_str(),
                "index": index,
                "remaining": remaining,
            }),
            LiveEvent::DrawNumber {
                city,
                prize,
                index,
                number,
            } => json!({
                "city": city,
                "prize": prize.as_str(),
                "index": index,
                "number": number,
            }),
            LiveEvent::DrawEnded { city } => json!({ "city": city }),
            LiveEvent::ResultUpdated { city } => json!({ "city": city }),
            LiveEvent::Snapshot { city, progress } => json!({
                "city": city,
                "progress": progress,
            }),
        }
    }
}

/// 一次订阅：加入时的进度快照 + 后续事件流
pub struct LiveSubscription {
    pub snapshot: Option<DrawProgress>,
    pub receiver: broadcast::Receiver<LiveEvent>,
}

/// 按池分发的广播枢纽。
/// 发布端无订阅者时丢弃事件 (best-effort)；订阅端迟到只拿快照，不回放。
#[derive(Clone)]
pub struct LiveHub {
    registry: DrawRegistry,
    channels: Arc<RwLock<HashMap<String, broadcast::Sender<LiveEvent>>>>,
}

impl LiveHub {
    pub fn new(registry: DrawRegistry) -> Self {
        Self {
            registry,
            channels: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn publish(&self, city: &str, event: LiveEvent) {
        let channels = self.channels.read().unwrap();
        if let Some(sender) = channels.get(city) {
            // 无接收端时 send 报错，按无订阅者处理
            let _ = sender.send(event);
        }
    }

    pub fn subscribe(&self, city: &str) -> LiveSubscription {
        let receiver = {
            let mut channels = self.channels.write().unwrap();
            channels
                .entry(city.to_string())
                .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
                .subscribe()
        };

        LiveSubscription {
            snapshot: self.registry.get(city),
            receiver,
        }
    }

    /// 池删除时移除其通道，悬挂的订阅端收到 Closed 后断开
    pub fn drop_channel(&self, city: &str) {
        self.channels.write().unwrap().remove(city);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_snapshot_on_join_matches_registry() {
        let registry = DrawRegistry::new();
        registry.insert_empty("jakarta");
        registry.set_prize("jakarta", PrizeTier::Second);
        registry.push_digit("jakarta", PrizeTier::Second, 9);
        registry.push_digit("jakarta", PrizeTier::Second, 1);

        let hub = LiveHub::new(registry.clone());
        let sub = hub.subscribe("jakarta");

        let snapshot = sub.snapshot.expect("active draw must yield a snapshot");
        assert_eq!(snapshot, registry.get("jakarta").unwrap());
        assert_eq!(snapshot.digits.second, vec![9, 1]);
    }

    #[tokio::test]
    async fn test_publish_reaches_subscriber() {
        let hub = LiveHub::new(DrawRegistry::new());
        let mut sub = hub.subscribe("bali");

        hub.publish(
            "bali",
            LiveEvent::DrawNumber {
                city: "bali".to_string(),
                prize: PrizeTier::First,
                index: 0,
                number: 7,
            },
        );

        let event = sub.receiver.recv().await.unwrap();
        assert_eq!(event.name(), "drawNumber");
        assert_eq!(event.data()["number"], 7);
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_noop() {
        let hub = LiveHub::new(DrawRegistry::new());
        // 无通道、无订阅端，不应 panic
        hub.publish(
            "nowhere",
            LiveEvent::DrawEnded {
                city: "nowhere".to_string(),
            },
        );
    }
}
