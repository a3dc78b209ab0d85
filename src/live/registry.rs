use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use utoipa::ToSchema;

/// 三个奖级，固定顺序
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PrizeTier {
    First,
    Second,
    Third,
}

impl PrizeTier {
    pub const ALL: [PrizeTier; 3] = [PrizeTier::First, PrizeTier::Second, PrizeTier::Third];

    pub fn as_str(&self) -> &'static str {
        match self {
            PrizeTier::First => "first",
            PrizeTier::Second => "second",
            PrizeTier::Third => "third",
        }
    }
}

/// 各奖级已揭示的数字
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TierDigits {
    pub first: Vec<u8>,
    pub second: Vec<u8>,
    pub third: Vec<u8>,
}

impl TierDigits {
    pub fn for_tier(&self, tier: PrizeTier) -> &Vec<u8> {
        match tier {
            PrizeTier::First => &self.first,
            PrizeTier::Second => &self.second,
            PrizeTier::Third => &self.third,
        }
    }

    fn for_tier_mut(&mut self, tier: PrizeTier) -> &mut Vec<u8> {
        match tier {
            PrizeTier::First => &mut self.first,
            PrizeTier::Second => &mut self.second,
            PrizeTier::Third => &mut self.third,
        }
    }

    /// 奖级数字拼成结果串, e.g. [1,2,3,4,5] -> "12345"
    pub fn prize_string(&self, tier: PrizeTier) -> String {
        self.for_tier(tier).iter().map(|d| d.to_string()).collect()
    }
}

/// 单个池的直播进度 (不落库)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DrawProgress {
    /// 当前正在揭示的奖级，空闲时为 None
    pub prize: Option<PrizeTier>,
    pub digits: TierDigits,
}

/// 进行中直播的内存注册表。
/// `has(city)` 即“该池正在直播”的判定；同一池同一时刻至多一个条目，
/// `insert_empty` 在一次写锁内完成查重与占位，关闭并发触发窗口。
/// 锁从不跨 await 持有。
#[derive(Clone, Default)]
pub struct DrawRegistry {
    inner: Arc<RwLock<HashMap<String, DrawProgress>>>,
}

impl DrawRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has(&self, city: &str) -> bool {
        self.inner.read().unwrap().contains_key(city)
    }

    pub fn get(&self, city: &str) -> Option<DrawProgress> {
        self.inner.read().unwrap().get(city).cloned()
    }

    /// 原子占位：已存在则返回 false
    pub fn insert_empty(&self, city: &str) -> bool {
        let mut map = self.inner.write().unwrap();
        if map.contains_key(city) {
            return false;
        }
        map.insert(city.to_string(), DrawProgress::default());
        true
    }

    /// 切换当前奖级并清空其进度；条目不存在返回 false
    pub fn set_prize(&self, city: &str, tier: PrizeTier) -> bool {
        let mut map = self.inner.write().unwrap();
        match map.get_mut(city) {
            Some(progress) => {
                progress.prize = Some(tier);
                progress.digits.for_tier_mut(tier).clear();
                true
            }
            None => false,
        }
    }

    /// 追加一位已揭示数字；条目不存在 (已被停止) 返回 false
    pub fn push_digit(&self, city: &str, tier: PrizeTier, digit: u8) -> bool {
        let mut map = self.inner.write().unwrap();
        match map.get_mut(city) {
            Some(progress) => {
                progress.digits.for_tier_mut(tier).push(digit);
                true
            }
            None => false,
        }
    }

    pub fn remove(&self, city: &str) -> Option<DrawProgress> {
        self.inner.write().unwrap().remove(city)
    }

    pub fn clear(&self) {
        self.inner.write().unwrap().clear();
    }

    pub fn active_pools(&self) -> Vec<String> {
        self.inner.read().unwrap().keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_empty_claims_once() {
        let registry = DrawRegistry::new();
        assert!(registry.insert_empty("jakarta"));
        assert!(!registry.insert_empty("jakarta"));
        assert_eq!(registry.active_pools(), vec!["jakarta".to_string()]);
    }

    #[test]
    fn test_push_digit_tracks_progress() {
        let registry = DrawRegistry::new();
        registry.insert_empty("bali");
        registry.set_prize("bali", PrizeTier::First);
        registry.push_digit("bali", PrizeTier::First, 4);
        registry.push_digit("bali", PrizeTier::First, 2);

        let progress = registry.get("bali").unwrap();
        assert_eq!(progress.prize, Some(PrizeTier::First));
        assert_eq!(progress.digits.first, vec![4, 2]);
        assert_eq!(progress.digits.prize_string(PrizeTier::First), "42");
    }

    #[test]
    fn test_mutation_after_remove_is_rejected() {
        let registry = DrawRegistry::new();
        registry.insert_empty("medan");
        registry.remove("medan");
        assert!(!registry.set_prize("medan", PrizeTier::First));
        assert!(!registry.push_digit("medan", PrizeTier::First, 7));
        assert!(!registry.has("medan"));
    }

    #[test]
    fn test_clear_drops_all_entries() {
        let registry = DrawRegistry::new();
        registry.insert_empty("jakarta");
        registry.insert_empty("bali");
        registry.clear();
        assert!(registry.active_pools().is_empty());
    }
}
