use crate::utils::parse_time_of_day;
use chrono::{DateTime, Duration, FixedOffset, TimeZone, Utc};

/// 一个池的当前时间窗：下一次封盘/开奖时刻与是否处于直播窗口
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveWindow {
    pub next_close: Option<DateTime<Utc>>,
    pub next_draw: Option<DateTime<Utc>>,
    pub is_live: bool,
}

impl LiveWindow {
    pub fn empty() -> Self {
        Self {
            next_close: None,
            next_draw: None,
            is_live: false,
        }
    }
}

/// 把 "HH:MM" 解释为固定偏移时区下今天的时刻；已过或相等则顺延到明天
fn next_occurrence(
    time_of_day: &str,
    now: DateTime<Utc>,
    offset: FixedOffset,
) -> Option<DateTime<Utc>> {
    let (hour, minute) = parse_time_of_day(time_of_day)?;
    let local_now = now.with_timezone(&offset);
    let candidate_local = local_now
        .date_naive()
        .and_hms_opt(hour, minute, 0)?;
    let candidate = offset
        .from_local_datetime(&candidate_local)
        .single()?
        .with_timezone(&Utc);

    if candidate <= now {
        Some(candidate + Duration::days(1))
    } else {
        Some(candidate)
    }
}

/// 时间窗计算器。纯函数：公共列表投影与轮询器共用。
///
/// 两个时刻都顺延到“下一次”之后，处于 [封盘, 开奖) 区间内恰好表现为
/// 封盘时刻越过了开奖时刻 (next_draw < next_close)；左闭右开，
/// 两时刻相同则窗口为零宽，永不直播。
pub fn compute_window(
    close_time: &str,
    draw_time: &str,
    now: DateTime<Utc>,
    offset: FixedOffset,
) -> LiveWindow {
    let next_draw = next_occurrence(draw_time, now, offset);
    let next_close = next_occurrence(close_time, now, offset);

    let is_live = match (next_close, next_draw) {
        (Some(close), Some(draw)) => draw < close,
        _ => false,
    };

    LiveWindow {
        next_close,
        next_draw,
        is_live,
    }
}

/// 开奖时刻对应的区域日历日（落库 draw_date 用）
pub fn draw_date_of(instant: DateTime<Utc>, offset: FixedOffset) -> chrono::NaiveDate {
    instant.with_timezone(&offset).date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;

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

    #[test]
    fn test_live_inside_window() {
        let w = compute_window("07:00", "08:00", local(7, 30), jakarta());
        assert!(w.is_live);
        // 封盘已顺延到明天，开奖仍是今天
        assert_eq!(w.next_draw, Some(local(8, 0)));
    }

    #[test]
    fn test_not_live_before_close() {
        let w = compute_window("07:00", "08:00", local(6, 59), jakarta());
        assert!(!w.is_live);
        assert_eq!(w.next_close, Some(local(7, 0)));
        assert_eq!(w.next_draw, Some(local(8, 0)));
    }

    #[test]
    fn test_close_boundary_inclusive() {
        let w = compute_window("07:00", "08:00", local(7, 0), jakarta());
        assert!(w.is_live);
    }

    #[test]
    fn test_draw_boundary_exclusive() {
        let w = compute_window("07:00", "08:00", local(8, 0), jakarta());
        assert!(!w.is_live);
        // 开奖时刻已过，顺延到明天
        assert_eq!(w.next_draw, Some(local(8, 0) + Duration::days(1)));
    }

    #[test]
    fn test_zero_width_window_never_live() {
        let w = compute_window("08:00", "08:00", local(7, 30), jakarta());
        assert!(!w.is_live);
        let w = compute_window("08:00", "08:00", local(8, 0), jakarta());
        assert!(!w.is_live);
    }

    #[test]
    fn test_invalid_draw_time_means_not_live() {
        let w = compute_window("07:00", "8:00", local(7, 30), jakarta());
        assert!(!w.is_live);
        assert!(w.next_draw.is_none());
        assert_eq!(w.next_close, Some(local(7, 0) + Duration::days(1)));
    }

    #[test]
    fn test_invalid_close_time_keeps_next_draw() {
        let w = compute_window("", "08:00", local(7, 30), jakarta());
        assert!(!w.is_live);
        assert!(w.next_close.is_none());
        assert_eq!(w.next_draw, Some(local(8, 0)));
    }

    #[test]
    fn test_rolls_forward_to_next_day() {
        let w = compute_window("07:00", "08:00", local(9, 15), jakarta());
        assert!(!w.is_live);
        assert_eq!(w.next_close, Some(local(7, 0) + Duration::days(1)));
        assert_eq!(w.next_draw, Some(local(8, 0) + Duration::days(1)));
    }

    #[test]
    fn test_draw_date_uses_regional_calendar() {
        // UTC 20:00 已是雅加达次日 03:00
        let instant = Utc.with_ymd_and_hms(2025, 7, 21, 20, 0, 0).unwrap();
        assert_eq!(
            draw_date_of(instant, jakarta()),
            chrono::NaiveDate::from_ymd_opt(2025, 7, 22).unwrap()
        );
    }
}
