//! Background scheduled tasks for the application.
//!
//! This module launches the two perpetual schedule-poller loops (fallback
//! result materialization and live-draw auto-start). Call `spawn_all` once
//! during startup.

use crate::live::LivePoller;

/// Spawn all background loops.
///
/// Notes
/// - Each pass computes the exact delay until the next relevant instant
///   across all pools and sleeps until then; no fixed-interval polling.
/// - Every failure inside a pass is logged and swallowed — an exception
///   must never terminate a loop.
/// - This function detaches tasks via `tokio::spawn`; it does not block.
pub fn spawn_all(poller: LivePoller) {
    // 兜底补录循环：睡到下一次开奖时刻
    {
        let poller_clone = poller.clone();
        tokio::spawn(async move {
            loop {
                let next_wake = poller_clone.result_check_pass().await;
                tokio::time::sleep(poller_clone.sleep_until(next_wake)).await;
            }
        });
    }

    // 直播预热循环：睡到下一次提前量时刻
    {
        let poller_clone = poller.clone();
        tokio::spawn(async move {
            loop {
                let next_wake = poller_clone.live_start_pass().await;
                tokio::time::sleep(poller_clone.sleep_until(next_wake)).await;
            }
        });
    }
}
