//! 直播开奖核心：时间窗推导、进行中状态注册表、按池广播、
//! 逐位揭示定序器、时刻表轮询与元数据发布。

pub mod channel;
pub mod clock;
pub mod meta;
pub mod poller;
pub mod registry;
pub mod sequencer;
pub mod store;
pub mod window;

pub use channel::{LiveEvent, LiveHub, LiveSubscription};
pub use clock::{Clock, SystemClock, system_clock};
pub use meta::MetaPublisher;
pub use poller::LivePoller;
pub use registry::{DrawProgress, DrawRegistry, PrizeTier, TierDigits};
pub use sequencer::{LiveDrawService, parse_prize_digits};
pub use store::{CommittedOverride, DbStore, DrawStore, PoolSchedule};
pub use window::{LiveWindow, compute_window, draw_date_of};
