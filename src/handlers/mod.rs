pub mod admin;
pub mod auth;
pub mod live;
pub mod pool;
pub mod result;
pub mod schedule;

pub use admin::admin_config;
pub use auth::auth_config;
pub use live::live_config;
pub use pool::pool_config;
pub use result::result_config;
pub use schedule::schedule_config;
