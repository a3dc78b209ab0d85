pub mod auth_service;
pub mod pool_service;
pub mod result_service;
pub mod schedule_service;
pub mod stats_service;

pub use auth_service::*;
pub use pool_service::*;
pub use result_service::*;
pub use schedule_service::*;
pub use stats_service::*;
