pub mod auth;
pub mod common;
pub mod live;
pub mod pool;
pub mod result;
pub mod schedule;

pub use auth::*;
pub use common::*;
pub use live::*;
pub use pool::*;
pub use result::*;
pub use schedule::*;
