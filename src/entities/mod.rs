pub mod fetch_errors;
pub mod lottery_results;
pub mod overrides;
pub mod pools;
pub mod schedules;

pub use fetch_errors as fetch_error_entity;
pub use lottery_results as lottery_result_entity;
pub use overrides as override_entity;
pub use pools as pool_entity;
pub use schedules as schedule_entity;
