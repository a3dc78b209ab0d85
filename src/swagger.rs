use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers;
use crate::live::{DrawProgress, PrizeTier, TierDigits};
use crate::models::*;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.as_mut().unwrap();
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        )
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::login,
        handlers::pool::list_pools,
        handlers::pool::create_pool,
        handlers::pool::delete_pool,
        handlers::schedule::list_schedules,
        handlers::schedule::list_schedules_admin,
        handlers::schedule::create_schedule,
        handlers::schedule::update_schedule,
        handlers::schedule::delete_schedule,
        handlers::result::latest_many,
        handlers::result::latest_by_city,
        handlers::result::list_history,
        handlers::result::override_results,
        handlers::result::list_overrides,
        handlers::live::live_events,
        handlers::live::start_live_draw,
        handlers::live::stop_live_draw,
        handlers::admin::get_stats,
    ),
    components(
        schemas(
            ApiError,
            LoginRequest,
            AuthResponse,
            CreatePoolRequest,
            PoolSummary,
            DeletePoolResponse,
            ScheduleResponse,
            CreateScheduleRequest,
            UpdateScheduleRequest,
            ResultResponse,
            OverrideResultRequest,
            OverrideLogResponse,
            StatsResponse,
            LiveMeta,
            LiveDrawStarted,
            PrizeTier,
            TierDigits,
            DrawProgress,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "管理员登录"),
        (name = "pools", description = "池管理与公共列表"),
        (name = "schedules", description = "每日开/封盘时刻表"),
        (name = "results", description = "开奖结果与改号"),
        (name = "live", description = "直播开奖"),
        (name = "admin", description = "后台统计")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    );
}
