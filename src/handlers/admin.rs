use crate::models::*;
use crate::services::StatsService;
use actix_web::{HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/admin/stats",
    tag = "admin",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "后台统计", body = StatsResponse),
        (status = 401, description = "未授权")
    )
)]
/// 仪表盘统计：池总数、今日结果数、今日补录错误数、最近一次改号时间
pub async fn get_stats(service: web::Data<StatsService>) -> Result<HttpResponse> {
    match service.get_stats().await {
        Ok(stats) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": stats }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn admin_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/admin/stats", web::get().to(get_stats));
}
