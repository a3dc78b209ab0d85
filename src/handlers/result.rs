use crate::middlewares::auth::AdminUser;
use crate::models::*;
use crate::services::ResultService;
use actix_web::{HttpMessage, HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

/// 从请求扩展中获取管理员用户名（中间件在鉴权后注入）
fn admin_username(req: &HttpRequest) -> String {
    req.extensions()
        .get::<AdminUser>()
        .map(|user| user.0.clone())
        .unwrap_or_default()
}

#[utoipa::path(
    get,
    path = "/pools/latest",
    tag = "results",
    params(
        ("cities" = Option<String>, Query, description = "逗号分隔的城市列表，缺省为全部池")
    ),
    responses(
        (status = 200, description = "各池最新结果", body = [ResultResponse]),
        (status = 503, description = "数据库不可用")
    )
)]
/// 多池最新结果，附带即时推导的下一窗口
pub async fn latest_many(
    service: web::Data<ResultService>,
    query: web::Query<LatestManyQuery>,
) -> Result<HttpResponse> {
    let cities = query.cities.as_ref().map(|raw| {
        raw.split(',')
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect::<Vec<_>>()
    });

    match service.latest_many(cities).await {
        Ok(list) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": list }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/pools/{city}/latest",
    tag = "results",
    params(
        ("city" = String, Path, description = "池标识")
    ),
    responses(
        (status = 200, description = "该池最新结果", body = ResultResponse),
        (status = 404, description = "暂无结果"),
        (status = 503, description = "数据库不可用")
    )
)]
pub async fn latest_by_city(
    service: web::Data<ResultService>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    match service.latest_by_city(&path.into_inner()).await {
        Ok(result) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": result }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/history",
    tag = "results",
    responses(
        (status = 200, description = "全部历史结果，开奖日倒序", body = [ResultResponse])
    )
)]
pub async fn list_history(service: web::Data<ResultService>) -> Result<HttpResponse> {
    match service.list_history().await {
        Ok(list) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": list }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/admin/pools/{city}/results",
    tag = "results",
    params(
        ("city" = String, Path, description = "池标识")
    ),
    request_body = OverrideResultRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "改号成功", body = ResultResponse),
        (status = 400, description = "号码位数或格式不合规"),
        (status = 401, description = "未授权")
    )
)]
/// 管理员改号：upsert 结果 + 追加流水；流水即直播揭示的事实来源
pub async fn override_results(
    service: web::Data<ResultService>,
    path: web::Path<String>,
    request: web::Json<OverrideResultRequest>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let username = admin_username(&req);
    match service
        .override_results(&path.into_inner(), request.into_inner(), &username)
        .await
    {
        Ok(result) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": result }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/admin/overrides",
    tag = "results",
    params(
        ("limit" = Option<u64>, Query, description = "返回条数 (默认10)")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "改号流水", body = [OverrideLogResponse]),
        (status = 401, description = "未授权")
    )
)]
pub async fn list_overrides(
    service: web::Data<ResultService>,
    query: web::Query<OverrideLogQuery>,
) -> Result<HttpResponse> {
    let limit = query.limit.unwrap_or(10);
    match service.list_overrides(limit).await {
        Ok(list) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": list }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn result_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/pools/latest", web::get().to(latest_many))
        .route("/pools/{city}/latest", web::get().to(latest_by_city))
        .route("/history", web::get().to(list_history))
        .route(
            "/admin/pools/{city}/results",
            web::put().to(override_results),
        )
        .route("/admin/overrides", web::get().to(list_overrides));
}
