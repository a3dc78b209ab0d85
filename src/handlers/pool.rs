use crate::models::*;
use crate::services::PoolService;
use actix_web::{HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/pools",
    tag = "pools",
    responses(
        (status = 200, description = "池列表及窗口状态", body = [PoolSummary]),
        (status = 503, description = "数据库不可用")
    )
)]
/// 公共池列表：城市 + 是否直播中 + 下一次封盘/开奖时刻
pub async fn list_pools(service: web::Data<PoolService>) -> Result<HttpResponse> {
    match service.list_pools().await {
        Ok(list) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": list }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/pools",
    tag = "pools",
    request_body = CreatePoolRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "创建成功"),
        (status = 400, description = "参数错误或池已存在"),
        (status = 401, description = "未授权")
    )
)]
pub async fn create_pool(
    service: web::Data<PoolService>,
    request: web::Json<CreatePoolRequest>,
) -> Result<HttpResponse> {
    match service.create_pool(&request.city).await {
        Ok(model) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": model }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/admin/pools/{city}",
    tag = "pools",
    params(
        ("city" = String, Path, description = "池标识")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "删除成功并级联清理", body = DeletePoolResponse),
        (status = 404, description = "池不存在"),
        (status = 401, description = "未授权")
    )
)]
/// 删除池：时刻表、结果、改号流水、直播状态一并清理
pub async fn delete_pool(
    service: web::Data<PoolService>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    match service.delete_pool(&path.into_inner()).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": response }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn pool_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/pools", web::get().to(list_pools))
        .route("/admin/pools", web::post().to(create_pool))
        .route("/admin/pools/{city}", web::delete().to(delete_pool));
}
