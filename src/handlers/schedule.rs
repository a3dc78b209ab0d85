use crate::models::*;
use crate::services::ScheduleService;
use actix_web::{HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/schedules",
    tag = "schedules",
    responses(
        (status = 200, description = "全部时刻表", body = [ScheduleResponse])
    )
)]
/// 公共时刻表列表
pub async fn list_schedules(service: web::Data<ScheduleService>) -> Result<HttpResponse> {
    match service.list_schedules().await {
        Ok(list) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": list }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/admin/schedules",
    tag = "schedules",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "全部时刻表", body = [ScheduleResponse]),
        (status = 401, description = "未授权")
    )
)]
pub async fn list_schedules_admin(service: web::Data<ScheduleService>) -> Result<HttpResponse> {
    match service.list_schedules().await {
        Ok(list) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": list }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/schedules",
    tag = "schedules",
    request_body = CreateScheduleRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "创建成功", body = ScheduleResponse),
        (status = 400, description = "时刻格式错误或已存在"),
        (status = 401, description = "未授权")
    )
)]
/// 新建时刻表 (HH:MM 严格校验)，变更即时推送元数据
pub async fn create_schedule(
    service: web::Data<ScheduleService>,
    request: web::Json<CreateScheduleRequest>,
) -> Result<HttpResponse> {
    match service.create_schedule(request.into_inner()).await {
        Ok(schedule) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": schedule }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/admin/schedules/{city}",
    tag = "schedules",
    params(
        ("city" = String, Path, description = "池标识")
    ),
    request_body = UpdateScheduleRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "更新成功", body = ScheduleResponse),
        (status = 400, description = "时刻格式错误"),
        (status = 404, description = "时刻表不存在"),
        (status = 401, description = "未授权")
    )
)]
pub async fn update_schedule(
    service: web::Data<ScheduleService>,
    path: web::Path<String>,
    request: web::Json<UpdateScheduleRequest>,
) -> Result<HttpResponse> {
    match service
        .update_schedule(&path.into_inner(), request.into_inner())
        .await
    {
        Ok(schedule) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": schedule }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/admin/schedules/{city}",
    tag = "schedules",
    params(
        ("city" = String, Path, description = "池标识")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "删除成功"),
        (status = 404, description = "时刻表不存在"),
        (status = 401, description = "未授权")
    )
)]
pub async fn delete_schedule(
    service: web::Data<ScheduleService>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    match service.delete_schedule(&path.into_inner()).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({ "success": true }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn schedule_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/schedules", web::get().to(list_schedules))
        .service(
            web::resource("/admin/schedules")
                .route(web::get().to(list_schedules_admin))
                .route(web::post().to(create_schedule)),
        )
        .service(
            web::resource("/admin/schedules/{city}")
                .route(web::put().to(update_schedule))
                .route(web::delete().to(delete_schedule)),
        );
}
