use crate::live::{LiveDrawService, LiveEvent, LiveHub, MetaPublisher};
use crate::models::*;
use actix_web::{HttpResponse, ResponseError, Result, web};
use futures_util::{StreamExt, stream};
use serde_json::json;
use tokio::sync::broadcast;

fn sse_frame(event: &LiveEvent) -> String {
    format!("event: {}\ndata: {}\n\n", event.name(), event.data())
}

#[utoipa::path(
    get,
    path = "/live/{city}/events",
    tag = "live",
    params(
        ("city" = String, Path, description = "池标识")
    ),
    responses(
        (status = 200, description = "SSE 事件流：liveMeta / liveSnapshot / prizeStart / digitCountdown / drawNumber / live-draw-start / live-draw-end / resultUpdated")
    )
)]
/// 订阅某池的实时事件流。
/// 迟到的订阅端先收到当前元数据与进度快照，之后只收增量事件，不回放。
pub async fn live_events(
    hub: web::Data<LiveHub>,
    meta: web::Data<MetaPublisher>,
    path: web::Path<String>,
) -> HttpResponse {
    let city = path.into_inner();
    let subscription = hub.subscribe(&city);
    let current = meta.current_meta(&city, None).await;

    let mut head = vec![LiveEvent::Meta {
        city: city.clone(),
        meta: current,
    }];
    if let Some(progress) = subscription.snapshot {
        head.push(LiveEvent::Snapshot {
            city: city.clone(),
            progress,
        });
    }
    let head_chunks: Vec<Result<web::Bytes, actix_web::Error>> = head
        .iter()
        .map(|event| Ok(web::Bytes::from(sse_frame(event))))
        .collect();

    let live_stream = stream::unfold(subscription.receiver, |mut receiver| async move {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    let chunk: Result<web::Bytes, actix_web::Error> =
                        Ok(web::Bytes::from(sse_frame(&event)));
                    return Some((chunk, receiver));
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    log::warn!("SSE subscriber lagged, skipped {skipped} events");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    });

    HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header(("Cache-Control", "no-cache"))
        .insert_header(("X-Accel-Buffering", "no"))
        .streaming(stream::iter(head_chunks).chain(live_stream))
}

#[utoipa::path(
    post,
    path = "/admin/pools/{city}/live-draw",
    tag = "live",
    params(
        ("city" = String, Path, description = "池标识")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "直播已开始", body = LiveDrawStarted),
        (status = 400, description = "未提交号码或号码不合规"),
        (status = 409, description = "该池已有直播进行中"),
        (status = 401, description = "未授权")
    )
)]
/// 手动触发直播开奖：揭示最近一次改号提交的号码
pub async fn start_live_draw(
    service: web::Data<LiveDrawService>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let city = path.into_inner();
    match service.start_draw(&city).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": LiveDrawStarted {
                city,
                message: "live draw started".to_string(),
            }
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/admin/pools/{city}/live-draw",
    tag = "live",
    params(
        ("city" = String, Path, description = "池标识")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "直播已停止"),
        (status = 404, description = "该池没有进行中的直播"),
        (status = 401, description = "未授权")
    )
)]
/// 提前停播：不落任何半截结果
pub async fn stop_live_draw(
    service: web::Data<LiveDrawService>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let city = path.into_inner();
    match service.stop_draw(&city).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": { "city": city } }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn live_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/live/{city}/events", web::get().to(live_events))
        .service(
            web::resource("/admin/pools/{city}/live-draw")
                .route(web::post().to(start_live_draw))
                .route(web::delete().to(stop_live_draw)),
        );
}
