use actix_web::{http::header, http::StatusCode, web, HttpResponse};
use serde_json::Value;

use crate::{error::ApiError, state::AppState};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/n8n/service").route(web::post().to(forward_service)))
        .service(web::resource("/api/n8n/quotes").route(web::post().to(forward_quotes)));
}

async fn forward_service(
    state: web::Data<AppState>,
    payload: web::Json<Value>,
) -> Result<HttpResponse, ApiError> {
    let url = state.n8n.service_url.clone();
    forward(&state, &url, "service", payload.into_inner()).await
}

async fn forward_quotes(
    state: web::Data<AppState>,
    payload: web::Json<Value>,
) -> Result<HttpResponse, ApiError> {
    let url = state.n8n.quotes_url.clone();
    forward(&state, &url, "quotes", payload.into_inner()).await
}

/// Relays the payload untouched and mirrors the upstream status and body
/// back to the caller. Only transport failures become our own error shape.
async fn forward(
    state: &AppState,
    url: &str,
    which: &str,
    payload: Value,
) -> Result<HttpResponse, ApiError> {
    log::info!("proxy: forwarding chat payload to n8n ({which})");

    let upstream = state.http.post(url).json(&payload).send().await?;

    let status =
        StatusCode::from_u16(upstream.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
    let content_type = upstream
        .headers()
        .get(header::CONTENT_TYPE.as_str())
        .and_then(|value| value.to_str().ok())
        .unwrap_or("application/json")
        .to_string();
    let body = upstream.bytes().await?;

    Ok(HttpResponse::build(status)
        .content_type(content_type)
        .body(body.to_vec()))
}
