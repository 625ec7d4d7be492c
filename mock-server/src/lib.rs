use std::collections::BTreeMap;

use axum::{
    extract::Path,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{any, post},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;

pub fn app() -> Router {
    Router::new()
        .route("/ok", any(ok))
        .route("/echo", post(echo))
        .route("/missing", any(missing))
        .route("/garbage", any(garbage))
        .route("/headers", any(reflect_headers))
        .route("/status/{code}", any(status))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn ok() -> Json<Value> {
    Json(json!({ "ok": true }))
}

/// Return the request body verbatim with a JSON content type.
async fn echo(body: String) -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/json")], body)
}

async fn missing() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "not found")
}

async fn garbage() -> &'static str {
    "not-json"
}

/// Report every received header as a JSON object keyed by lower-case name.
async fn reflect_headers(headers: HeaderMap) -> Json<BTreeMap<String, String>> {
    let reflected = headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();
    Json(reflected)
}

async fn status(Path(code): Path<u16>) -> Result<(StatusCode, Json<Value>), StatusCode> {
    let status = StatusCode::from_u16(code).map_err(|_| StatusCode::BAD_REQUEST)?;
    Ok((status, Json(json!({ "status": code }))))
}
