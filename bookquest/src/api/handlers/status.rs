use axum::Json;

use crate::api::models::status::HelloResponse;

#[utoipa::path(
    get,
    path = "/",
    tag = "status",
    summary = "Greeting",
    responses((status = 200, description = "Service is up", body = HelloResponse))
)]
pub async fn hello() -> Json<HelloResponse> {
    Json(HelloResponse {
        status: "success".to_string(),
        message: "salam".to_string(),
        data: None,
    })
}

/// Liveness probe
pub async fn healthz() -> &'static str {
    "OK"
}
