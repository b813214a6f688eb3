use axum::Json;
use serde::Serialize;

#[derive(Serialize)]
pub struct PingResponse {
    pub status: &'static str,
    /// Server time, unix seconds.
    pub timestamp: i64,
}

pub async fn ping() -> Json<PingResponse> {
    Json(PingResponse {
        status: "ok",
        timestamp: chrono::Utc::now().timestamp(),
    })
}
