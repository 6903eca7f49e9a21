//! Health Check API Handler

use axum::Json;

/// GET /health
/// Liveness probe; names the service so a misrouted check is obvious
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "trellis-orchestrator",
    }))
}
