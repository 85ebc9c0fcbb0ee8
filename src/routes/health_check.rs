use actix_web::HttpResponse;

/// GET /health_check, unauthenticated liveness probe
pub async fn health_check() -> HttpResponse {
    tracing::debug!("Health check");
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}
