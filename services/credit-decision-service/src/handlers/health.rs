use actix_web::{get, web, HttpResponse, Responder};
use serde_json::json;
use sqlx::PgPool;

#[get("/healthz")]
async fn healthz() -> impl Responder {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

/// Readiness additionally checks the database pool is reachable.
#[get("/readyz")]
async fn readyz(pool: web::Data<PgPool>) -> impl Responder {
    match sqlx::query("SELECT 1").execute(pool.get_ref()).await {
        Ok(_) => HttpResponse::Ok().json(json!({ "status": "ok" })),
        Err(e) => HttpResponse::ServiceUnavailable().json(json!({
            "status": "unavailable",
            "error": e.to_string(),
        })),
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(healthz).service(readyz);
}
