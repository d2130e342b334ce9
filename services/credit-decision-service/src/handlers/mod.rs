use actix_web::web;

pub mod health;
pub mod loans;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.configure(health::configure)
        .service(web::scope("/api/v1").configure(loans::configure));
}
