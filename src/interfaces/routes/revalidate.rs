use actix_web::web;

use crate::handlers::revalidate;

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/api/revalidate")
            .route(web::post().to(revalidate::revalidate))
            .route(web::get().to(revalidate::revalidate_get))
    );
}
