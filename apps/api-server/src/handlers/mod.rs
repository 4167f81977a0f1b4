//! HTTP handlers and route configuration.

mod admin;
mod ai;
mod blog;
mod health;
mod tarot;


use actix_web::web;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            // Public routes
            .route("/health", web::get().to(health::health_check))
            .service(
                web::scope("/blog")
                    .route("/posts", web::get().to(blog::list_posts))
                    .route("/posts", web::post().to(blog::create_post))
                    .route("/posts/{id}", web::get().to(blog::get_post))
                    .route("/posts/{id}", web::delete().to(blog::delete_post)),
            )
            .service(
                web::scope("/tarot")
                    .route("/guidelines", web::get().to(tarot::list_guidelines))
                    .route("/guidelines/{spread}", web::put().to(tarot::upsert_guideline)),
            )
            // Quota-limited AI route
            .route("/ai/interpret", web::post().to(ai::interpret))
            // Admin routes
            .service(
                web::scope("/admin/cache")
                    .route("/stats", web::get().to(admin::cache_stats))
                    .route("/invalidate", web::post().to(admin::invalidate_cache)),
            ),
    );
}
