use actix_web::web;

use crate::handlers::blog_posts;

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/blog/posts")
            .service(web::resource("").route(web::get().to(blog_posts::get_blog_posts)))
            .service(web::resource("/featured").route(web::get().to(blog_posts::get_featured_blog_posts)))
            .service(web::resource("/recent").route(web::get().to(blog_posts::get_recent_blog_posts)))
            .service(web::resource("/popular").route(web::get().to(blog_posts::get_popular_blog_posts)))
            .service(web::resource("/slugs").route(web::get().to(blog_posts::get_blog_post_slugs)))
            .service(web::resource("/{slug}").route(web::get().to(blog_posts::get_blog_post_by_slug)))
            .service(
                web::resource("/{slug}/related")
                    .route(web::get().to(blog_posts::get_related_blog_posts))
            )
            .service(web::resource("/{post_id}/views").route(web::post().to(blog_posts::record_view)))
            .service(web::resource("/{post_id}/likes").route(web::post().to(blog_posts::record_like)))
    );
}
