use actix_web::web;

use crate::handlers::{blog_posts, projects};

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .service(
                web::scope("/projects")
                    .service(
                        web::resource("")
                            .route(web::get().to(projects::admin_get_projects))
                            .route(web::post().to(projects::create_project))
                    )
                    .service(
                        web::resource("/{project_id}")
                            .route(web::get().to(projects::admin_get_project))
                            .route(web::patch().to(projects::update_project))
                            .route(web::delete().to(projects::delete_project))
                    )
                    .service(
                        web::resource("/{project_id}/toggle-published")
                            .route(web::post().to(projects::toggle_project_published))
                    )
                    .service(
                        web::resource("/{project_id}/toggle-featured")
                            .route(web::post().to(projects::toggle_project_featured))
                    )
            )
            .service(
                web::scope("/blog/posts")
                    .service(
                        web::resource("")
                            .route(web::get().to(blog_posts::admin_get_blog_posts))
                            .route(web::post().to(blog_posts::create_blog_post))
                    )
                    .service(
                        web::resource("/{post_id}")
                            .route(web::get().to(blog_posts::admin_get_blog_post))
                            .route(web::patch().to(blog_posts::update_blog_post))
                            .route(web::delete().to(blog_posts::delete_blog_post))
                    )
                    .service(
                        web::resource("/{post_id}/toggle-published")
                            .route(web::post().to(blog_posts::toggle_blog_post_published))
                    )
                    .service(
                        web::resource("/{post_id}/toggle-featured")
                            .route(web::post().to(blog_posts::toggle_blog_post_featured))
                    )
            )
    );
}
