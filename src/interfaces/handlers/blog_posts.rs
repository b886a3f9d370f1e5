use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;
use tracing::instrument;

use crate::{
    entities::blog_post::{NewBlogPostRequest, UpdateBlogPostRequest},
    errors::AppError,
    handlers::projects::LimitQuery,
    repositories::blog_post::Counter,
    use_cases::{
        blog::{DEFAULT_FEATURED_LIMIT, DEFAULT_POPULAR_LIMIT, DEFAULT_RECENT_LIMIT, DEFAULT_RELATED_LIMIT},
        extractors::AdminClaims,
    },
    AppState,
};

/// At most one filter applies, checked in the order search, tag, category.
#[derive(Debug, Deserialize)]
pub struct BlogListQuery {
    pub q: Option<String>,
    pub tag: Option<String>,
    pub category: Option<String>,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[instrument(skip(state))]
pub async fn get_blog_posts(
    state: web::Data<AppState>,
    query: web::Query<BlogListQuery>,
) -> impl Responder {
    let handler = &state.blog_handler;

    let posts = if let Some(q) = non_blank(&query.q) {
        handler.search_blog_posts(q).await
    } else if let Some(tag) = non_blank(&query.tag) {
        handler.blog_posts_by_tag(tag).await
    } else if let Some(category) = non_blank(&query.category) {
        handler.blog_posts_by_category(category).await
    } else {
        handler.all_blog_posts().await
    };

    HttpResponse::Ok().json(posts)
}

#[instrument(skip(state))]
pub async fn get_featured_blog_posts(
    state: web::Data<AppState>,
    query: web::Query<LimitQuery>,
) -> impl Responder {
    let posts = state.blog_handler.featured_blog_posts(query.or(DEFAULT_FEATURED_LIMIT)).await;
    HttpResponse::Ok().json(posts)
}

#[instrument(skip(state))]
pub async fn get_recent_blog_posts(
    state: web::Data<AppState>,
    query: web::Query<LimitQuery>,
) -> impl Responder {
    let posts = state.blog_handler.recent_blog_posts(query.or(DEFAULT_RECENT_LIMIT)).await;
    HttpResponse::Ok().json(posts)
}

#[instrument(skip(state))]
pub async fn get_popular_blog_posts(
    state: web::Data<AppState>,
    query: web::Query<LimitQuery>,
) -> impl Responder {
    let posts = state.blog_handler.popular_blog_posts(query.or(DEFAULT_POPULAR_LIMIT)).await;
    HttpResponse::Ok().json(posts)
}

#[instrument(skip(state))]
pub async fn get_blog_post_slugs(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(state.blog_handler.blog_post_slugs().await)
}

#[instrument(skip(state))]
pub async fn get_blog_post_by_slug(
    slug: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let post = state
        .blog_handler
        .blog_post_by_slug(&slug)
        .await
        .ok_or_else(|| AppError::NotFound("Blog post not found".to_string()))?;

    Ok(HttpResponse::Ok().json(post))
}

#[instrument(skip(state))]
pub async fn get_related_blog_posts(
    slug: web::Path<String>,
    state: web::Data<AppState>,
    query: web::Query<LimitQuery>,
) -> Result<impl Responder, AppError> {
    let handler = &state.blog_handler;
    let post = handler
        .blog_post_by_slug(&slug)
        .await
        .ok_or_else(|| AppError::NotFound("Blog post not found".to_string()))?;

    let related = handler
        .related_blog_posts(&post.id, &post.tags, &post.category, query.or(DEFAULT_RELATED_LIMIT))
        .await;
    Ok(HttpResponse::Ok().json(related))
}

#[instrument(skip(state))]
pub async fn record_view(post_id: web::Path<String>, state: web::Data<AppState>) -> impl Responder {
    let recorded = state.blog_handler.record(&post_id, Counter::Views).await;
    HttpResponse::Ok().json(serde_json::json!({ "success": recorded }))
}

#[instrument(skip(state))]
pub async fn record_like(post_id: web::Path<String>, state: web::Data<AppState>) -> impl Responder {
    let recorded = state.blog_handler.record(&post_id, Counter::Likes).await;
    HttpResponse::Ok().json(serde_json::json!({ "success": recorded }))
}

// ───── Admin ────────────────────────────────────────────────────────

#[instrument(skip(_claims, state))]
pub async fn admin_get_blog_posts(_claims: AdminClaims, state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(state.blog_handler.all_blog_posts_admin().await)
}

#[instrument(skip(_claims, state))]
pub async fn admin_get_blog_post(
    _claims: AdminClaims,
    post_id: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let post = state
        .blog_handler
        .blog_post_by_id_admin(&post_id)
        .await
        .ok_or_else(|| AppError::NotFound("Blog post not found".to_string()))?;

    Ok(HttpResponse::Ok().json(post))
}

#[instrument(skip(_claims, state, data))]
pub async fn create_blog_post(
    _claims: AdminClaims,
    state: web::Data<AppState>,
    data: web::Json<NewBlogPostRequest>,
) -> impl Responder {
    state.blog_handler.create_blog_post(data.into_inner()).await
}

#[instrument(skip(_claims, state, data))]
pub async fn update_blog_post(
    _claims: AdminClaims,
    post_id: web::Path<String>,
    state: web::Data<AppState>,
    data: web::Json<UpdateBlogPostRequest>,
) -> impl Responder {
    state.blog_handler.update_blog_post(&post_id, data.into_inner()).await
}

#[instrument(skip(_claims, state))]
pub async fn delete_blog_post(
    _claims: AdminClaims,
    post_id: web::Path<String>,
    state: web::Data<AppState>,
) -> impl Responder {
    state.blog_handler.delete_blog_post(&post_id).await
}

#[instrument(skip(_claims, state))]
pub async fn toggle_blog_post_published(
    _claims: AdminClaims,
    post_id: web::Path<String>,
    state: web::Data<AppState>,
) -> impl Responder {
    state.blog_handler.toggle_published(&post_id).await
}

#[instrument(skip(_claims, state))]
pub async fn toggle_blog_post_featured(
    _claims: AdminClaims,
    post_id: web::Path<String>,
    state: web::Data<AppState>,
) -> impl Responder {
    state.blog_handler.toggle_featured(&post_id).await
}
