use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;
use tracing::instrument;

use crate::{
    entities::project::{NewProjectRequest, UpdateProjectRequest},
    errors::AppError,
    use_cases::{extractors::AdminClaims, projects::DEFAULT_RELATED_LIMIT},
    AppState,
};

pub(crate) const MAX_LIMIT: usize = 50;

#[derive(Debug, Deserialize)]
pub struct CategoryQuery {
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

impl LimitQuery {
    pub fn or(&self, default: usize) -> usize {
        self.limit.unwrap_or(default).clamp(1, MAX_LIMIT)
    }
}

#[instrument(skip(state))]
pub async fn get_projects(
    state: web::Data<AppState>,
    query: web::Query<CategoryQuery>,
) -> impl Responder {
    let projects = match query.category.as_deref().filter(|c| !c.is_empty()) {
        Some(category) => state.project_handler.projects_by_category(category).await,
        None => state.project_handler.all_projects().await,
    };
    HttpResponse::Ok().json(projects)
}

#[instrument(skip(state))]
pub async fn get_featured_projects(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(state.project_handler.featured_projects().await)
}

#[instrument(skip(state))]
pub async fn get_project_slugs(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(state.project_handler.project_slugs().await)
}

#[instrument(skip(state))]
pub async fn get_project_by_slug(
    slug: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let project = state
        .project_handler
        .project_by_slug(&slug)
        .await
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;

    Ok(HttpResponse::Ok().json(project))
}

#[instrument(skip(state))]
pub async fn get_related_projects(
    slug: web::Path<String>,
    state: web::Data<AppState>,
    query: web::Query<LimitQuery>,
) -> Result<impl Responder, AppError> {
    let handler = &state.project_handler;
    let project = handler
        .project_by_slug(&slug)
        .await
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;

    let related = handler
        .related_projects(&project.id, &project.technologies, &project.category, query.or(DEFAULT_RELATED_LIMIT))
        .await;
    Ok(HttpResponse::Ok().json(related))
}

// ───── Admin ────────────────────────────────────────────────────────

#[instrument(skip(_claims, state))]
pub async fn admin_get_projects(_claims: AdminClaims, state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(state.project_handler.all_projects_admin().await)
}

#[instrument(skip(_claims, state))]
pub async fn admin_get_project(
    _claims: AdminClaims,
    project_id: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let project = state
        .project_handler
        .project_by_id_admin(&project_id)
        .await
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;

    Ok(HttpResponse::Ok().json(project))
}

#[instrument(skip(_claims, state, data))]
pub async fn create_project(
    _claims: AdminClaims,
    state: web::Data<AppState>,
    data: web::Json<NewProjectRequest>,
) -> impl Responder {
    state.project_handler.create_project(data.into_inner()).await
}

#[instrument(skip(_claims, state, data))]
pub async fn update_project(
    _claims: AdminClaims,
    project_id: web::Path<String>,
    state: web::Data<AppState>,
    data: web::Json<UpdateProjectRequest>,
) -> impl Responder {
    state.project_handler.update_project(&project_id, data.into_inner()).await
}

#[instrument(skip(_claims, state))]
pub async fn delete_project(
    _claims: AdminClaims,
    project_id: web::Path<String>,
    state: web::Data<AppState>,
) -> impl Responder {
    state.project_handler.delete_project(&project_id).await
}

#[instrument(skip(_claims, state))]
pub async fn toggle_project_published(
    _claims: AdminClaims,
    project_id: web::Path<String>,
    state: web::Data<AppState>,
) -> impl Responder {
    state.project_handler.toggle_published(&project_id).await
}

#[instrument(skip(_claims, state))]
pub async fn toggle_project_featured(
    _claims: AdminClaims,
    project_id: web::Path<String>,
    state: web::Data<AppState>,
) -> impl Responder {
    state.project_handler.toggle_featured(&project_id).await
}
