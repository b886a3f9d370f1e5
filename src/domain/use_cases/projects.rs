use std::{sync::Arc, time::Duration};

use serde_json::Value;
use tracing::{error, info, instrument, warn};

use crate::{
    cache::{CacheKey, TagInvalidator, TaggedCache},
    constants::{cache_tags, ALL_CATEGORIES},
    entities::{
        action::ActionResponse,
        project::{NewProjectRequest, Project, UpdateProjectRequest},
    },
    errors::AppError,
    ranking::{rank_related, ZeroScorePolicy},
    repositories::project::ProjectRepository,
    settings::CacheTtls,
    store::{DocumentData, Direction, Query, StoreTimestamp},
};
use validator::Validate;

const PROJECT_TAGS: &[&str] = &[cache_tags::PROJECTS];
const FEATURED_TAGS: &[&str] = &[cache_tags::PROJECTS, cache_tags::FEATURED_PROJECTS];
const FEATURED_LIMIT: usize = 4;
pub const DEFAULT_RELATED_LIMIT: usize = 3;

/// Public (cached) and admin (uncached) project reads plus the admin
/// write path.
pub struct ProjectHandler<R>
where
    R: ProjectRepository,
{
    pub project_repo: R,
    cache: Arc<TaggedCache>,
    invalidator: Arc<dyn TagInvalidator>,
    ttls: CacheTtls,
}

impl<R> ProjectHandler<R>
where
    R: ProjectRepository,
{
    pub fn new(
        project_repo: R,
        cache: Arc<TaggedCache>,
        invalidator: Arc<dyn TagInvalidator>,
        ttls: CacheTtls,
    ) -> Self {
        ProjectHandler { project_repo, cache, invalidator, ttls }
    }

    fn newest_first() -> Query {
        Query::published().order_by("createdAt", Direction::Desc)
    }

    async fn cached_list(&self, key: CacheKey, tags: &[&'static str], ttl: Duration, query: Query) -> Vec<Project> {
        let function = key.function();
        self.cache
            .get_or_load(key, tags, ttl, || self.project_repo.find_projects(query))
            .await
            .unwrap_or_else(|e| {
                error!(function, error = %e, "Failed to load projects");
                Vec::new()
            })
    }

    /// Every published project, newest first.
    #[instrument(skip(self))]
    pub async fn all_projects(&self) -> Vec<Project> {
        let key = CacheKey::new("all_projects", ());
        self.cached_list(key, PROJECT_TAGS, self.ttls.list, Self::newest_first()).await
    }

    #[instrument(skip(self))]
    pub async fn featured_projects(&self) -> Vec<Project> {
        let key = CacheKey::new("featured_projects", ());
        let query = Self::newest_first().eq("featured", true).limit(FEATURED_LIMIT);
        self.cached_list(key, FEATURED_TAGS, self.ttls.list, query).await
    }

    /// `All` means no category filter.
    #[instrument(skip(self))]
    pub async fn projects_by_category(&self, category: &str) -> Vec<Project> {
        let key = CacheKey::new("projects_by_category", category);
        let mut query = Self::newest_first();
        if category != ALL_CATEGORIES {
            query = query.eq("category", category);
        }
        self.cached_list(key, PROJECT_TAGS, self.ttls.list, query).await
    }

    /// First published project with this slug, in store order.
    #[instrument(skip(self))]
    pub async fn project_by_slug(&self, slug: &str) -> Option<Project> {
        let key = CacheKey::new("project_by_slug", slug);
        let query = Query::published().eq("slug", slug);

        self.cache
            .get_or_load(key, PROJECT_TAGS, self.ttls.detail, || async {
                Ok::<_, AppError>(self.project_repo.find_projects(query).await?.into_iter().next())
            })
            .await
            .unwrap_or_else(|e| {
                error!(slug, error = %e, "Failed to load project by slug");
                None
            })
    }

    /// Same-category projects ordered by shared technologies. Unrelated
    /// projects still fill the list, newest first.
    #[instrument(skip(self, technologies))]
    pub async fn related_projects(
        &self,
        project_id: &str,
        technologies: &[String],
        category: &str,
        limit: usize,
    ) -> Vec<Project> {
        let key = CacheKey::new("related_projects", (project_id, technologies, category, limit));
        let query = Self::newest_first().eq("category", category);

        self.cache
            .get_or_load(key, PROJECT_TAGS, self.ttls.detail, || async {
                let pool = self.project_repo.find_projects(query).await?;
                Ok::<_, AppError>(rank_related(pool, project_id, technologies, limit, ZeroScorePolicy::Keep))
            })
            .await
            .unwrap_or_else(|e| {
                error!(project_id, error = %e, "Failed to load related projects");
                Vec::new()
            })
    }

    #[instrument(skip(self))]
    pub async fn project_slugs(&self) -> Vec<String> {
        let key = CacheKey::new("project_slugs", ());

        self.cache
            .get_or_load(key, PROJECT_TAGS, self.ttls.detail, || async {
                let projects = self.project_repo.find_projects(Query::published()).await?;
                Ok::<_, AppError>(projects.into_iter().map(|p| p.slug).collect::<Vec<_>>())
            })
            .await
            .unwrap_or_else(|e| {
                error!(error = %e, "Failed to load project slugs");
                Vec::new()
            })
    }

    /// Drafts included, most recently edited first. Never cached.
    #[instrument(skip(self))]
    pub async fn all_projects_admin(&self) -> Vec<Project> {
        let query = Query::new().order_by("updatedAt", Direction::Desc);
        self.project_repo.find_projects(query).await.unwrap_or_else(|e| {
            error!(error = %e, "[admin] Failed to load projects");
            Vec::new()
        })
    }

    #[instrument(skip(self))]
    pub async fn project_by_id_admin(&self, id: &str) -> Option<Project> {
        self.project_repo.get_project_by_id(id).await.unwrap_or_else(|e| {
            error!(id, error = %e, "[admin] Failed to load project");
            None
        })
    }

    #[instrument(skip(self, request), fields(title = %request.title))]
    pub async fn create_project(&self, request: NewProjectRequest) -> ActionResponse {
        if let Err(errors) = request.check() {
            return ActionResponse::invalid(&errors);
        }

        let insert = request.into_insert(StoreTimestamp::now());
        match self.project_repo.create_project(&insert).await {
            Ok(id) => {
                info!(id = %id, "[admin] Project created");
                self.invalidate().await;
                ActionResponse::created("Project created successfully!", id)
            }
            Err(e) => {
                error!(error = %e, "[admin] Error creating project");
                ActionResponse::failed("Failed to create project. Please try again.")
            }
        }
    }

    #[instrument(skip(self, request))]
    pub async fn update_project(&self, id: &str, request: UpdateProjectRequest) -> ActionResponse {
        if let Err(errors) = request.validate() {
            return ActionResponse::invalid(&errors);
        }

        let patch = request.into_patch(StoreTimestamp::now());
        match self.project_repo.update_project(id, patch).await {
            Ok(()) => {
                info!(id, "[admin] Project updated");
                self.invalidate().await;
                ActionResponse { id: Some(id.to_string()), ..ActionResponse::ok("Project updated successfully!") }
            }
            Err(AppError::NotFound(_)) => ActionResponse::not_found("Project not found."),
            Err(e) => {
                error!(id, error = %e, "[admin] Error updating project");
                ActionResponse::failed("Failed to update project. Please try again.")
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn delete_project(&self, id: &str) -> ActionResponse {
        match self.project_repo.delete_project(id).await {
            Ok(()) => {
                info!(id, "[admin] Project deleted");
                self.invalidate().await;
                ActionResponse::ok("Project deleted successfully!")
            }
            Err(AppError::NotFound(_)) => ActionResponse::not_found("Project not found."),
            Err(e) => {
                error!(id, error = %e, "[admin] Error deleting project");
                ActionResponse::failed("Failed to delete project. Please try again.")
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn toggle_published(&self, id: &str) -> ActionResponse {
        let outcome = self.toggle_flag(id, "published", |p| p.published).await;
        self.toggle_response(
            id,
            outcome,
            "Project status updated successfully!",
            "Failed to update project status. Please try again.",
        )
    }

    #[instrument(skip(self))]
    pub async fn toggle_featured(&self, id: &str) -> ActionResponse {
        let outcome = self.toggle_flag(id, "featured", |p| p.featured).await;
        self.toggle_response(
            id,
            outcome,
            "Project featured status updated successfully!",
            "Failed to update project featured status. Please try again.",
        )
    }

    /// Reads the flag, writes its negation and stamps `updatedAt`.
    async fn toggle_flag(&self, id: &str, field: &str, current: fn(&Project) -> bool) -> Result<bool, AppError> {
        let project = self
            .project_repo
            .get_project_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("project {id}")))?;

        let flipped = !current(&project);
        let mut patch = DocumentData::new();
        patch.insert(field.to_string(), Value::Bool(flipped));
        patch.insert("updatedAt".into(), StoreTimestamp::now().into());

        self.project_repo.update_project(id, patch).await?;
        info!(id, field, value = flipped, "[admin] Project flag toggled");
        self.invalidate().await;
        Ok(flipped)
    }

    fn toggle_response(
        &self,
        id: &str,
        outcome: Result<bool, AppError>,
        success: &str,
        failure: &str,
    ) -> ActionResponse {
        match outcome {
            Ok(_) => ActionResponse::ok(success),
            Err(AppError::NotFound(_)) => ActionResponse::not_found("Project not found."),
            Err(e) => {
                error!(id, error = %e, "[admin] Error toggling project flag");
                ActionResponse::failed(failure)
            }
        }
    }

    async fn invalidate(&self) {
        if let Err(e) = self.invalidator.invalidate_tag(cache_tags::PROJECTS).await {
            warn!(error = %e, "Project cache invalidation failed; reads may be stale until expiry");
        }
    }
}
