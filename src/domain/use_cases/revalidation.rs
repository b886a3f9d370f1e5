use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::{cache::TagInvalidator, constants::cache_tags, errors::AppError};

#[derive(Debug, Default, Deserialize)]
pub struct RevalidateRequest {
    pub path: Option<String>,
    pub tag: Option<String>,
    pub secret: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RevalidateResponse {
    pub revalidated: bool,
    pub now: i64,
    pub message: String,
    pub invalidated: usize,
}

/// What a page path maps to in the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathTarget {
    Everything,
    Tag(&'static str),
    Nothing,
}

/// `/` is every page; anything under a projects or blog route maps to that
/// tag group.
pub fn target_for_path(path: &str) -> PathTarget {
    let path = path.split(['?', '#']).next().unwrap_or_default().trim_end_matches('/');
    if path.is_empty() {
        return PathTarget::Everything;
    }

    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.contains(&"projects") {
        PathTarget::Tag(cache_tags::PROJECTS)
    } else if segments.contains(&"blog") {
        PathTarget::Tag(cache_tags::BLOG)
    } else {
        PathTarget::Nothing
    }
}

pub struct RevalidationHandler {
    invalidator: Arc<dyn TagInvalidator>,
    secret: Option<String>,
}

impl RevalidationHandler {
    pub fn new(invalidator: Arc<dyn TagInvalidator>, secret: Option<String>) -> Self {
        RevalidationHandler { invalidator, secret }
    }

    /// A configured secret must be matched exactly.
    pub fn authorize(&self, supplied: Option<&str>) -> Result<(), AppError> {
        match &self.secret {
            Some(expected) if supplied != Some(expected.as_str()) => Err(AppError::UnauthorizedAccess),
            _ => Ok(()),
        }
    }

    /// Drops cached reads for the requested path and/or tag. With neither,
    /// the project pages are refreshed.
    #[instrument(skip(self, request), fields(path = ?request.path, tag = ?request.tag))]
    pub async fn revalidate(&self, request: &RevalidateRequest) -> Result<RevalidateResponse, AppError> {
        self.authorize(request.secret.as_deref())?;

        let path = request.path.as_deref().filter(|p| !p.is_empty());
        let tag = request.tag.as_deref().filter(|t| !t.is_empty());
        let mut invalidated = 0;
        let mut done = Vec::new();

        if let Some(path) = path {
            invalidated += match target_for_path(path) {
                PathTarget::Everything => self.invalidator.invalidate_all().await?,
                PathTarget::Tag(tag) => self.invalidator.invalidate_tag(tag).await?,
                PathTarget::Nothing => 0,
            };
            info!(path, "Revalidated path");
            done.push(format!("path: {path}"));
        }

        if let Some(tag) = tag {
            invalidated += self.invalidator.invalidate_tag(tag).await?;
            info!(tag, "Revalidated tag");
            done.push(format!("tag: {tag}"));
        }

        let message = if done.is_empty() {
            invalidated += self.invalidator.invalidate_tag(cache_tags::PROJECTS).await?;
            info!("Revalidated all project pages");
            "Revalidated all project pages".to_string()
        } else {
            format!("Revalidated {}", done.join(", "))
        };

        Ok(RevalidateResponse {
            revalidated: true,
            now: Utc::now().timestamp_millis(),
            message,
            invalidated,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::invalidation::MockTagInvalidator;

    #[test]
    fn paths_map_to_tag_groups() {
        assert_eq!(target_for_path("/"), PathTarget::Everything);
        assert_eq!(target_for_path("/projects"), PathTarget::Tag("projects"));
        assert_eq!(target_for_path("/projects/tagged-cache?x=1"), PathTarget::Tag("projects"));
        assert_eq!(target_for_path("/admin/projects"), PathTarget::Tag("projects"));
        assert_eq!(target_for_path("/blog/hello/"), PathTarget::Tag("blog"));
        assert_eq!(target_for_path("/about"), PathTarget::Nothing);
    }

    #[tokio::test]
    async fn no_path_or_tag_refreshes_projects() {
        let mut invalidator = MockTagInvalidator::new();
        invalidator
            .expect_invalidate_tag()
            .withf(|tag| tag == "projects")
            .times(1)
            .returning(|_| Ok(2));

        let handler = RevalidationHandler::new(Arc::new(invalidator), None);
        let response = handler.revalidate(&RevalidateRequest::default()).await.unwrap();

        assert!(response.revalidated);
        assert_eq!(response.invalidated, 2);
        assert_eq!(response.message, "Revalidated all project pages");
    }

    #[tokio::test]
    async fn root_path_clears_everything() {
        let mut invalidator = MockTagInvalidator::new();
        invalidator.expect_invalidate_all().times(1).returning(|| Ok(5));

        let handler = RevalidationHandler::new(Arc::new(invalidator), None);
        let request = RevalidateRequest { path: Some("/".into()), ..Default::default() };

        assert_eq!(handler.revalidate(&request).await.unwrap().invalidated, 5);
    }

    #[tokio::test]
    async fn wrong_secret_is_unauthorized() {
        let handler = RevalidationHandler::new(Arc::new(MockTagInvalidator::new()), Some("s3cret".into()));
        let request = RevalidateRequest { tag: Some("blog".into()), secret: Some("guess".into()), ..Default::default() };

        assert!(matches!(handler.revalidate(&request).await, Err(AppError::UnauthorizedAccess)));
    }
}
