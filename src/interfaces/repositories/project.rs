use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    constants::collections::PROJECTS,
    entities::project::{Project, ProjectInsert},
    errors::AppError,
    repositories::store_repo::{decode_all, StoreProjectRepo},
    store::{to_document, DocumentData, DocumentStore, Query},
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    async fn find_projects(&self, query: Query) -> Result<Vec<Project>, AppError>;
    async fn get_project_by_id(&self, id: &str) -> Result<Option<Project>, AppError>;
    async fn create_project(&self, project: &ProjectInsert) -> Result<String, AppError>;
    async fn update_project(&self, id: &str, patch: DocumentData) -> Result<(), AppError>;
    async fn delete_project(&self, id: &str) -> Result<(), AppError>;
}

impl StoreProjectRepo {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        StoreProjectRepo { store }
    }
}

#[async_trait]
impl ProjectRepository for StoreProjectRepo {
    async fn find_projects(&self, query: Query) -> Result<Vec<Project>, AppError> {
        let docs = self.store.query(PROJECTS, &query).await?;
        Ok(decode_all(docs, Project::from_document))
    }

    async fn get_project_by_id(&self, id: &str) -> Result<Option<Project>, AppError> {
        match self.store.get(PROJECTS, id).await? {
            Some(doc) => Ok(Some(Project::from_document(doc)?)),
            None => Ok(None),
        }
    }

    async fn create_project(&self, project: &ProjectInsert) -> Result<String, AppError> {
        let data = to_document(project)?;
        Ok(self.store.insert(PROJECTS, data).await?)
    }

    async fn update_project(&self, id: &str, patch: DocumentData) -> Result<(), AppError> {
        Ok(self.store.update(PROJECTS, id, patch).await?)
    }

    async fn delete_project(&self, id: &str) -> Result<(), AppError> {
        Ok(self.store.delete(PROJECTS, id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn repo_with(docs: &[(&str, serde_json::Value)]) -> StoreProjectRepo {
        let store = MemoryStore::new();
        for (id, value) in docs {
            store.seed(PROJECTS, id, value.as_object().cloned().unwrap());
        }
        StoreProjectRepo::new(Arc::new(store))
    }

    #[tokio::test]
    async fn malformed_documents_are_skipped() {
        let repo = repo_with(&[
            ("good", json!({
                "title": "Good",
                "published": true,
                "createdAt": {"_seconds": 1, "_nanoseconds": 0},
                "updatedAt": {"_seconds": 1, "_nanoseconds": 0}
            })),
            ("bad", json!({ "title": "No timestamps", "published": true })),
        ]);

        let projects = repo.find_projects(Query::published()).await.unwrap();
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].id, "good");
    }

    #[tokio::test]
    async fn missing_id_is_none_and_delete_is_not_found() {
        let repo = repo_with(&[]);

        assert!(repo.get_project_by_id("nope").await.unwrap().is_none());
        assert!(matches!(repo.delete_project("nope").await, Err(AppError::NotFound(_))));
    }
}
