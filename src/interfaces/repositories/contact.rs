use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    constants::collections::CONTACT_SUBMISSIONS,
    entities::contact::ContactSubmission,
    errors::AppError,
    repositories::store_repo::StoreContactRepo,
    store::{to_document, DocumentStore, Query, StoreTimestamp},
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContactRepository: Send + Sync {
    async fn save_submission(&self, submission: &ContactSubmission) -> Result<String, AppError>;

    /// Submissions whose `field` equals `value`, created at or after `since`.
    async fn count_recent_by(&self, field: &str, value: &str, since: StoreTimestamp) -> Result<usize, AppError>;
}

impl StoreContactRepo {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        StoreContactRepo { store }
    }
}

#[async_trait]
impl ContactRepository for StoreContactRepo {
    async fn save_submission(&self, submission: &ContactSubmission) -> Result<String, AppError> {
        let data = to_document(submission)?;
        Ok(self.store.insert(CONTACT_SUBMISSIONS, data).await?)
    }

    async fn count_recent_by(&self, field: &str, value: &str, since: StoreTimestamp) -> Result<usize, AppError> {
        let query = Query::new().eq(field, value).gte("createdAt", since);
        Ok(self.store.count(CONTACT_SUBMISSIONS, &query).await?)
    }
}
