use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    constants::collections::BLOG,
    entities::blog_post::{BlogPost, BlogPostInsert},
    errors::AppError,
    repositories::store_repo::{decode_all, StoreBlogPostRepo},
    store::{to_document, DocumentData, DocumentStore, Query},
};

/// Engagement counters a reader can bump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counter {
    Views,
    Likes,
}

impl Counter {
    pub fn field(self) -> &'static str {
        match self {
            Counter::Views => "views",
            Counter::Likes => "likes",
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BlogPostRepository: Send + Sync {
    async fn find_blog_posts(&self, query: Query) -> Result<Vec<BlogPost>, AppError>;
    async fn get_blog_post_by_id(&self, id: &str) -> Result<Option<BlogPost>, AppError>;
    async fn create_blog_post(&self, post: &BlogPostInsert) -> Result<String, AppError>;
    async fn update_blog_post(&self, id: &str, patch: DocumentData) -> Result<(), AppError>;
    async fn delete_blog_post(&self, id: &str) -> Result<(), AppError>;
    async fn increment_counter(&self, id: &str, counter: Counter) -> Result<(), AppError>;
}

impl StoreBlogPostRepo {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        StoreBlogPostRepo { store }
    }
}

#[async_trait]
impl BlogPostRepository for StoreBlogPostRepo {
    async fn find_blog_posts(&self, query: Query) -> Result<Vec<BlogPost>, AppError> {
        let docs = self.store.query(BLOG, &query).await?;
        Ok(decode_all(docs, BlogPost::from_document))
    }

    async fn get_blog_post_by_id(&self, id: &str) -> Result<Option<BlogPost>, AppError> {
        match self.store.get(BLOG, id).await? {
            Some(doc) => Ok(Some(BlogPost::from_document(doc)?)),
            None => Ok(None),
        }
    }

    async fn create_blog_post(&self, post: &BlogPostInsert) -> Result<String, AppError> {
        let data = to_document(post)?;
        Ok(self.store.insert(BLOG, data).await?)
    }

    async fn update_blog_post(&self, id: &str, patch: DocumentData) -> Result<(), AppError> {
        Ok(self.store.update(BLOG, id, patch).await?)
    }

    async fn delete_blog_post(&self, id: &str) -> Result<(), AppError> {
        Ok(self.store.delete(BLOG, id).await?)
    }

    async fn increment_counter(&self, id: &str, counter: Counter) -> Result<(), AppError> {
        Ok(self.store.increment(BLOG, id, counter.field(), 1).await?)
    }
}
