use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use reqwest::Client;
use serde::Serialize;
use tracing::{info, warn};

use super::tagged::TaggedCache;
use crate::errors::AppError;

/// Seam through which writers drop cached reads after a mutation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TagInvalidator: Send + Sync {
    /// Invalidates one tag group, returning the number of entries dropped.
    async fn invalidate_tag(&self, tag: &str) -> Result<usize, AppError>;

    async fn invalidate_all(&self) -> Result<usize, AppError>;
}

pub struct LocalInvalidator {
    cache: Arc<TaggedCache>,
}

impl LocalInvalidator {
    pub fn new(cache: Arc<TaggedCache>) -> Self {
        LocalInvalidator { cache }
    }
}

#[async_trait]
impl TagInvalidator for LocalInvalidator {
    async fn invalidate_tag(&self, tag: &str) -> Result<usize, AppError> {
        let removed = self.cache.invalidate_tag(tag);
        info!(tag, removed, "Invalidated cache tag");
        Ok(removed)
    }

    async fn invalidate_all(&self) -> Result<usize, AppError> {
        let removed = self.cache.invalidate_all();
        info!(removed, "Invalidated entire cache");
        Ok(removed)
    }
}

#[derive(Serialize)]
struct PeerRevalidation<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    tag: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    secret: Option<&'a str>,
}

/// Forwards invalidations to sibling instances' revalidate endpoints.
pub struct PeerInvalidator {
    client: Client,
    peers: Vec<String>,
    secret: Option<String>,
}

impl PeerInvalidator {
    pub fn new(client: Client, peers: Vec<String>, secret: Option<String>) -> Self {
        PeerInvalidator { client, peers, secret }
    }

    async fn broadcast(&self, body: PeerRevalidation<'_>) -> Result<usize, AppError> {
        let requests = self.peers.iter().map(|peer| {
            let request = self.client.post(peer).json(&body).send();
            async move {
                match request.await.and_then(|res| res.error_for_status()) {
                    Ok(_) => Ok(()),
                    Err(e) => {
                        warn!(peer = %peer, error = %e, "Peer revalidation failed");
                        Err(peer.as_str())
                    }
                }
            }
        });

        let results = join_all(requests).await;
        let failed: Vec<&str> = results.iter().filter_map(|r| r.err()).collect();

        if failed.is_empty() {
            Ok(results.len())
        } else {
            Err(AppError::InternalError(format!(
                "revalidation failed for peers: {}",
                failed.join(", ")
            )))
        }
    }
}

#[async_trait]
impl TagInvalidator for PeerInvalidator {
    async fn invalidate_tag(&self, tag: &str) -> Result<usize, AppError> {
        self.broadcast(PeerRevalidation {
            tag: Some(tag),
            path: None,
            secret: self.secret.as_deref(),
        })
        .await
    }

    async fn invalidate_all(&self) -> Result<usize, AppError> {
        self.broadcast(PeerRevalidation {
            tag: None,
            path: Some("/"),
            secret: self.secret.as_deref(),
        })
        .await
    }
}

/// Runs every inner invalidator, even after one fails. The count reported
/// is the first invalidator's.
pub struct FanOutInvalidator {
    targets: Vec<Arc<dyn TagInvalidator>>,
}

impl FanOutInvalidator {
    pub fn new(targets: Vec<Arc<dyn TagInvalidator>>) -> Self {
        FanOutInvalidator { targets }
    }

    fn collect(results: Vec<Result<usize, AppError>>) -> Result<usize, AppError> {
        let mut first = 0;
        let mut errors = Vec::new();
        for (i, result) in results.into_iter().enumerate() {
            match result {
                Ok(count) if i == 0 => first = count,
                Ok(_) => {}
                Err(e) => errors.push(e.to_string()),
            }
        }

        if errors.is_empty() {
            Ok(first)
        } else {
            Err(AppError::InternalError(errors.join("; ")))
        }
    }
}

#[async_trait]
impl TagInvalidator for FanOutInvalidator {
    async fn invalidate_tag(&self, tag: &str) -> Result<usize, AppError> {
        let results = join_all(self.targets.iter().map(|t| t.invalidate_tag(tag))).await;
        Self::collect(results)
    }

    async fn invalidate_all(&self) -> Result<usize, AppError> {
        let results = join_all(self.targets.iter().map(|t| t.invalidate_all())).await;
        Self::collect(results)
    }
}
