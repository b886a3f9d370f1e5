use std::sync::Arc;

use tracing::warn;

use crate::{
    errors::DecodeError,
    store::{Document, DocumentStore},
};

#[derive(Clone)]
pub struct StoreProjectRepo {
    pub store: Arc<dyn DocumentStore>,
}

#[derive(Clone)]
pub struct StoreBlogPostRepo {
    pub store: Arc<dyn DocumentStore>,
}

#[derive(Clone)]
pub struct StoreContactRepo {
    pub store: Arc<dyn DocumentStore>,
}

/// Decodes each document, skipping (and logging) the ones that do not fit
/// the entity shape.
pub(crate) fn decode_all<T>(
    docs: Vec<Document>,
    decode: impl Fn(Document) -> Result<T, DecodeError>,
) -> Vec<T> {
    docs.into_iter()
        .filter_map(|doc| match decode(doc) {
            Ok(entity) => Some(entity),
            Err(e) => {
                warn!(collection = e.collection, id = %e.id, "Skipping document: {}", e.reason);
                None
            }
        })
        .collect()
}
