use async_trait::async_trait;

use crate::domain::{Collection, DomainError, Embedding, VectorDocument, VectorMatch, VectorQuery};

/// Vector storage and similarity search over the named collections.
#[async_trait]
pub trait VectorRepository: Send + Sync {
    /// Creates every collection in [`Collection::ALL`] if it does not exist.
    async fn ensure_collections(&self) -> Result<(), DomainError>;

    /// Inserts or replaces documents; `embeddings[i]` belongs to `documents[i]`.
    async fn upsert(
        &self,
        collection: Collection,
        documents: &[VectorDocument],
        embeddings: &[Embedding],
    ) -> Result<(), DomainError>;

    async fn get(
        &self,
        collection: Collection,
        id: &str,
    ) -> Result<Option<VectorDocument>, DomainError>;

    /// Ids of every document stored in `collection`.
    async fn list_ids(&self, collection: Collection) -> Result<Vec<String>, DomainError>;

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), DomainError>;

    /// Nearest documents first, restricted to those matching every filter.
    async fn search(
        &self,
        collection: Collection,
        query_embedding: &[f32],
        query: &VectorQuery,
    ) -> Result<Vec<VectorMatch>, DomainError>;

    async fn count(&self, collection: Collection) -> Result<u64, DomainError>;
}
