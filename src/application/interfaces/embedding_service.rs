use async_trait::async_trait;

use crate::domain::{DomainError, Embedding, EmbeddingConfig, VectorDocument};

/// Generates vector embeddings from documents and queries.
#[async_trait]
pub trait EmbeddingService: Send + Sync {
    async fn embed_document(&self, document: &VectorDocument) -> Result<Embedding, DomainError>;

    async fn embed_documents(
        &self,
        documents: &[VectorDocument],
    ) -> Result<Vec<Embedding>, DomainError>;

    async fn embed_query(&self, query: &str) -> Result<Vec<f32>, DomainError>;

    fn config(&self) -> &EmbeddingConfig;
}
