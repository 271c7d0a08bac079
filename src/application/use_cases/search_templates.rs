use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use crate::application::{EmbeddingService, VectorRepository};
use crate::domain::{Collection, DomainError, MetadataFilter, VectorMatch, VectorQuery};

/// Free-text similarity search over one of the template collections.
pub struct SearchTemplatesUseCase {
    vector_repo: Arc<dyn VectorRepository>,
    embedding_service: Arc<dyn EmbeddingService>,
}

impl SearchTemplatesUseCase {
    pub fn new(
        vector_repo: Arc<dyn VectorRepository>,
        embedding_service: Arc<dyn EmbeddingService>,
    ) -> Self {
        Self {
            vector_repo,
            embedding_service,
        }
    }

    pub async fn execute(
        &self,
        collection: Collection,
        query: VectorQuery,
    ) -> Result<Vec<VectorMatch>, DomainError> {
        if collection == Collection::StudentProfiles {
            return Err(DomainError::invalid_input(
                "Template search only covers homework and activity templates",
            ));
        }

        info!(
            "Searching {} for: {} ({})",
            collection,
            query.text(),
            query.summary()
        );
        let start_time = Instant::now();

        let embedding = self.embedding_service.embed_query(query.text()).await?;
        let results = self.vector_repo.search(collection, &embedding, &query).await?;

        info!(
            "Found {} results in {:.2}s",
            results.len(),
            start_time.elapsed().as_secs_f64()
        );
        Ok(results)
    }

    pub async fn search(
        &self,
        collection: Collection,
        text: &str,
        limit: usize,
        class_id: Option<i64>,
        proficiency_level: Option<&str>,
    ) -> Result<Vec<VectorMatch>, DomainError> {
        let mut query = VectorQuery::new(text).with_limit(limit);
        if let Some(class_id) = class_id {
            query = query.with_filter(MetadataFilter::eq("class_id", class_id.to_string()));
        }
        if let Some(level) = proficiency_level {
            query = query.with_filter(MetadataFilter::eq("proficiency_level", level));
        }
        self.execute(collection, query).await
    }
}
