use std::sync::Arc;

use tracing::info;

use crate::application::{EmbeddingService, VectorRepository};
use crate::domain::{Collection, DomainError, MetadataFilter, Student, VectorMatch, VectorQuery};

/// Finds students whose synced profiles read most like a given student's.
pub struct FindCompatibleStudentsUseCase {
    vector_repo: Arc<dyn VectorRepository>,
    embedding_service: Arc<dyn EmbeddingService>,
}

impl FindCompatibleStudentsUseCase {
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
        student_id: i64,
        limit: usize,
        proficiency_level: Option<&str>,
    ) -> Result<Vec<VectorMatch>, DomainError> {
        let profile = self
            .vector_repo
            .get(Collection::StudentProfiles, &Student::vector_id(student_id))
            .await?
            .ok_or_else(|| {
                DomainError::not_found(format!(
                    "No synced profile for student {}; run sync first",
                    student_id
                ))
            })?;

        let mut query = VectorQuery::new(profile.text())
            .with_limit(limit)
            .with_filter(MetadataFilter::not_eq("student_id", student_id.to_string()));
        if let Some(level) = proficiency_level {
            query = query.with_filter(MetadataFilter::eq("proficiency_level", level));
        }

        let embedding = self.embedding_service.embed_query(profile.text()).await?;
        let matches = self
            .vector_repo
            .search(Collection::StudentProfiles, &embedding, &query)
            .await?;

        info!(
            "Found {} compatible students for student {}",
            matches.len(),
            student_id
        );
        Ok(matches)
    }
}
