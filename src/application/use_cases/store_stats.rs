use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::application::{
    AssignmentRepository, StudentRepository, TemplateRepository, VectorRepository,
};
use crate::domain::{Collection, DomainError};

/// Row counts on both sides of the sync.
#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    pub students: u64,
    pub homework_templates: u64,
    pub activity_templates: u64,
    pub personalized_homework: u64,
    pub activity_groups: u64,
    pub vector_documents: BTreeMap<String, u64>,
}

impl StoreStats {
    /// Collections holding fewer documents than their relational source.
    pub fn stale_collections(&self) -> Vec<&str> {
        let expected = [
            (Collection::HomeworkTemplates, self.homework_templates),
            (Collection::ActivityTemplates, self.activity_templates),
            (Collection::StudentProfiles, self.students),
        ];
        expected
            .into_iter()
            .filter(|(c, rows)| self.vector_documents.get(c.name()).copied().unwrap_or(0) < *rows)
            .map(|(c, _)| c.name())
            .collect()
    }
}

/// Prepares the stores and reports what they hold.
pub struct StoreStatsUseCase {
    student_repo: Arc<dyn StudentRepository>,
    template_repo: Arc<dyn TemplateRepository>,
    assignment_repo: Arc<dyn AssignmentRepository>,
    vector_repo: Arc<dyn VectorRepository>,
}

impl StoreStatsUseCase {
    pub fn new(
        student_repo: Arc<dyn StudentRepository>,
        template_repo: Arc<dyn TemplateRepository>,
        assignment_repo: Arc<dyn AssignmentRepository>,
        vector_repo: Arc<dyn VectorRepository>,
    ) -> Self {
        Self {
            student_repo,
            template_repo,
            assignment_repo,
            vector_repo,
        }
    }

    /// Creates any missing vector collections. The record schema is created
    /// when the record store is opened.
    pub async fn initialize(&self) -> Result<StoreStats, DomainError> {
        self.vector_repo.ensure_collections().await?;
        info!("Vector collections ready");
        self.execute().await
    }

    pub async fn execute(&self) -> Result<StoreStats, DomainError> {
        let mut vector_documents = BTreeMap::new();
        for collection in Collection::ALL {
            vector_documents.insert(
                collection.name().to_string(),
                self.vector_repo.count(collection).await?,
            );
        }

        let groups = self.assignment_repo.list_activity_groups().await?;

        Ok(StoreStats {
            students: self.student_repo.count().await?,
            homework_templates: self.template_repo.list_homework_templates().await?.len() as u64,
            activity_templates: self.template_repo.list_activity_templates().await?.len() as u64,
            personalized_homework: self.assignment_repo.count_homework().await?,
            activity_groups: groups.len() as u64,
            vector_documents,
        })
    }
}
