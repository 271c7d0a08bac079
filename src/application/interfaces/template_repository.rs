use async_trait::async_trait;

use crate::domain::{ActivityTemplate, DomainError, HomeworkTemplate};

/// Persistence for homework and activity templates.
#[async_trait]
pub trait TemplateRepository: Send + Sync {
    async fn insert_homework_template(
        &self,
        template: &HomeworkTemplate,
    ) -> Result<HomeworkTemplate, DomainError>;

    async fn find_homework_template(&self, id: i64)
        -> Result<Option<HomeworkTemplate>, DomainError>;

    async fn list_homework_templates(&self) -> Result<Vec<HomeworkTemplate>, DomainError>;

    async fn insert_activity_template(
        &self,
        template: &ActivityTemplate,
    ) -> Result<ActivityTemplate, DomainError>;

    async fn find_activity_template(&self, id: i64)
        -> Result<Option<ActivityTemplate>, DomainError>;

    /// The lowest-id activity template registered for `class_id`.
    async fn find_activity_template_for_class(
        &self,
        class_id: i64,
    ) -> Result<Option<ActivityTemplate>, DomainError>;

    async fn list_activity_templates(&self) -> Result<Vec<ActivityTemplate>, DomainError>;
}
