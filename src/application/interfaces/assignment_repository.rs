use async_trait::async_trait;

use crate::domain::{ActivityGroup, DomainError, PersonalizedHomework};

/// Persistence for generated homework and activity groups.
#[async_trait]
pub trait AssignmentRepository: Send + Sync {
    async fn insert_homework(
        &self,
        homework: &PersonalizedHomework,
    ) -> Result<PersonalizedHomework, DomainError>;

    async fn list_homework_for_student(
        &self,
        student_id: i64,
    ) -> Result<Vec<PersonalizedHomework>, DomainError>;

    async fn count_homework(&self) -> Result<u64, DomainError>;

    async fn insert_activity_group(&self, group: &ActivityGroup)
        -> Result<ActivityGroup, DomainError>;

    async fn list_activity_groups(&self) -> Result<Vec<ActivityGroup>, DomainError>;
}
