use async_trait::async_trait;

use crate::domain::{DomainError, Student};

/// Persistence for student records.
#[async_trait]
pub trait StudentRepository: Send + Sync {
    /// Inserts a new student and returns it with its assigned `student_id`.
    async fn insert(&self, student: &Student) -> Result<Student, DomainError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Student>, DomainError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Student>, DomainError>;

    /// All students ordered by `student_id`.
    async fn list(&self) -> Result<Vec<Student>, DomainError>;

    async fn count(&self) -> Result<u64, DomainError>;
}
