use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use duckdb::{params, Connection, Row};
use tokio::sync::Mutex;
use tracing::debug;

use super::duckdb_record_store::{
    from_json_column, open_in_memory_record_connection, open_record_connection, to_json_column,
};
use crate::application::AssignmentRepository;
use crate::domain::{ActivityGroup, DomainError, GenerationStatus, PersonalizedHomework};

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct DuckdbAssignmentRepository {
    conn: Arc<Mutex<Connection>>,
}

struct HomeworkRow {
    homework_id: i64,
    template_id: i64,
    student_id: i64,
    generated_at: i64,
    generation_status: String,
    personalized_questions: Option<String>,
}

impl HomeworkRow {
    fn read(row: &Row<'_>) -> duckdb::Result<Self> {
        Ok(Self {
            homework_id: row.get(0)?,
            template_id: row.get(1)?,
            student_id: row.get(2)?,
            generated_at: row.get(3)?,
            generation_status: row.get(4)?,
            personalized_questions: row.get(5)?,
        })
    }

    fn into_homework(self) -> Result<PersonalizedHomework, DomainError> {
        Ok(PersonalizedHomework {
            homework_id: Some(self.homework_id),
            template_id: self.template_id,
            student_id: self.student_id,
            generated_at: self.generated_at,
            generation_status: GenerationStatus::parse(&self.generation_status),
            personalized_questions: from_json_column(
                self.personalized_questions,
                "personalized_questions",
            )?,
        })
    }
}

impl DuckdbAssignmentRepository {
    pub fn new(db_path: &Path) -> Result<Self, DomainError> {
        Ok(Self {
            conn: open_record_connection(db_path)?,
        })
    }

    pub fn with_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    pub fn in_memory() -> Result<Self, DomainError> {
        Ok(Self {
            conn: open_in_memory_record_connection()?,
        })
    }

    fn read_group(row: &Row<'_>) -> duckdb::Result<(i64, i64, i64, i64, String, Option<String>)> {
        Ok((
            row.get(0)?,
            row.get(1)?,
            row.get(2)?,
            row.get(3)?,
            row.get(4)?,
            row.get(5)?,
        ))
    }
}

#[async_trait]
impl AssignmentRepository for DuckdbAssignmentRepository {
    async fn insert_homework(
        &self,
        homework: &PersonalizedHomework,
    ) -> Result<PersonalizedHomework, DomainError> {
        let questions = to_json_column(&homework.personalized_questions)?;

        let conn = self.conn.lock().await;
        let id: i64 = conn
            .query_row(
                r#"
                INSERT INTO personalized_homework
                    (template_id, student_id, generated_at, generation_status, personalized_questions)
                VALUES (?, ?, ?, ?, ?)
                RETURNING homework_id
                "#,
                params![
                    homework.template_id,
                    homework.student_id,
                    homework.generated_at,
                    homework.generation_status.as_str(),
                    questions,
                ],
                |row| row.get(0),
            )
            .map_err(|e| DomainError::storage(format!("Failed to insert homework: {}", e)))?;

        debug!(
            "Inserted homework {} for student {}",
            id, homework.student_id
        );
        Ok(homework.clone().with_id(id))
    }

    async fn list_homework_for_student(
        &self,
        student_id: i64,
    ) -> Result<Vec<PersonalizedHomework>, DomainError> {
        let rows = {
            let conn = self.conn.lock().await;
            let mut stmt = conn
                .prepare(
                    "SELECT homework_id, template_id, student_id, generated_at, generation_status, \
                     personalized_questions FROM personalized_homework \
                     WHERE student_id = ? ORDER BY homework_id",
                )
                .map_err(|e| DomainError::storage(format!("Failed to prepare statement: {}", e)))?;
            let rows = stmt
                .query_map(params![student_id], HomeworkRow::read)
                .map_err(|e| DomainError::storage(format!("Failed to query homework: {}", e)))?
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| DomainError::storage(format!("Failed to read homework row: {}", e)))?;
            rows
        };

        rows.into_iter().map(HomeworkRow::into_homework).collect()
    }

    async fn count_homework(&self) -> Result<u64, DomainError> {
        let conn = self.conn.lock().await;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM personalized_homework", [], |row| {
                row.get(0)
            })
            .map_err(|e| DomainError::storage(format!("Failed to count homework: {}", e)))?;
        Ok(count as u64)
    }

    async fn insert_activity_group(
        &self,
        group: &ActivityGroup,
    ) -> Result<ActivityGroup, DomainError> {
        let conn = self.conn.lock().await;
        let id: i64 = conn
            .query_row(
                r#"
                INSERT INTO activity_groups
                    (activity_template_id, student_id_1, student_id_2, completion_date, notes)
                VALUES (?, ?, ?, ?, ?)
                RETURNING group_id
                "#,
                params![
                    group.activity_template_id,
                    group.student_id_1,
                    group.student_id_2,
                    group.completion_date.format(DATE_FORMAT).to_string(),
                    group.notes,
                ],
                |row| row.get(0),
            )
            .map_err(|e| DomainError::storage(format!("Failed to insert activity group: {}", e)))?;

        debug!(
            "Inserted activity group {} ({} + {})",
            id, group.student_id_1, group.student_id_2
        );
        Ok(group.clone().with_id(id))
    }

    async fn list_activity_groups(&self) -> Result<Vec<ActivityGroup>, DomainError> {
        let rows = {
            let conn = self.conn.lock().await;
            let mut stmt = conn
                .prepare(
                    "SELECT group_id, activity_template_id, student_id_1, student_id_2, \
                     completion_date, notes FROM activity_groups ORDER BY group_id",
                )
                .map_err(|e| DomainError::storage(format!("Failed to prepare statement: {}", e)))?;
            let rows = stmt
                .query_map([], Self::read_group)
                .map_err(|e| DomainError::storage(format!("Failed to query groups: {}", e)))?
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| DomainError::storage(format!("Failed to read group row: {}", e)))?;
            rows
        };

        rows.into_iter()
            .map(|(group_id, template_id, s1, s2, date, notes)| {
                let completion_date = NaiveDate::parse_from_str(&date, DATE_FORMAT).map_err(|e| {
                    DomainError::storage(format!("Invalid completion_date '{}': {}", date, e))
                })?;
                Ok(ActivityGroup {
                    group_id: Some(group_id),
                    activity_template_id: template_id,
                    student_id_1: s1,
                    student_id_2: s2,
                    completion_date,
                    notes,
                })
            })
            .collect()
    }
}
