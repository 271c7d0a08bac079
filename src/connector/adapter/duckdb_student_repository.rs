use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use duckdb::{params, Connection, Row};
use tokio::sync::Mutex;
use tracing::debug;

use super::duckdb_record_store::{
    from_json_column, open_in_memory_record_connection, open_record_connection, to_json_column,
};
use crate::application::StudentRepository;
use crate::domain::{DomainError, Student};

const STUDENT_COLUMNS: &str = "student_id, first_name, last_name, email, proficiency_level, created_at, \
     basic_info, personal_background, professional_background, learning_context, interests, \
     cultural_elements, social_aspects";

pub struct DuckdbStudentRepository {
    conn: Arc<Mutex<Connection>>,
}

/// Raw row as stored; JSON sections are decoded after the statement
/// finishes.
struct StudentRow {
    student_id: i64,
    first_name: String,
    last_name: String,
    email: String,
    proficiency_level: String,
    created_at: i64,
    sections: [Option<String>; 7],
}

impl StudentRow {
    fn read(row: &Row<'_>) -> duckdb::Result<Self> {
        Ok(Self {
            student_id: row.get(0)?,
            first_name: row.get(1)?,
            last_name: row.get(2)?,
            email: row.get(3)?,
            proficiency_level: row.get(4)?,
            created_at: row.get(5)?,
            sections: [
                row.get(6)?,
                row.get(7)?,
                row.get(8)?,
                row.get(9)?,
                row.get(10)?,
                row.get(11)?,
                row.get(12)?,
            ],
        })
    }

    fn into_student(self) -> Result<Student, DomainError> {
        let [basic, personal, professional, learning, interests, cultural, social] = self.sections;
        let mut student = Student::new(
            self.first_name,
            self.last_name,
            self.email,
            self.proficiency_level,
        )
        .with_id(self.student_id);
        student.created_at = self.created_at;
        student.basic_info = from_json_column(basic, "basic_info")?;
        student.personal_background = from_json_column(personal, "personal_background")?;
        student.professional_background =
            from_json_column(professional, "professional_background")?;
        student.learning_context = from_json_column(learning, "learning_context")?;
        student.interests = from_json_column(interests, "interests")?;
        student.cultural_elements = from_json_column(cultural, "cultural_elements")?;
        student.social_aspects = from_json_column(social, "social_aspects")?;
        Ok(student)
    }
}

impl DuckdbStudentRepository {
    pub fn new(db_path: &Path) -> Result<Self, DomainError> {
        Ok(Self {
            conn: open_record_connection(db_path)?,
        })
    }

    /// Create a new adapter on a connection already opened by
    /// [`open_record_connection`].
    pub fn with_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    pub fn in_memory() -> Result<Self, DomainError> {
        Ok(Self {
            conn: open_in_memory_record_connection()?,
        })
    }

    async fn query_one(
        &self,
        sql: &str,
        param: &(dyn duckdb::ToSql + Sync),
    ) -> Result<Option<Student>, DomainError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| DomainError::storage(format!("Failed to prepare statement: {}", e)))?;

        match stmt.query_row(params![param], StudentRow::read) {
            Ok(row) => Ok(Some(row.into_student()?)),
            Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(DomainError::storage(format!(
                "Failed to query student: {}",
                e
            ))),
        }
    }
}

#[async_trait]
impl StudentRepository for DuckdbStudentRepository {
    async fn insert(&self, student: &Student) -> Result<Student, DomainError> {
        let sections = [
            to_json_column(&student.basic_info)?,
            to_json_column(&student.personal_background)?,
            to_json_column(&student.professional_background)?,
            to_json_column(&student.learning_context)?,
            to_json_column(&student.interests)?,
            to_json_column(&student.cultural_elements)?,
            to_json_column(&student.social_aspects)?,
        ];

        let conn = self.conn.lock().await;
        let id: i64 = conn
            .query_row(
                r#"
                INSERT INTO students (first_name, last_name, email, proficiency_level, created_at,
                    basic_info, personal_background, professional_background, learning_context,
                    interests, cultural_elements, social_aspects)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                RETURNING student_id
                "#,
                params![
                    student.first_name,
                    student.last_name,
                    student.email,
                    student.proficiency_level,
                    student.created_at,
                    sections[0],
                    sections[1],
                    sections[2],
                    sections[3],
                    sections[4],
                    sections[5],
                    sections[6],
                ],
                |row| row.get(0),
            )
            .map_err(|e| {
                DomainError::storage(format!("Failed to insert student {}: {}", student.email, e))
            })?;

        debug!("Inserted student {} ({})", id, student.email);
        Ok(student.clone().with_id(id))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Student>, DomainError> {
        self.query_one(
            &format!("SELECT {} FROM students WHERE student_id = ?", STUDENT_COLUMNS),
            &id,
        )
        .await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Student>, DomainError> {
        self.query_one(
            &format!("SELECT {} FROM students WHERE email = ?", STUDENT_COLUMNS),
            &email,
        )
        .await
    }

    async fn list(&self) -> Result<Vec<Student>, DomainError> {
        let rows = {
            let conn = self.conn.lock().await;
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {} FROM students ORDER BY student_id",
                    STUDENT_COLUMNS
                ))
                .map_err(|e| DomainError::storage(format!("Failed to prepare statement: {}", e)))?;
            let rows = stmt
                .query_map([], StudentRow::read)
                .map_err(|e| DomainError::storage(format!("Failed to list students: {}", e)))?
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| DomainError::storage(format!("Failed to read student row: {}", e)))?;
            rows
        };

        rows.into_iter().map(StudentRow::into_student).collect()
    }

    async fn count(&self) -> Result<u64, DomainError> {
        let conn = self.conn.lock().await;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM students", [], |row| row.get(0))
            .map_err(|e| DomainError::storage(format!("Failed to count students: {}", e)))?;
        Ok(count as u64)
    }
}
