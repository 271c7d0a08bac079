use std::path::Path;
use std::sync::Arc;

use duckdb::Connection;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::debug;

use crate::domain::DomainError;

/// Opens (creating if needed) the record database and its schema.
///
/// The student, template and assignment adapters all share the returned
/// connection, since DuckDB allows a single writer per file.
pub fn open_record_connection(db_path: &Path) -> Result<Arc<Mutex<Connection>>, DomainError> {
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let conn = Connection::open(db_path)
        .map_err(|e| DomainError::storage(format!("Failed to open DuckDB database: {}", e)))?;
    initialize_record_schema(&conn)?;
    Ok(Arc::new(Mutex::new(conn)))
}

pub fn open_in_memory_record_connection() -> Result<Arc<Mutex<Connection>>, DomainError> {
    let conn = Connection::open_in_memory()
        .map_err(|e| DomainError::storage(format!("Failed to open DuckDB in-memory DB: {}", e)))?;
    initialize_record_schema(&conn)?;
    Ok(Arc::new(Mutex::new(conn)))
}

fn initialize_record_schema(conn: &Connection) -> Result<(), DomainError> {
    conn.execute_batch(
        r#"
        CREATE SEQUENCE IF NOT EXISTS student_id_seq START 1;
        CREATE TABLE IF NOT EXISTS students (
            student_id BIGINT PRIMARY KEY DEFAULT nextval('student_id_seq'),
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            proficiency_level TEXT NOT NULL,
            created_at BIGINT NOT NULL,
            basic_info TEXT,
            personal_background TEXT,
            professional_background TEXT,
            learning_context TEXT,
            interests TEXT,
            cultural_elements TEXT,
            social_aspects TEXT
        );

        CREATE SEQUENCE IF NOT EXISTS homework_template_id_seq START 1;
        CREATE TABLE IF NOT EXISTS homework_templates (
            template_id BIGINT PRIMARY KEY DEFAULT nextval('homework_template_id_seq'),
            name TEXT NOT NULL,
            objective TEXT NOT NULL,
            proficiency_level TEXT NOT NULL,
            class_id BIGINT NOT NULL,
            questions TEXT NOT NULL,
            created_at BIGINT NOT NULL
        );

        CREATE SEQUENCE IF NOT EXISTS activity_template_id_seq START 1;
        CREATE TABLE IF NOT EXISTS activity_templates (
            template_id BIGINT PRIMARY KEY DEFAULT nextval('activity_template_id_seq'),
            name TEXT NOT NULL,
            objective TEXT NOT NULL,
            proficiency_level TEXT NOT NULL,
            class_id BIGINT NOT NULL,
            conversation_template TEXT NOT NULL,
            created_at BIGINT NOT NULL
        );

        CREATE SEQUENCE IF NOT EXISTS homework_id_seq START 1;
        CREATE TABLE IF NOT EXISTS personalized_homework (
            homework_id BIGINT PRIMARY KEY DEFAULT nextval('homework_id_seq'),
            template_id BIGINT NOT NULL REFERENCES homework_templates(template_id),
            student_id BIGINT NOT NULL REFERENCES students(student_id),
            generated_at BIGINT NOT NULL,
            generation_status TEXT NOT NULL,
            personalized_questions TEXT NOT NULL
        );

        CREATE SEQUENCE IF NOT EXISTS group_id_seq START 1;
        CREATE TABLE IF NOT EXISTS activity_groups (
            group_id BIGINT PRIMARY KEY DEFAULT nextval('group_id_seq'),
            activity_template_id BIGINT NOT NULL REFERENCES activity_templates(template_id),
            student_id_1 BIGINT NOT NULL REFERENCES students(student_id),
            student_id_2 BIGINT NOT NULL REFERENCES students(student_id),
            completion_date TEXT NOT NULL,
            notes TEXT
        );
        "#,
    )
    .map_err(|e| DomainError::storage(format!("Failed to initialize schema: {}", e)))?;

    debug!("DuckDB record schema initialized");
    Ok(())
}

pub(crate) fn to_json_column<T: Serialize>(value: &T) -> Result<String, DomainError> {
    serde_json::to_string(value)
        .map_err(|e| DomainError::storage(format!("Failed to encode JSON column: {}", e)))
}

/// Decodes a JSON text column; NULL reads as the type's default.
pub(crate) fn from_json_column<T: DeserializeOwned + Default>(
    raw: Option<String>,
    column: &str,
) -> Result<T, DomainError> {
    match raw {
        None => Ok(T::default()),
        Some(s) => serde_json::from_str(&s)
            .map_err(|e| DomainError::storage(format!("Corrupt JSON in column {}: {}", column, e))),
    }
}
