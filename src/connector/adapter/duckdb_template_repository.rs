use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use duckdb::{params, Connection, Row};
use tokio::sync::Mutex;
use tracing::debug;

use super::duckdb_record_store::{
    from_json_column, open_in_memory_record_connection, open_record_connection, to_json_column,
};
use crate::application::TemplateRepository;
use crate::domain::{ActivityTemplate, DomainError, HomeworkTemplate};

const HOMEWORK_COLUMNS: &str =
    "template_id, name, objective, proficiency_level, class_id, questions, created_at";
const ACTIVITY_COLUMNS: &str =
    "template_id, name, objective, proficiency_level, class_id, conversation_template, created_at";

/// Columns shared by both template tables; `body` holds the JSON column
/// (questions or conversation template).
struct TemplateRow {
    template_id: i64,
    name: String,
    objective: String,
    proficiency_level: String,
    class_id: i64,
    body: Option<String>,
    created_at: i64,
}

impl TemplateRow {
    fn read(row: &Row<'_>) -> duckdb::Result<Self> {
        Ok(Self {
            template_id: row.get(0)?,
            name: row.get(1)?,
            objective: row.get(2)?,
            proficiency_level: row.get(3)?,
            class_id: row.get(4)?,
            body: row.get(5)?,
            created_at: row.get(6)?,
        })
    }

    fn into_homework(self) -> Result<HomeworkTemplate, DomainError> {
        let mut template =
            HomeworkTemplate::new(self.name, self.objective, self.proficiency_level, self.class_id)
                .with_id(self.template_id);
        template.questions = from_json_column(self.body, "questions")?;
        template.created_at = self.created_at;
        Ok(template)
    }

    fn into_activity(self) -> Result<ActivityTemplate, DomainError> {
        let conversation = from_json_column(self.body, "conversation_template")?;
        let mut template = ActivityTemplate::new(
            self.name,
            self.objective,
            self.proficiency_level,
            self.class_id,
            conversation,
        )
        .with_id(self.template_id);
        template.created_at = self.created_at;
        Ok(template)
    }
}

pub struct DuckdbTemplateRepository {
    conn: Arc<Mutex<Connection>>,
}

impl DuckdbTemplateRepository {
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

    async fn insert_row(
        &self,
        table: &str,
        body_column: &str,
        row: (&str, &str, &str, i64, String, i64),
    ) -> Result<i64, DomainError> {
        let (name, objective, level, class_id, body, created_at) = row;
        let conn = self.conn.lock().await;
        conn.query_row(
            &format!(
                "INSERT INTO {} (name, objective, proficiency_level, class_id, {}, created_at) \
                 VALUES (?, ?, ?, ?, ?, ?) RETURNING template_id",
                table, body_column
            ),
            params![name, objective, level, class_id, body, created_at],
            |row| row.get(0),
        )
        .map_err(|e| DomainError::storage(format!("Failed to insert into {}: {}", table, e)))
    }

    async fn select_rows(
        &self,
        sql: &str,
        param: Option<i64>,
    ) -> Result<Vec<TemplateRow>, DomainError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| DomainError::storage(format!("Failed to prepare statement: {}", e)))?;

        let rows = match param {
            Some(p) => stmt.query_map(params![p], TemplateRow::read),
            None => stmt.query_map([], TemplateRow::read),
        }
        .map_err(|e| DomainError::storage(format!("Failed to query templates: {}", e)))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| DomainError::storage(format!("Failed to read template row: {}", e)))?;

        Ok(rows)
    }
}

#[async_trait]
impl TemplateRepository for DuckdbTemplateRepository {
    async fn insert_homework_template(
        &self,
        template: &HomeworkTemplate,
    ) -> Result<HomeworkTemplate, DomainError> {
        let id = self
            .insert_row(
                "homework_templates",
                "questions",
                (
                    template.name.as_str(),
                    template.objective.as_str(),
                    template.proficiency_level.as_str(),
                    template.class_id,
                    to_json_column(&template.questions)?,
                    template.created_at,
                ),
            )
            .await?;

        debug!("Inserted homework template {} ({})", id, template.name);
        Ok(template.clone().with_id(id))
    }

    async fn find_homework_template(
        &self,
        id: i64,
    ) -> Result<Option<HomeworkTemplate>, DomainError> {
        self.select_rows(
            &format!(
                "SELECT {} FROM homework_templates WHERE template_id = ?",
                HOMEWORK_COLUMNS
            ),
            Some(id),
        )
        .await?
        .into_iter()
        .next()
        .map(TemplateRow::into_homework)
        .transpose()
    }

    async fn list_homework_templates(&self) -> Result<Vec<HomeworkTemplate>, DomainError> {
        self.select_rows(
            &format!(
                "SELECT {} FROM homework_templates ORDER BY template_id",
                HOMEWORK_COLUMNS
            ),
            None,
        )
        .await?
        .into_iter()
        .map(TemplateRow::into_homework)
        .collect()
    }

    async fn insert_activity_template(
        &self,
        template: &ActivityTemplate,
    ) -> Result<ActivityTemplate, DomainError> {
        let id = self
            .insert_row(
                "activity_templates",
                "conversation_template",
                (
                    template.name.as_str(),
                    template.objective.as_str(),
                    template.proficiency_level.as_str(),
                    template.class_id,
                    to_json_column(&template.conversation_template)?,
                    template.created_at,
                ),
            )
            .await?;

        debug!("Inserted activity template {} ({})", id, template.name);
        Ok(template.clone().with_id(id))
    }

    async fn find_activity_template(
        &self,
        id: i64,
    ) -> Result<Option<ActivityTemplate>, DomainError> {
        self.select_rows(
            &format!(
                "SELECT {} FROM activity_templates WHERE template_id = ?",
                ACTIVITY_COLUMNS
            ),
            Some(id),
        )
        .await?
        .into_iter()
        .next()
        .map(TemplateRow::into_activity)
        .transpose()
    }

    async fn find_activity_template_for_class(
        &self,
        class_id: i64,
    ) -> Result<Option<ActivityTemplate>, DomainError> {
        self.select_rows(
            &format!(
                "SELECT {} FROM activity_templates WHERE class_id = ? ORDER BY template_id LIMIT 1",
                ACTIVITY_COLUMNS
            ),
            Some(class_id),
        )
        .await?
        .into_iter()
        .next()
        .map(TemplateRow::into_activity)
        .transpose()
    }

    async fn list_activity_templates(&self) -> Result<Vec<ActivityTemplate>, DomainError> {
        self.select_rows(
            &format!(
                "SELECT {} FROM activity_templates ORDER BY template_id",
                ACTIVITY_COLUMNS
            ),
            None,
        )
        .await?
        .into_iter()
        .map(TemplateRow::into_activity)
        .collect()
    }
}
