use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::application::{StudentRepository, TemplateRepository};
use crate::domain::{ActivityTemplate, DomainError, HomeworkTemplate, Student};

/// The JSON document accepted by `import`.
#[derive(Debug, Default, Deserialize)]
pub struct ImportBundle {
    #[serde(default)]
    pub students: Vec<Student>,
    #[serde(default)]
    pub homework_templates: Vec<HomeworkTemplate>,
    #[serde(default)]
    pub activity_templates: Vec<ActivityTemplate>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportReport {
    pub students: Vec<i64>,
    pub skipped_students: Vec<String>,
    pub homework_templates: Vec<i64>,
    pub activity_templates: Vec<i64>,
}

/// Loads students and templates into the record store.
pub struct ImportRecordsUseCase {
    student_repo: Arc<dyn StudentRepository>,
    template_repo: Arc<dyn TemplateRepository>,
}

impl ImportRecordsUseCase {
    pub fn new(
        student_repo: Arc<dyn StudentRepository>,
        template_repo: Arc<dyn TemplateRepository>,
    ) -> Self {
        Self {
            student_repo,
            template_repo,
        }
    }

    pub async fn execute_file(&self, path: &Path) -> Result<ImportReport, DomainError> {
        let raw = tokio::fs::read_to_string(path).await?;
        let bundle: ImportBundle = serde_json::from_str(&raw).map_err(|e| {
            DomainError::parse(format!("Invalid import file {}: {}", path.display(), e))
        })?;
        self.execute(bundle).await
    }

    pub async fn execute(&self, bundle: ImportBundle) -> Result<ImportReport, DomainError> {
        let mut report = ImportReport::default();

        for student in bundle.students {
            if self.student_repo.find_by_email(&student.email).await?.is_some() {
                warn!("Student {} already exists, skipping", student.email);
                report.skipped_students.push(student.email);
                continue;
            }
            let saved = self.student_repo.insert(&student).await?;
            report.students.push(saved.id()?);
        }

        for template in bundle.homework_templates {
            let saved = self.template_repo.insert_homework_template(&template).await?;
            report.homework_templates.push(saved.id()?);
        }

        for template in bundle.activity_templates {
            let saved = self.template_repo.insert_activity_template(&template).await?;
            report.activity_templates.push(saved.id()?);
        }

        info!(
            "Imported {} students ({} skipped), {} homework templates, {} activity templates",
            report.students.len(),
            report.skipped_students.len(),
            report.homework_templates.len(),
            report.activity_templates.len()
        );
        Ok(report)
    }
}
