use std::path::PathBuf;

use anyhow::Result;
use serde_json::json;
use tracing::error;

use crate::HomeworkRequest;

use super::super::Container;
use super::emit_json;

pub struct HomeworkController<'a> {
    container: &'a Container,
}

impl<'a> HomeworkController<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }

    /// Domain failures are reported as `{"error": ...}` rather than
    /// propagated, so scripted callers always receive JSON.
    pub async fn homework(
        &self,
        student_id: i64,
        template_id: Option<i64>,
        class_id: Option<i64>,
        no_save: bool,
        output: Option<PathBuf>,
    ) -> Result<String> {
        let mut request = HomeworkRequest::new(student_id)
            .with_template(template_id)
            .with_class(class_id);
        if no_save {
            request = request.without_save();
        }

        let use_case = self.container.homework_use_case().await?;
        let value = match use_case.execute(&request).await {
            Ok(report) => serde_json::to_value(&report)?,
            Err(e) => {
                error!("Homework generation failed: {}", e);
                json!({
                    "error": e.message(),
                    "student_id": student_id,
                    "template_id": template_id,
                })
            }
        };

        emit_json(&value, output.as_deref())
    }
}
