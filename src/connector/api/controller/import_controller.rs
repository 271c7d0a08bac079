use std::path::PathBuf;

use anyhow::Result;

use crate::ImportReport;

use super::super::Container;

pub struct ImportController<'a> {
    container: &'a Container,
}

impl<'a> ImportController<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }

    pub async fn import(&self, file: PathBuf) -> Result<String> {
        let report = self.container.import_use_case().execute_file(&file).await?;
        Ok(self.format_import(&report))
    }

    fn format_import(&self, report: &ImportReport) -> String {
        let mut output = format!(
            "Imported {} students, {} homework templates, {} activity templates",
            report.students.len(),
            report.homework_templates.len(),
            report.activity_templates.len()
        );

        if !report.skipped_students.is_empty() {
            output.push_str(&format!(
                "\nSkipped existing students: {}",
                report.skipped_students.join(", ")
            ));
        }

        output
    }
}
