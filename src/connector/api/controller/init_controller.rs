use anyhow::Result;

use super::super::Container;

pub struct InitController<'a> {
    container: &'a Container,
}

impl<'a> InitController<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }

    pub async fn init(&self) -> Result<String> {
        let stats = self.container.stats_use_case().initialize().await?;

        Ok(format!(
            "Initialized record store at {}\nVector store: {} (namespace {})\nStudents: {}, Homework templates: {}, Activity templates: {}",
            self.container.database().display(),
            self.container.vector_store_label(),
            self.container.namespace(),
            stats.students,
            stats.homework_templates,
            stats.activity_templates
        ))
    }
}
