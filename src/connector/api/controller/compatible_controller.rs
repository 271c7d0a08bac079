use anyhow::Result;

use super::super::Container;
use super::search_controller::format_matches;

pub struct CompatibleController<'a> {
    container: &'a Container,
}

impl<'a> CompatibleController<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }

    pub async fn compatible(
        &self,
        student_id: i64,
        num: usize,
        level: Option<String>,
    ) -> Result<String> {
        let use_case = self.container.compatible_use_case().await?;
        let results = use_case.execute(student_id, num, level.as_deref()).await?;

        Ok(format_matches(&results, "first_name", "student_id"))
    }
}
