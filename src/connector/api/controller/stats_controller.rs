use anyhow::Result;

use crate::StoreStats;

use super::super::Container;

pub struct StatsController<'a> {
    container: &'a Container,
}

impl<'a> StatsController<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }

    pub async fn stats(&self) -> Result<String> {
        let stats = self.container.stats_use_case().execute().await?;
        Ok(self.format_stats(&stats))
    }

    fn format_stats(&self, stats: &StoreStats) -> String {
        let mut output = format!(
            "ESL RAG Statistics\n==================\nStudents:              {}\nHomework Templates:    {}\nActivity Templates:    {}\nPersonalized Homework: {}\nActivity Groups:       {}\nRecord Store:          {}\nVector Store:          {}\n\nVector Documents:",
            stats.students,
            stats.homework_templates,
            stats.activity_templates,
            stats.personalized_homework,
            stats.activity_groups,
            self.container.database().display(),
            self.container.vector_store_label()
        );

        for (collection, count) in &stats.vector_documents {
            output.push_str(&format!("\n  {:<20} {}", collection, count));
        }

        let stale = stats.stale_collections();
        if !stale.is_empty() {
            output.push_str(&format!(
                "\n\nOut of date: {} (run `esl-rag sync`)",
                stale.join(", ")
            ));
        }

        output
    }
}
