use anyhow::Result;

use crate::{CollectionSync, SyncReport};

use super::super::Container;

pub struct SyncController<'a> {
    container: &'a Container,
}

impl<'a> SyncController<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }

    pub async fn sync(&self, force: bool) -> Result<String> {
        let use_case = self.container.sync_use_case().await?;
        let report = use_case.execute(force).await?;
        Ok(self.format_sync(&report))
    }

    fn format_sync(&self, report: &SyncReport) -> String {
        let lines: Vec<String> = [
            &report.homework_templates,
            &report.activity_templates,
            &report.student_profiles,
        ]
        .into_iter()
        .map(|c: &CollectionSync| {
            let mut line = format!(
                "  {:<20} {:>4} synced ({} written, {} unchanged",
                c.collection.name(),
                c.total(),
                c.written,
                c.unchanged
            );
            if c.removed > 0 {
                line.push_str(&format!(", {} removed", c.removed));
            }
            line.push(')');
            line
        })
        .collect();

        format!(
            "Sync completed in {:.2}s\n{}",
            report.duration_secs,
            lines.join("\n")
        )
    }
}
