use anyhow::Result;

use crate::cli::TemplateKind;
use crate::{Collection, VectorMatch};

use super::super::Container;

const PREVIEW_LINES: usize = 6;

pub struct SearchController<'a> {
    container: &'a Container,
}

impl<'a> SearchController<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }

    pub async fn search(
        &self,
        query: String,
        kind: TemplateKind,
        class_id: Option<i64>,
        level: Option<String>,
        num: usize,
    ) -> Result<String> {
        let collection = match kind {
            TemplateKind::Homework => Collection::HomeworkTemplates,
            TemplateKind::Activity => Collection::ActivityTemplates,
        };

        let use_case = self.container.search_use_case().await?;
        let results = use_case
            .search(collection, &query, num, class_id, level.as_deref())
            .await?;

        Ok(format_matches(&results, "template_name", "template_id"))
    }
}

/// Renders ranked matches with a short text preview.
pub(super) fn format_matches(results: &[VectorMatch], title_key: &str, id_key: &str) -> String {
    if results.is_empty() {
        return "No results found.".to_string();
    }

    let mut output = format!("Found {} results:\n", results.len());
    for (i, result) in results.iter().enumerate() {
        let doc = result.document();
        output.push_str(&format!(
            "\n{}. {} [{}={}] (score: {:.3})\n",
            i + 1,
            doc.metadata_value(title_key).unwrap_or(doc.id()),
            id_key,
            doc.metadata_value(id_key).unwrap_or("?"),
            result.score()
        ));
        if let Some(level) = doc.metadata_value("proficiency_level") {
            output.push_str(&format!("   Level: {}\n", level));
        }
        let preview: String = doc
            .text()
            .lines()
            .take(PREVIEW_LINES)
            .map(|l| format!("   | {}\n", l))
            .collect();
        output.push_str(&preview);
    }

    output
}
