use std::path::PathBuf;

use anyhow::Result;
use serde_json::json;
use tracing::error;

use super::super::Container;
use super::emit_json;

pub struct PairingsController<'a> {
    container: &'a Container,
}

impl<'a> PairingsController<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }

    pub async fn pairings(
        &self,
        class_id: i64,
        template_id: Option<i64>,
        no_save: bool,
        output: Option<PathBuf>,
    ) -> Result<String> {
        let use_case = self.container.pairings_use_case();
        let value = match use_case.execute(class_id, template_id, !no_save).await {
            Ok(plan) => serde_json::to_value(&plan)?,
            Err(e) => {
                error!("Pairing generation failed: {}", e);
                json!({
                    "error": e.message(),
                    "class_id": class_id,
                    "template_id": template_id,
                })
            }
        };

        emit_json(&value, output.as_deref())
    }
}
