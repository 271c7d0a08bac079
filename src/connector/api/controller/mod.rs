pub mod compatible_controller;
pub mod homework_controller;
pub mod import_controller;
pub mod init_controller;
pub mod pairings_controller;
pub mod search_controller;
pub mod stats_controller;
pub mod sync_controller;

pub use compatible_controller::CompatibleController;
pub use homework_controller::HomeworkController;
pub use import_controller::ImportController;
pub use init_controller::InitController;
pub use pairings_controller::PairingsController;
pub use search_controller::SearchController;
pub use stats_controller::StatsController;
pub use sync_controller::SyncController;

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;

/// Pretty-prints a JSON result, writing it to `output` when given.
fn emit_json(value: &Value, output: Option<&Path>) -> Result<String> {
    let rendered = serde_json::to_string_pretty(value)?;
    match output {
        Some(path) => {
            std::fs::write(path, &rendered)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            Ok(format!("Results saved to {}", path.display()))
        }
        None => Ok(rendered),
    }
}
