use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A free-form key/value block of a student profile (e.g. `learning_context`).
pub type ProfileSection = Map<String, Value>;

/// Reads `key` from a profile section as display text.
///
/// Missing keys and nulls render as an empty string; numbers and booleans
/// render as their JSON form so `"age": 30` reads as `30`.
pub fn section_text(section: &ProfileSection, key: &str) -> String {
    match section.get(key) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// A hobby or interest listed on a student profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Interest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Interest {
    pub fn new(
        name: impl Into<String>,
        category: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            description: description.into(),
            extra: Map::new(),
        }
    }
}

pub(crate) fn current_timestamp() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
