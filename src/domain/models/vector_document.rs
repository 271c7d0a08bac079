use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Metadata key holding the SHA-256 of a document's text.
pub const CONTENT_HASH_KEY: &str = "content_hash";
/// Metadata key holding the RFC 3339 time a document was (re)written.
pub const ADDED_AT_KEY: &str = "added_at";

/// The three vector-store collections kept in sync with the record store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    HomeworkTemplates,
    ActivityTemplates,
    StudentProfiles,
}

impl Collection {
    pub const ALL: [Collection; 3] = [
        Collection::HomeworkTemplates,
        Collection::ActivityTemplates,
        Collection::StudentProfiles,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Collection::HomeworkTemplates => "homework_templates",
            Collection::ActivityTemplates => "activity_templates",
            Collection::StudentProfiles => "student_profiles",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "homework_templates" | "homework" => Some(Collection::HomeworkTemplates),
            "activity_templates" | "activity" => Some(Collection::ActivityTemplates),
            "student_profiles" | "students" => Some(Collection::StudentProfiles),
            _ => None,
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A rendered record as stored in a vector collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorDocument {
    id: String,
    collection: Collection,
    text: String,
    metadata: BTreeMap<String, String>,
}

impl VectorDocument {
    pub fn new(id: impl Into<String>, collection: Collection, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            collection,
            text: text.into(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_metadata(mut self, metadata: BTreeMap<String, String>) -> Self {
        self.metadata.extend(metadata);
        self
    }

    pub fn with_metadata_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn collection(&self) -> Collection {
        self.collection
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }

    pub fn content_hash(&self) -> Option<&str> {
        self.metadata_value(CONTENT_HASH_KEY)
    }

    /// Stamps the content hash of the current text and the write time.
    pub fn stamped(self) -> Self {
        let hash = compute_content_hash(&self.text);
        let now = chrono::Utc::now().to_rfc3339();
        self.with_metadata_value(CONTENT_HASH_KEY, hash)
            .with_metadata_value(ADDED_AT_KEY, now)
    }

    pub fn matches(&self, filters: &[MetadataFilter]) -> bool {
        filters.iter().all(|f| f.matches(&self.metadata))
    }
}

/// Computes SHA-256 hash of document text.
pub fn compute_content_hash(content: &str) -> String {
    use sha2::{Digest, Sha256};
    let hash = Sha256::digest(content.as_bytes());
    format!("{:x}", hash)
}

/// Equality constraint on a string metadata value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetadataFilter {
    Eq(String, String),
    NotEq(String, String),
}

impl MetadataFilter {
    pub fn eq(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Eq(key.into(), value.into())
    }

    pub fn not_eq(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::NotEq(key.into(), value.into())
    }

    pub fn key(&self) -> &str {
        match self {
            Self::Eq(k, _) | Self::NotEq(k, _) => k,
        }
    }

    pub fn matches(&self, metadata: &BTreeMap<String, String>) -> bool {
        match self {
            Self::Eq(k, v) => metadata.get(k) == Some(v),
            Self::NotEq(k, v) => metadata.get(k) != Some(v),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorQuery {
    text: String,
    limit: usize,
    filters: Vec<MetadataFilter>,
}

impl VectorQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            limit: 5,
            filters: Vec::new(),
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.max(1);
        self
    }

    pub fn with_filter(mut self, filter: MetadataFilter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn filters(&self) -> &[MetadataFilter] {
        &self.filters
    }

    pub fn summary(&self) -> String {
        let mut parts = vec![format!("limit={}", self.limit)];
        for filter in &self.filters {
            match filter {
                MetadataFilter::Eq(k, v) => parts.push(format!("{}={}", k, v)),
                MetadataFilter::NotEq(k, v) => parts.push(format!("{}!={}", k, v)),
            }
        }
        parts.join(", ")
    }
}

/// A document returned by a similarity search; higher scores are closer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorMatch {
    document: VectorDocument,
    score: f32,
}

impl VectorMatch {
    pub fn new(document: VectorDocument, score: f32) -> Self {
        Self { document, score }
    }

    pub fn document(&self) -> &VectorDocument {
        &self.document
    }

    pub fn score(&self) -> f32 {
        self.score
    }

    /// Parses an integer id stored under `key` (e.g. `template_id`).
    pub fn record_id(&self, key: &str) -> Option<i64> {
        self.document.metadata_value(key)?.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collection_names_are_stable() {
        let names: Vec<_> = Collection::ALL.iter().map(|c| c.name()).collect();
        assert_eq!(
            names,
            vec!["homework_templates", "activity_templates", "student_profiles"]
        );
        assert_eq!(Collection::parse("homework"), Some(Collection::HomeworkTemplates));
        assert_eq!(Collection::parse("nope"), None);
    }

    #[test]
    fn filters_combine_with_and() {
        let doc = VectorDocument::new("student_profile_1", Collection::StudentProfiles, "text")
            .with_metadata_value("student_id", "1")
            .with_metadata_value("proficiency_level", "Advanced");

        assert!(doc.matches(&[MetadataFilter::eq("proficiency_level", "Advanced")]));
        assert!(!doc.matches(&[
            MetadataFilter::eq("proficiency_level", "Advanced"),
            MetadataFilter::not_eq("student_id", "1"),
        ]));
        assert!(doc.matches(&[MetadataFilter::not_eq("missing", "x")]));
    }

    #[test]
    fn stamped_records_hash_of_text() {
        let doc = VectorDocument::new("a", Collection::HomeworkTemplates, "hello").stamped();

        assert_eq!(doc.content_hash(), Some(compute_content_hash("hello").as_str()));
        assert!(doc.metadata_value(ADDED_AT_KEY).is_some());
    }

    #[test]
    fn match_parses_record_id() {
        let doc = VectorDocument::new("homework_template_4", Collection::HomeworkTemplates, "t")
            .with_metadata_value("template_id", "4");
        let hit = VectorMatch::new(doc, 0.9);

        assert_eq!(hit.record_id("template_id"), Some(4));
        assert_eq!(hit.record_id("class_id"), None);
    }
}
