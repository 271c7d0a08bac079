use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::profile::{current_timestamp, section_text, Interest, ProfileSection};
use super::{Collection, VectorDocument};
use crate::domain::DomainError;

/// An ESL learner and their free-form profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_id: Option<i64>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub proficiency_level: String,
    #[serde(default = "current_timestamp")]
    pub created_at: i64,
    #[serde(default)]
    pub basic_info: ProfileSection,
    #[serde(default)]
    pub personal_background: ProfileSection,
    #[serde(default)]
    pub professional_background: ProfileSection,
    #[serde(default)]
    pub learning_context: ProfileSection,
    #[serde(default)]
    pub interests: Vec<Interest>,
    #[serde(default)]
    pub cultural_elements: ProfileSection,
    #[serde(default)]
    pub social_aspects: ProfileSection,
}

impl Student {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
        proficiency_level: impl Into<String>,
    ) -> Self {
        Self {
            student_id: None,
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            proficiency_level: proficiency_level.into(),
            created_at: current_timestamp(),
            basic_info: ProfileSection::new(),
            personal_background: ProfileSection::new(),
            professional_background: ProfileSection::new(),
            learning_context: ProfileSection::new(),
            interests: Vec::new(),
            cultural_elements: ProfileSection::new(),
            social_aspects: ProfileSection::new(),
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.student_id = Some(id);
        self
    }

    pub fn with_interest(mut self, interest: Interest) -> Self {
        self.interests.push(interest);
        self
    }

    /// The store-assigned identifier; unsaved students are rejected.
    pub fn id(&self) -> Result<i64, DomainError> {
        self.student_id.ok_or_else(|| {
            DomainError::invalid_input(format!("Student {} has not been saved", self.email))
        })
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn interest_names(&self) -> Vec<&str> {
        self.interests.iter().map(|i| i.name.as_str()).collect()
    }

    pub fn vector_id(id: i64) -> String {
        format!("student_profile_{}", id)
    }

    /// Renders the profile as the text embedded in the `student_profiles`
    /// collection.
    pub fn profile_text(&self) -> String {
        let basic = &self.basic_info;
        let personal = &self.personal_background;
        let professional = &self.professional_background;
        let learning = &self.learning_context;

        let mut lines = vec![
            format!("Student: {}", self.full_name()),
            format!("Proficiency Level: {}", self.proficiency_level),
            format!("Native Language: {}", section_text(basic, "native_language")),
            format!(
                "Country of Origin: {}",
                section_text(personal, "country_of_origin")
            ),
            format!("Hometown: {}", section_text(personal, "hometown")),
            format!(
                "Occupation: {} at {}",
                section_text(professional, "current_occupation"),
                section_text(professional, "company")
            ),
            format!("Industry: {}", section_text(professional, "industry")),
            format!(
                "Education Level: {}",
                section_text(professional, "education_level")
            ),
            format!("Learning Goals: {}", section_text(learning, "learning_goals")),
            format!(
                "Learning Style: {}",
                section_text(learning, "preferred_learning_style")
            ),
            format!("Strengths: {}", section_text(learning, "strengths")),
            format!(
                "Areas for Improvement: {}",
                section_text(learning, "areas_for_improvement")
            ),
            format!(
                "Cultural Background: {}",
                section_text(&self.cultural_elements, "cultural_background")
            ),
            format!(
                "Communication Style: {}",
                section_text(&self.social_aspects, "communication_style")
            ),
        ];

        if !self.interests.is_empty() {
            lines.push("Interests and Hobbies:".to_string());
            lines.extend(self.interests.iter().map(|interest| {
                format!(
                    "Interest/Hobby: {} ({}) - {}",
                    interest.name, interest.category, interest.description
                )
            }));
        }

        lines.join("\n")
    }

    /// Builds the similarity query used to pick a homework template for this
    /// student.
    pub fn retrieval_query(&self) -> String {
        let mut query = format!(
            "Student: {}, Proficiency Level: {}, ",
            self.full_name(),
            self.proficiency_level
        );

        if !self.interests.is_empty() {
            query.push_str(&format!("Interests: {}, ", self.interest_names().join(", ")));
        }

        if !self.professional_background.is_empty() {
            query.push_str(&format!(
                "Occupation: {}, ",
                section_text(&self.professional_background, "current_occupation")
            ));
        }

        if !self.learning_context.is_empty() {
            query.push_str(&format!(
                "Learning Goals: {}",
                section_text(&self.learning_context, "learning_goals")
            ));
        }

        query
    }

    pub fn to_vector_document(&self) -> Result<VectorDocument, DomainError> {
        let id = self.id()?;

        let mut metadata = BTreeMap::new();
        metadata.insert("student_id".to_string(), id.to_string());
        metadata.insert("first_name".to_string(), self.first_name.clone());
        metadata.insert("last_name".to_string(), self.last_name.clone());
        metadata.insert(
            "proficiency_level".to_string(),
            self.proficiency_level.clone(),
        );
        metadata.insert(
            "native_language".to_string(),
            section_text(&self.basic_info, "native_language"),
        );

        Ok(VectorDocument::new(
            Self::vector_id(id),
            Collection::StudentProfiles,
            self.profile_text(),
        )
        .with_metadata(metadata))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_student() -> Student {
        let mut student = Student::new("John", "Doe", "john.doe@example.com", "Intermediate")
            .with_id(1)
            .with_interest(Interest::new(
                "Programming",
                "Technology",
                "Enjoys coding in Python and JavaScript",
            ))
            .with_interest(Interest::new("Soccer", "Sports", "Plays on weekends"));
        student.basic_info = json!({"native_language": "Spanish", "age": 30})
            .as_object()
            .cloned()
            .unwrap();
        student.professional_background =
            json!({"current_occupation": "Software Engineer", "company": "Tech Solutions"})
                .as_object()
                .cloned()
                .unwrap();
        student.learning_context =
            json!({"learning_goals": "Improve business communication"})
                .as_object()
                .cloned()
                .unwrap();
        student
    }

    #[test]
    fn retrieval_query_includes_present_sections() {
        let query = sample_student().retrieval_query();

        assert_eq!(
            query,
            "Student: John Doe, Proficiency Level: Intermediate, \
             Interests: Programming, Soccer, Occupation: Software Engineer, \
             Learning Goals: Improve business communication"
        );
    }

    #[test]
    fn retrieval_query_skips_empty_sections() {
        let student = Student::new("Ana", "Lima", "ana@example.com", "Beginner");

        assert_eq!(
            student.retrieval_query(),
            "Student: Ana Lima, Proficiency Level: Beginner, "
        );
    }

    #[test]
    fn profile_text_lists_interests() {
        let text = sample_student().profile_text();

        assert!(text.starts_with("Student: John Doe\nProficiency Level: Intermediate"));
        assert!(text.contains("Native Language: Spanish"));
        assert!(text.contains("Occupation: Software Engineer at Tech Solutions"));
        assert!(text.contains("Interests and Hobbies:"));
        assert!(text.contains("Interest/Hobby: Soccer (Sports) - Plays on weekends"));
    }

    #[test]
    fn profile_text_omits_interest_header_without_interests() {
        let student = Student::new("Ana", "Lima", "ana@example.com", "Beginner");

        assert!(!student.profile_text().contains("Interests and Hobbies"));
    }

    #[test]
    fn unsaved_student_has_no_vector_document() {
        let student = Student::new("Ana", "Lima", "ana@example.com", "Beginner");

        assert!(student.to_vector_document().is_err());
    }

    #[test]
    fn vector_document_carries_metadata() {
        let doc = sample_student().to_vector_document().unwrap();

        assert_eq!(doc.id(), "student_profile_1");
        assert_eq!(doc.collection(), Collection::StudentProfiles);
        assert_eq!(doc.metadata_value("student_id"), Some("1"));
        assert_eq!(doc.metadata_value("native_language"), Some("Spanish"));
    }
}
