use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::profile::current_timestamp;
use super::Question;

/// Lifecycle of a personalized homework generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum GenerationStatus {
    #[default]
    Queued,
    Processing,
    Completed,
    Failed,
}

impl GenerationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationStatus::Queued => "Queued",
            GenerationStatus::Processing => "Processing",
            GenerationStatus::Completed => "Completed",
            GenerationStatus::Failed => "Failed",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "queued" => GenerationStatus::Queued,
            "processing" => GenerationStatus::Processing,
            "completed" => GenerationStatus::Completed,
            "failed" => GenerationStatus::Failed,
            unknown => {
                warn!("Unknown generation status '{}', treating as Queued", unknown);
                GenerationStatus::Queued
            }
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, GenerationStatus::Completed)
    }
}

/// Homework generated for one student from one template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalizedHomework {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homework_id: Option<i64>,
    pub template_id: i64,
    pub student_id: i64,
    pub generated_at: i64,
    pub generation_status: GenerationStatus,
    #[serde(default)]
    pub personalized_questions: Vec<Question>,
}

impl PersonalizedHomework {
    pub fn completed(template_id: i64, student_id: i64, questions: Vec<Question>) -> Self {
        Self {
            homework_id: None,
            template_id,
            student_id,
            generated_at: current_timestamp(),
            generation_status: GenerationStatus::Completed,
            personalized_questions: questions,
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.homework_id = Some(id);
        self
    }
}

/// Two students paired on an activity template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityGroup {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<i64>,
    pub activity_template_id: i64,
    pub student_id_1: i64,
    pub student_id_2: i64,
    pub completion_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl ActivityGroup {
    pub fn new(
        activity_template_id: i64,
        student_id_1: i64,
        student_id_2: i64,
        completion_date: NaiveDate,
    ) -> Self {
        Self {
            group_id: None,
            activity_template_id,
            student_id_1,
            student_id_2,
            completion_date,
            notes: None,
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.group_id = Some(id);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_text() {
        for status in [
            GenerationStatus::Queued,
            GenerationStatus::Processing,
            GenerationStatus::Completed,
            GenerationStatus::Failed,
        ] {
            assert_eq!(GenerationStatus::parse(status.as_str()), status);
        }
        assert_eq!(GenerationStatus::parse("weird"), GenerationStatus::Queued);
    }

    #[test]
    fn completed_homework_is_marked_complete() {
        let homework = PersonalizedHomework::completed(1, 2, vec![Question::new("Q")]);

        assert!(homework.generation_status.is_complete());
        assert_eq!(homework.homework_id, None);
        assert_eq!(homework.personalized_questions.len(), 1);
    }
}
