use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::profile::current_timestamp;
use super::{Collection, Question, VectorDocument};
use crate::domain::DomainError;

/// Base homework assignment that gets personalized per student.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HomeworkTemplate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<i64>,
    pub name: String,
    pub objective: String,
    pub proficiency_level: String,
    pub class_id: i64,
    #[serde(default)]
    pub questions: Vec<Question>,
    #[serde(default = "current_timestamp")]
    pub created_at: i64,
}

impl HomeworkTemplate {
    pub fn new(
        name: impl Into<String>,
        objective: impl Into<String>,
        proficiency_level: impl Into<String>,
        class_id: i64,
    ) -> Self {
        Self {
            template_id: None,
            name: name.into(),
            objective: objective.into(),
            proficiency_level: proficiency_level.into(),
            class_id,
            questions: Vec::new(),
            created_at: current_timestamp(),
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.template_id = Some(id);
        self
    }

    pub fn with_question(mut self, question: Question) -> Self {
        self.questions.push(question);
        self
    }

    pub fn id(&self) -> Result<i64, DomainError> {
        self.template_id.ok_or_else(|| {
            DomainError::invalid_input(format!("Homework template {} has not been saved", self.name))
        })
    }

    pub fn vector_id(id: i64) -> String {
        format!("homework_template_{}", id)
    }

    pub fn document_text(&self) -> String {
        let questions = self
            .questions
            .iter()
            .map(Question::document_block)
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "Template Name: {}\nObjective: {}\n{}",
            self.name, self.objective, questions
        )
    }

    pub fn to_vector_document(&self) -> Result<VectorDocument, DomainError> {
        let id = self.id()?;
        Ok(VectorDocument::new(
            Self::vector_id(id),
            Collection::HomeworkTemplates,
            self.document_text(),
        )
        .with_metadata(template_metadata(
            id,
            self.class_id,
            &self.proficiency_level,
            &self.name,
            &self.objective,
        )))
    }
}

/// Scenario, roles and talking points for a paired speaking activity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationTemplate {
    #[serde(default)]
    pub scenario: String,
    #[serde(default)]
    pub instructions: String,
    #[serde(default)]
    pub prompts: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ConversationTemplate {
    pub fn new(scenario: impl Into<String>, instructions: impl Into<String>) -> Self {
        Self {
            scenario: scenario.into(),
            instructions: instructions.into(),
            prompts: Vec::new(),
            extra: Map::new(),
        }
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompts.push(prompt.into());
        self
    }

    pub fn document_text(&self) -> String {
        let prompts = self
            .prompts
            .iter()
            .map(|p| format!("- {}", p))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "Scenario: {}\nInstructions: {}\nPrompts:\n{}",
            self.scenario, self.instructions, prompts
        )
    }
}

/// Template for a two-student conversation activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityTemplate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<i64>,
    pub name: String,
    pub objective: String,
    pub proficiency_level: String,
    pub class_id: i64,
    #[serde(default)]
    pub conversation_template: ConversationTemplate,
    #[serde(default = "current_timestamp")]
    pub created_at: i64,
}

impl ActivityTemplate {
    pub fn new(
        name: impl Into<String>,
        objective: impl Into<String>,
        proficiency_level: impl Into<String>,
        class_id: i64,
        conversation_template: ConversationTemplate,
    ) -> Self {
        Self {
            template_id: None,
            name: name.into(),
            objective: objective.into(),
            proficiency_level: proficiency_level.into(),
            class_id,
            conversation_template,
            created_at: current_timestamp(),
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.template_id = Some(id);
        self
    }

    pub fn id(&self) -> Result<i64, DomainError> {
        self.template_id.ok_or_else(|| {
            DomainError::invalid_input(format!("Activity template {} has not been saved", self.name))
        })
    }

    pub fn vector_id(id: i64) -> String {
        format!("activity_template_{}", id)
    }

    pub fn document_text(&self) -> String {
        format!(
            "Template Name: {}\nObjective: {}\n{}",
            self.name,
            self.objective,
            self.conversation_template.document_text()
        )
    }

    pub fn to_vector_document(&self) -> Result<VectorDocument, DomainError> {
        let id = self.id()?;
        Ok(VectorDocument::new(
            Self::vector_id(id),
            Collection::ActivityTemplates,
            self.document_text(),
        )
        .with_metadata(template_metadata(
            id,
            self.class_id,
            &self.proficiency_level,
            &self.name,
            &self.objective,
        )))
    }
}

fn template_metadata(
    template_id: i64,
    class_id: i64,
    proficiency_level: &str,
    name: &str,
    objective: &str,
) -> BTreeMap<String, String> {
    let mut metadata = BTreeMap::new();
    metadata.insert("template_id".to_string(), template_id.to_string());
    metadata.insert("class_id".to_string(), class_id.to_string());
    metadata.insert("proficiency_level".to_string(), proficiency_level.to_string());
    metadata.insert("template_name".to_string(), name.to_string());
    metadata.insert("objective".to_string(), objective.to_string());
    metadata
}
