use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::application::use_cases::personalization_prompt::{
    build_personalization_prompt, PERSONALIZATION_SYSTEM_PROMPT,
};
use crate::application::use_cases::question_parser::extract_questions;
use crate::application::{
    AssignmentRepository, ChatClient, EmbeddingService, StudentRepository, TemplateRepository,
    VectorRepository,
};
use crate::domain::{
    Collection, DomainError, HomeworkTemplate, MetadataFilter, PersonalizedHomework, Question,
    Student, VectorQuery,
};

/// Number of template candidates fetched from the vector store.
const TEMPLATE_CANDIDATES: usize = 3;

#[derive(Debug, Clone)]
pub struct HomeworkRequest {
    pub student_id: i64,
    pub template_id: Option<i64>,
    pub class_id: Option<i64>,
    pub save: bool,
}

impl HomeworkRequest {
    pub fn new(student_id: i64) -> Self {
        Self {
            student_id,
            template_id: None,
            class_id: None,
            save: true,
        }
    }

    pub fn with_template(mut self, template_id: Option<i64>) -> Self {
        self.template_id = template_id;
        self
    }

    pub fn with_class(mut self, class_id: Option<i64>) -> Self {
        self.class_id = class_id;
        self
    }

    pub fn without_save(mut self) -> Self {
        self.save = false;
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HomeworkReport {
    pub template_id: i64,
    pub student_id: i64,
    pub template_name: String,
    pub student_name: String,
    pub proficiency_level: String,
    pub template_questions: Vec<Question>,
    pub personalized_questions: Vec<Question>,
    pub student_data: Student,
    pub generation_timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub homework_id: Option<i64>,
}

/// Retrieves a template for a student, asks the LLM to personalize it and
/// stores the result.
pub struct GenerateHomeworkUseCase {
    student_repo: Arc<dyn StudentRepository>,
    template_repo: Arc<dyn TemplateRepository>,
    assignment_repo: Arc<dyn AssignmentRepository>,
    vector_repo: Arc<dyn VectorRepository>,
    embedding_service: Arc<dyn EmbeddingService>,
    chat_client: Arc<dyn ChatClient>,
}

impl GenerateHomeworkUseCase {
    pub fn new(
        student_repo: Arc<dyn StudentRepository>,
        template_repo: Arc<dyn TemplateRepository>,
        assignment_repo: Arc<dyn AssignmentRepository>,
        vector_repo: Arc<dyn VectorRepository>,
        embedding_service: Arc<dyn EmbeddingService>,
        chat_client: Arc<dyn ChatClient>,
    ) -> Self {
        Self {
            student_repo,
            template_repo,
            assignment_repo,
            vector_repo,
            embedding_service,
            chat_client,
        }
    }

    pub async fn execute(&self, request: &HomeworkRequest) -> Result<HomeworkReport, DomainError> {
        let student = self
            .student_repo
            .find_by_id(request.student_id)
            .await?
            .ok_or_else(|| {
                DomainError::not_found(format!("Student with ID {} not found", request.student_id))
            })?;

        let template = self
            .select_template(&student, request.template_id, request.class_id)
            .await?;
        let template_id = template.id()?;

        info!(
            "Personalizing template {} ({}) for {}",
            template_id,
            template.name,
            student.full_name()
        );

        let prompt = build_personalization_prompt(&student, &template);
        debug!("Personalization prompt is {} chars", prompt.len());

        let response = self
            .chat_client
            .complete(PERSONALIZATION_SYSTEM_PROMPT, &prompt)
            .await?;

        let personalized_questions = extract_questions(&response);
        if personalized_questions.is_empty() {
            return Err(DomainError::llm(format!(
                "No questions could be extracted from the {} response",
                self.chat_client.model_name()
            )));
        }
        info!(
            "Extracted {} personalized questions",
            personalized_questions.len()
        );

        let homework_id = if request.save {
            let saved = self
                .assignment_repo
                .insert_homework(&PersonalizedHomework::completed(
                    template_id,
                    request.student_id,
                    personalized_questions.clone(),
                ))
                .await?;
            info!("Saved personalized homework {:?}", saved.homework_id);
            saved.homework_id
        } else {
            None
        };

        Ok(HomeworkReport {
            template_id,
            student_id: request.student_id,
            template_name: template.name.clone(),
            student_name: student.full_name(),
            proficiency_level: student.proficiency_level.clone(),
            template_questions: template.questions,
            personalized_questions,
            student_data: student,
            generation_timestamp: chrono::Local::now().to_rfc3339(),
            homework_id,
        })
    }

    /// Picks the template to personalize: the explicit one when given,
    /// otherwise the closest homework template to the student's profile.
    pub async fn select_template(
        &self,
        student: &Student,
        template_id: Option<i64>,
        class_id: Option<i64>,
    ) -> Result<HomeworkTemplate, DomainError> {
        if let Some(id) = template_id {
            return self.load_template(id).await;
        }

        let mut query = VectorQuery::new(student.retrieval_query()).with_limit(TEMPLATE_CANDIDATES);
        if let Some(class_id) = class_id {
            query = query.with_filter(MetadataFilter::eq("class_id", class_id.to_string()));
        }
        debug!("Template retrieval query: {} ({})", query.text(), query.summary());

        let embedding = self.embedding_service.embed_query(query.text()).await?;
        let matches = self
            .vector_repo
            .search(Collection::HomeworkTemplates, &embedding, &query)
            .await?;

        let best = matches
            .first()
            .ok_or_else(|| DomainError::not_found("No suitable homework templates found"))?;
        let id = best.record_id("template_id").ok_or_else(|| {
            DomainError::internal(format!(
                "Vector document {} has no template_id",
                best.document().id()
            ))
        })?;
        debug!("Best template match {} (score {:.3})", id, best.score());

        self.load_template(id).await
    }

    async fn load_template(&self, id: i64) -> Result<HomeworkTemplate, DomainError> {
        self.template_repo
            .find_homework_template(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Homework template with ID {} not found", id)))
    }
}
