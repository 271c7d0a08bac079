pub mod application;
pub mod cli;
pub mod connector;
pub mod domain;

pub use application::{
    build_personalization_prompt, extract_questions, pair_students, AssignmentRepository,
    ChatClient, CollectionSync, EmbeddingService, FindCompatibleStudentsUseCase,
    GenerateHomeworkUseCase, GeneratePairingsUseCase, HomeworkReport, HomeworkRequest,
    ImportBundle, ImportRecordsUseCase, ImportReport, Pairing, PairingPlan,
    SearchTemplatesUseCase, StoreStats, StoreStatsUseCase, StudentRepository, SyncRecordsUseCase,
    SyncReport, TemplateRepository, TemplateSummary, VectorRepository,
    PERSONALIZATION_SYSTEM_PROMPT,
};

pub use cli::{Cli, Commands, LlmProvider, TemplateKind};

pub use connector::{
    open_in_memory_record_connection, open_record_connection, AnthropicClient, ChromaServer,
    ChromaVectorRepository, Container, ContainerConfig, DuckdbAssignmentRepository,
    DuckdbStudentRepository, DuckdbTemplateRepository, DuckdbVectorRepository,
    InMemoryVectorRepository, MockChatClient, MockEmbedding, OpenAiClient, OrtEmbedding, Router,
};

pub use domain::{
    compute_content_hash, ActivityGroup, ActivityTemplate, Collection, ConversationTemplate,
    DomainError, Embedding, EmbeddingConfig, GenerationStatus, HomeworkTemplate, Interest,
    MetadataFilter, PersonalizedHomework, ProfileSection, Question, Student, VectorDocument,
    VectorMatch, VectorQuery,
};
