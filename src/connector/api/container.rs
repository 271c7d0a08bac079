use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::application::{AssignmentRepository, ChatClient, StudentRepository, TemplateRepository};
use crate::cli::LlmProvider;
use crate::{
    open_record_connection, AnthropicClient, ChromaVectorRepository, DomainError,
    DuckdbAssignmentRepository, DuckdbStudentRepository, DuckdbTemplateRepository,
    DuckdbVectorRepository, EmbeddingService, FindCompatibleStudentsUseCase,
    GenerateHomeworkUseCase, GeneratePairingsUseCase, ImportRecordsUseCase,
    InMemoryVectorRepository, MockChatClient, MockEmbedding, OpenAiClient, OrtEmbedding,
    SearchTemplatesUseCase, StoreStatsUseCase, SyncRecordsUseCase, VectorRepository,
};

const VECTOR_DB_FILE: &str = "vectors.duckdb";

pub struct ContainerConfig {
    pub database: PathBuf,
    pub persist_dir: PathBuf,
    pub namespace: String,
    pub chroma_url: Option<String>,
    pub memory_storage: bool,
    pub mock_embeddings: bool,
    pub llm_provider: LlmProvider,
    /// Explicit key; when absent the provider's environment variable is used.
    pub api_key: Option<String>,
    pub model: Option<String>,
    /// Fail instead of falling back to in-memory vectors when the configured
    /// store cannot be opened.
    pub require_persistent_vectors: bool,
}

/// Wires adapters into use cases for one CLI invocation.
///
/// The embedding model and the chat client are built on first use, so
/// commands that never embed or prompt (`import`, `pairings`, `stats`) neither
/// download a model nor need an API key.
pub struct Container {
    student_repo: Arc<dyn StudentRepository>,
    template_repo: Arc<dyn TemplateRepository>,
    assignment_repo: Arc<dyn AssignmentRepository>,
    vector_repo: Arc<dyn VectorRepository>,
    vector_store_label: String,
    embedding_service: OnceCell<Arc<dyn EmbeddingService>>,
    chat_client: OnceCell<Arc<dyn ChatClient>>,
    config: ContainerConfig,
}

impl Container {
    pub async fn new(config: ContainerConfig) -> Result<Self> {
        let conn = open_record_connection(&config.database)?;
        debug!("Opened record store at {}", config.database.display());

        let student_repo: Arc<dyn StudentRepository> =
            Arc::new(DuckdbStudentRepository::with_connection(Arc::clone(&conn)));
        let template_repo: Arc<dyn TemplateRepository> =
            Arc::new(DuckdbTemplateRepository::with_connection(Arc::clone(&conn)));
        let assignment_repo: Arc<dyn AssignmentRepository> =
            Arc::new(DuckdbAssignmentRepository::with_connection(conn));

        let (vector_repo, vector_store_label) = Self::build_vector_repo(&config).await?;

        Ok(Self {
            student_repo,
            template_repo,
            assignment_repo,
            vector_repo,
            vector_store_label,
            embedding_service: OnceCell::new(),
            chat_client: OnceCell::new(),
            config,
        })
    }

    /// Opens the configured vector backend and names the one actually in use.
    async fn build_vector_repo(
        config: &ContainerConfig,
    ) -> Result<(Arc<dyn VectorRepository>, String)> {
        if config.memory_storage {
            debug!("Using in-memory vector storage");
            return Ok((Arc::new(InMemoryVectorRepository::new()), "in-memory".to_string()));
        }

        let (opened, label): (Result<Arc<dyn VectorRepository>, DomainError>, String) =
            match config.chroma_url.as_deref() {
                Some(chroma_url) => (
                    ChromaVectorRepository::new(chroma_url, &config.namespace)
                        .await
                        .map(|chroma| Arc::new(chroma) as Arc<dyn VectorRepository>),
                    format!("chroma ({})", chroma_url),
                ),
                None => {
                    let db_path = config.persist_dir.join(VECTOR_DB_FILE);
                    (
                        DuckdbVectorRepository::new_with_namespace(&db_path, &config.namespace)
                            .map(|duckdb| Arc::new(duckdb) as Arc<dyn VectorRepository>),
                        format!("duckdb ({})", db_path.display()),
                    )
                }
            };

        match opened {
            Ok(repo) => {
                debug!("Using vector storage {} namespace {}", label, config.namespace);
                Ok((repo, label))
            }
            Err(e) if config.require_persistent_vectors => {
                Err(anyhow::anyhow!("Failed to open vector store {}: {}", label, e))
            }
            Err(e) => {
                warn!(
                    "Failed to open vector store {}: {}. Falling back to in-memory storage.",
                    label, e
                );
                Ok((
                    Arc::new(InMemoryVectorRepository::new()),
                    format!("in-memory (fallback, {} unavailable)", label),
                ))
            }
        }
    }

    pub async fn embedding_service(&self) -> Result<Arc<dyn EmbeddingService>> {
        let service = self
            .embedding_service
            .get_or_try_init(|| async {
                let service: Arc<dyn EmbeddingService> = if self.config.mock_embeddings {
                    debug!("Using mock embedding service");
                    Arc::new(MockEmbedding::new())
                } else {
                    debug!("Initializing ONNX embedding service...");
                    Arc::new(OrtEmbedding::new(None)?)
                };
                Ok::<_, anyhow::Error>(service)
            })
            .await?;
        Ok(Arc::clone(service))
    }

    pub async fn chat_client(&self) -> Result<Arc<dyn ChatClient>> {
        let client = self
            .chat_client
            .get_or_try_init(|| async {
                let api_key = self.config.api_key.clone();
                let model = self.config.model.clone();
                let client: Arc<dyn ChatClient> = match self.config.llm_provider {
                    LlmProvider::Openai => Arc::new(OpenAiClient::from_env(api_key, model)?),
                    LlmProvider::Anthropic => {
                        Arc::new(AnthropicClient::from_env(api_key, model)?)
                    }
                    LlmProvider::Mock => Arc::new(MockChatClient::new()),
                };
                debug!("Using chat model {}", client.model_name());
                Ok::<_, anyhow::Error>(client)
            })
            .await?;
        Ok(Arc::clone(client))
    }

    pub fn import_use_case(&self) -> ImportRecordsUseCase {
        ImportRecordsUseCase::new(self.student_repo.clone(), self.template_repo.clone())
    }

    pub async fn sync_use_case(&self) -> Result<SyncRecordsUseCase> {
        Ok(SyncRecordsUseCase::new(
            self.student_repo.clone(),
            self.template_repo.clone(),
            self.vector_repo.clone(),
            self.embedding_service().await?,
        ))
    }

    pub async fn homework_use_case(&self) -> Result<GenerateHomeworkUseCase> {
        Ok(GenerateHomeworkUseCase::new(
            self.student_repo.clone(),
            self.template_repo.clone(),
            self.assignment_repo.clone(),
            self.vector_repo.clone(),
            self.embedding_service().await?,
            self.chat_client().await?,
        ))
    }

    pub fn pairings_use_case(&self) -> GeneratePairingsUseCase {
        GeneratePairingsUseCase::new(
            self.student_repo.clone(),
            self.template_repo.clone(),
            self.assignment_repo.clone(),
        )
    }

    pub async fn search_use_case(&self) -> Result<SearchTemplatesUseCase> {
        Ok(SearchTemplatesUseCase::new(
            self.vector_repo.clone(),
            self.embedding_service().await?,
        ))
    }

    pub async fn compatible_use_case(&self) -> Result<FindCompatibleStudentsUseCase> {
        Ok(FindCompatibleStudentsUseCase::new(
            self.vector_repo.clone(),
            self.embedding_service().await?,
        ))
    }

    pub fn stats_use_case(&self) -> StoreStatsUseCase {
        StoreStatsUseCase::new(
            self.student_repo.clone(),
            self.template_repo.clone(),
            self.assignment_repo.clone(),
            self.vector_repo.clone(),
        )
    }

    pub fn database(&self) -> &std::path::Path {
        &self.config.database
    }

    pub fn namespace(&self) -> &str {
        &self.config.namespace
    }

    /// Human-readable name of the active vector backend.
    pub fn vector_store_label(&self) -> &str {
        &self.vector_store_label
    }
}
