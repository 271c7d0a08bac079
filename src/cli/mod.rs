use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "esl-rag")]
#[command(author, version, about = "Personalized ESL homework and activity pairings", long_about = None)]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Record database file
    #[arg(long, global = true, default_value = "./esl_app.duckdb")]
    pub database: PathBuf,

    /// Directory holding the vector store
    #[arg(long, global = true, default_value = "./chroma_db")]
    pub persist_dir: PathBuf,

    #[arg(long, global = true, default_value = "main")]
    pub namespace: String,

    /// Use a Chroma server instead of the local vector store
    #[arg(long, global = true)]
    pub chroma_url: Option<String>,

    #[arg(long, global = true)]
    pub memory_storage: bool,

    #[arg(long, global = true)]
    pub mock_embeddings: bool,

    #[arg(long, global = true, value_enum, default_value_t = LlmProvider::Openai)]
    pub llm_provider: LlmProvider,

    /// API key for the LLM provider (defaults to the provider's env variable)
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    #[arg(long, global = true)]
    pub model: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LlmProvider {
    Openai,
    Anthropic,
    /// Canned offline responses
    Mock,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TemplateKind {
    Homework,
    Activity,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create the record schema and vector collections
    Init,

    /// Load students and templates from a JSON file
    Import { file: PathBuf },

    /// Copy records into the vector store
    Sync {
        /// Re-embed every record, ignoring stored content hashes
        #[arg(short, long)]
        force: bool,
    },

    /// Generate personalized homework for a student
    Homework {
        #[arg(long)]
        student_id: i64,

        #[arg(long)]
        template_id: Option<i64>,

        #[arg(long)]
        class_id: Option<i64>,

        #[arg(long)]
        no_save: bool,

        /// Write the JSON result to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Pair students for a conversation activity
    Pairings {
        #[arg(long)]
        class_id: i64,

        #[arg(long)]
        template_id: Option<i64>,

        #[arg(long)]
        no_save: bool,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Similarity search over homework or activity templates
    Search {
        query: String,

        #[arg(long, value_enum, default_value_t = TemplateKind::Homework)]
        kind: TemplateKind,

        #[arg(long)]
        class_id: Option<i64>,

        #[arg(long)]
        level: Option<String>,

        #[arg(long, default_value = "5")]
        num: usize,
    },

    /// Find students with similar profiles
    Compatible {
        #[arg(long)]
        student_id: i64,

        #[arg(long, default_value = "5")]
        num: usize,

        #[arg(long)]
        level: Option<String>,
    },

    Stats,

    /// Run a local Chroma server over the persist directory
    Server {
        #[arg(long, default_value = "localhost")]
        host: String,

        #[arg(long, default_value = "8000")]
        port: u16,

        #[arg(long, default_value = "chroma")]
        chroma_bin: String,
    },
}

impl Commands {
    /// Commands that write the vector store must not run against an
    /// in-memory stand-in.
    pub fn requires_persistent_vectors(&self) -> bool {
        matches!(self, Commands::Init | Commands::Sync { .. })
    }
}
