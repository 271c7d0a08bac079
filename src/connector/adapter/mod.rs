mod anthropic_client;
mod chroma_server;
mod chroma_vector_repository;
mod duckdb_assignment_repository;
mod duckdb_record_store;
mod duckdb_student_repository;
mod duckdb_template_repository;
mod duckdb_vector_repository;
mod in_memory_vector_repository;
mod mock_chat_client;
mod mock_embedding;
mod openai_client;
mod ort_embedding;

pub use anthropic_client::AnthropicClient;
pub use chroma_server::*;
pub use chroma_vector_repository::*;
pub use duckdb_assignment_repository::*;
pub use duckdb_record_store::{open_in_memory_record_connection, open_record_connection};
pub use duckdb_student_repository::*;
pub use duckdb_template_repository::*;
pub use duckdb_vector_repository::*;
pub use in_memory_vector_repository::*;
pub use mock_chat_client::*;
pub use mock_embedding::*;
pub use openai_client::OpenAiClient;
pub use ort_embedding::*;
