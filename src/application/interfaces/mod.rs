mod assignment_repository;
mod chat_client;
mod embedding_service;
mod student_repository;
mod template_repository;
mod vector_repository;

pub use assignment_repository::*;
pub use chat_client::*;
pub use embedding_service::*;
pub use student_repository::*;
pub use template_repository::*;
pub use vector_repository::*;
