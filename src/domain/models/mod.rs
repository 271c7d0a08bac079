mod assignments;
mod embedding;
mod profile;
mod question;
mod student;
mod templates;
mod vector_document;

pub use assignments::*;
pub use embedding::*;
pub use profile::{section_text, Interest, ProfileSection};
pub use question::*;
pub use student::*;
pub use templates::*;
pub use vector_document::*;
