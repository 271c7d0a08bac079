mod find_compatible_students;
mod generate_homework;
mod generate_pairings;
mod import_records;
mod personalization_prompt;
mod question_parser;
mod search_templates;
mod store_stats;
mod sync_records;

pub use find_compatible_students::*;
pub use generate_homework::*;
pub use generate_pairings::*;
pub use import_records::*;
pub use personalization_prompt::*;
pub use question_parser::*;
pub use search_templates::*;
pub use store_stats::*;
pub use sync_records::*;
