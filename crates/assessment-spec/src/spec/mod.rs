pub mod question;
pub mod schema;
pub mod section;

pub use question::{Question, QuestionId, QuestionKind, QuestionRecord, QuestionType, SectionId};
pub use schema::{Schema, SchemaDocument, SchemaError, document_json_schema};
pub use section::{Section, SectionDocument};
