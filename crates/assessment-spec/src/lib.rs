#![allow(missing_docs)]

pub mod answers;
pub mod answers_schema;
pub mod config;
pub mod editor;
pub mod graph;
pub mod repository;
pub mod session;
pub mod spec;
pub mod submission;
pub mod validate;
pub mod visibility;

pub use answers::{Answer, AnswerStore, Answers, prune};
pub use answers_schema::generate as answers_schema;
pub use config::{ConfigError, EngineConfig};
pub use editor::{EditError, EditOp, QuestionPatch};
pub use graph::DependencyGraph;
pub use repository::{
    ConcurrencyPolicy, InMemoryRepository, RepositoryError, SchemaRepository, SubmissionRepository,
};
pub use session::{AuthoringSession, RespondentSession, SessionError, SessionState};
pub use spec::{
    Question, QuestionId, QuestionKind, QuestionType, Schema, SchemaDocument, SchemaError, Section,
    SectionId, document_json_schema,
};
pub use submission::{SubmissionReceipt, SubmissionRequest, assemble_submission};
pub use validate::{
    ErrorCode, ValidationError, ValidationPolicy, ValidationResult, validate, validate_with,
};
pub use visibility::{
    VisibilityStrategy, VisibleSet, is_satisfied, is_visible, reconcile, settle, visible_set,
};
