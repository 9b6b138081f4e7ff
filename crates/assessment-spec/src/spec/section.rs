use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::spec::question::{QuestionId, QuestionRecord, SectionId};

/// Ordered group of questions. The question bodies live in the schema's
/// question table; a section only holds their ids in display order.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub id: SectionId,
    pub title: String,
    pub(crate) questions: Vec<QuestionId>,
}

impl Section {
    pub const DEFAULT_TITLE: &'static str = "New Section";

    pub fn new(id: SectionId) -> Self {
        Self {
            id,
            title: Self::DEFAULT_TITLE.to_string(),
            questions: Vec::new(),
        }
    }

    pub fn question_ids(&self) -> &[QuestionId] {
        &self.questions
    }

    pub fn contains(&self, question_id: &str) -> bool {
        self.questions.iter().any(|id| id.as_str() == question_id)
    }
}

/// Wire shape of a section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SectionDocument {
    pub id: SectionId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub questions: Vec<QuestionRecord>,
}
