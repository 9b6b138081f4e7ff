use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::graph::DependencyGraph;
use crate::spec::question::{Question, QuestionId, QuestionRecord, SectionId};
use crate::spec::section::{Section, SectionDocument};

/// Reasons a wire document cannot become a [`Schema`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("question id '{0}' is used more than once")]
    DuplicateQuestion(QuestionId),
    #[error("section id '{0}' is used more than once")]
    DuplicateSection(SectionId),
    #[error("question '{0}' lists itself as a dependency")]
    SelfDependency(QuestionId),
}

/// Immutable assessment snapshot.
///
/// Sections keep the display order; question bodies are stored once in a
/// table keyed by id so dependency lookups and cascades never walk the
/// section tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SchemaDocument", into = "SchemaDocument")]
pub struct Schema {
    pub(crate) job_id: String,
    pub(crate) title: Option<String>,
    pub(crate) updated_at: i64,
    pub(crate) sections: Vec<Section>,
    pub(crate) questions: BTreeMap<QuestionId, Question>,
}

impl Schema {
    /// Empty schema for a job that has no assessment yet.
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            title: None,
            updated_at: 0,
            sections: Vec::new(),
            questions: BTreeMap::new(),
        }
    }

    /// Stamps the persistence identity onto a snapshot; used by repositories
    /// when a save is accepted.
    pub fn with_revision(mut self, job_id: impl Into<String>, updated_at: i64) -> Self {
        self.job_id = job_id.into();
        self.updated_at = updated_at;
        self
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Server timestamp (milliseconds) of the last accepted save.
    pub fn updated_at(&self) -> i64 {
        self.updated_at
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn section(&self, id: &str) -> Option<&Section> {
        self.sections.iter().find(|section| section.id.as_str() == id)
    }

    pub fn question(&self, id: &str) -> Option<&Question> {
        self.questions.get(id)
    }

    pub fn contains_question(&self, id: &str) -> bool {
        self.questions.contains_key(id)
    }

    /// Section that owns the given question.
    pub fn section_of(&self, question_id: &str) -> Option<&Section> {
        self.sections
            .iter()
            .find(|section| section.contains(question_id))
    }

    /// All questions in display order (sections first, then position).
    pub fn questions(&self) -> impl Iterator<Item = &Question> + '_ {
        self.sections
            .iter()
            .flat_map(|section| section.questions.iter())
            .filter_map(|id| self.questions.get(id))
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn dependency_graph(&self) -> DependencyGraph<'_> {
        DependencyGraph::build(self)
    }
}

/// JSON Schema of the wire document, for API consumers.
pub fn document_json_schema() -> schemars::Schema {
    schemars::schema_for!(SchemaDocument)
}

/// Wire shape of a schema, exactly as exchanged with the persistence API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SchemaDocument {
    pub job_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub sections: Vec<SectionDocument>,
    #[serde(default)]
    pub updated_at: i64,
}

impl TryFrom<SchemaDocument> for Schema {
    type Error = SchemaError;

    fn try_from(document: SchemaDocument) -> Result<Self, Self::Error> {
        let mut sections = Vec::with_capacity(document.sections.len());
        let mut questions = BTreeMap::new();

        for section_doc in document.sections {
            if sections
                .iter()
                .any(|section: &Section| section.id == section_doc.id)
            {
                return Err(SchemaError::DuplicateSection(section_doc.id));
            }
            let mut section = Section::new(section_doc.id);
            section.title = section_doc.title;
            for record in section_doc.questions {
                let question = Question::from(record);
                if question.depends_on(question.id.as_str()) {
                    return Err(SchemaError::SelfDependency(question.id));
                }
                if questions.contains_key(&question.id) {
                    return Err(SchemaError::DuplicateQuestion(question.id));
                }
                section.questions.push(question.id.clone());
                questions.insert(question.id.clone(), question);
            }
            sections.push(section);
        }

        let schema = Schema {
            job_id: document.job_id,
            title: document.title,
            updated_at: document.updated_at,
            sections,
            questions,
        };

        let cycles = schema.dependency_graph().cycles();
        if !cycles.is_empty() {
            tracing::warn!(
                job_id = %schema.job_id,
                cycles = cycles.len(),
                "assessment has cyclic conditional dependencies; visibility depends on evaluation order"
            );
        }

        Ok(schema)
    }
}

impl From<Schema> for SchemaDocument {
    fn from(mut schema: Schema) -> Self {
        let sections = schema
            .sections
            .into_iter()
            .map(|section| SectionDocument {
                id: section.id,
                title: section.title,
                questions: section
                    .questions
                    .iter()
                    .filter_map(|id| schema.questions.remove(id))
                    .map(QuestionRecord::from)
                    .collect(),
            })
            .collect();

        SchemaDocument {
            job_id: schema.job_id,
            title: schema.title,
            sections,
            updated_at: schema.updated_at,
        }
    }
}
