use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Number;

use crate::spec::{QuestionId, Schema};
use crate::visibility::{VisibilityStrategy, VisibleSet, reconcile};

/// A single respondent answer as it travels over the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    /// Free text, a single option, a numeric value typed as text, or a file name.
    Text(String),
    Number(Number),
    /// Selected options of a multiple-choice question.
    Choices(Vec<String>),
}

impl Answer {
    /// Truthiness used by conditional dependencies: non-empty text, a
    /// non-empty selection, or a non-zero number.
    pub fn is_satisfied(&self) -> bool {
        match self {
            Answer::Text(text) => !text.is_empty(),
            Answer::Number(number) => number.as_f64().is_some_and(|value| value != 0.0),
            Answer::Choices(choices) => !choices.is_empty(),
        }
    }
}

impl From<&str> for Answer {
    fn from(value: &str) -> Self {
        Answer::Text(value.to_string())
    }
}

impl From<String> for Answer {
    fn from(value: String) -> Self {
        Answer::Text(value)
    }
}

impl From<i32> for Answer {
    fn from(value: i32) -> Self {
        Answer::Number(value.into())
    }
}

impl From<i64> for Answer {
    fn from(value: i64) -> Self {
        Answer::Number(value.into())
    }
}

impl From<Vec<String>> for Answer {
    fn from(value: Vec<String>) -> Self {
        Answer::Choices(value)
    }
}

/// Answers keyed by question id; a missing key means "unanswered".
pub type Answers = BTreeMap<QuestionId, Answer>;

/// Keeps only answers to visible questions. Idempotent for a fixed `visible`.
pub fn prune(answers: &Answers, visible: &VisibleSet) -> Answers {
    answers
        .iter()
        .filter(|(id, _)| visible.contains(*id))
        .map(|(id, answer)| (id.clone(), answer.clone()))
        .collect()
}

/// In-progress answers of one respondent.
///
/// Every mutation re-evaluates visibility and prunes before returning, so
/// the store never holds an answer to a hidden question.
#[derive(Debug, Clone, Default)]
pub struct AnswerStore {
    answers: Answers,
    visible: VisibleSet,
    strategy: VisibilityStrategy,
}

impl AnswerStore {
    pub fn new(schema: &Schema, strategy: VisibilityStrategy) -> Self {
        Self::with_answers(schema, Answers::new(), strategy)
    }

    /// Starts from previously collected answers, pruning the ones that are
    /// not visible.
    pub fn with_answers(schema: &Schema, answers: Answers, strategy: VisibilityStrategy) -> Self {
        let mut store = Self {
            answers,
            visible: VisibleSet::new(),
            strategy,
        };
        store.refresh(schema);
        store
    }

    pub fn answers(&self) -> &Answers {
        &self.answers
    }

    pub fn visible(&self) -> &VisibleSet {
        &self.visible
    }

    pub fn get(&self, id: &str) -> Option<&Answer> {
        self.answers.get(id)
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    pub fn set(&mut self, schema: &Schema, id: QuestionId, answer: Answer) -> &VisibleSet {
        self.answers.insert(id, answer);
        self.refresh(schema)
    }

    pub fn clear(&mut self, schema: &Schema, id: &str) -> &VisibleSet {
        self.answers.remove(id);
        self.refresh(schema)
    }

    /// Re-derives visibility for the current answers and prunes.
    pub fn refresh(&mut self, schema: &Schema) -> &VisibleSet {
        let before = self.answers.len();
        self.visible = reconcile(schema, &mut self.answers, self.strategy);
        let dropped = before - self.answers.len();
        if dropped > 0 {
            tracing::debug!(dropped, "pruned answers to hidden questions");
        }
        &self.visible
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.answers)
    }
}
