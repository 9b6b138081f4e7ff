use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::answers::{Answer, Answers};
use crate::spec::{Question, QuestionId, Schema};

pub type VisibleSet = BTreeSet<QuestionId>;

/// How the answer store reconciles answers with visibility after a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VisibilityStrategy {
    /// One evaluation followed by one prune. A question hidden only through
    /// a chain stays visible until the next change.
    OnePass,
    /// Evaluate and prune until the visible set stops changing.
    #[default]
    Settled,
}

/// Whether a stored answer unlocks the questions depending on it.
pub fn is_satisfied(answer: Option<&Answer>) -> bool {
    answer.is_some_and(Answer::is_satisfied)
}

/// A question is visible when every question it depends on is satisfied.
/// A dependency on a question missing from `schema` is never satisfied, even
/// if a stale answer for it is still around.
pub fn is_visible(schema: &Schema, question: &Question, answers: &Answers) -> bool {
    question
        .conditional
        .iter()
        .all(|dep| schema.contains_question(dep.as_str()) && is_satisfied(answers.get(dep)))
}

/// Evaluates every question once against the current answers.
pub fn visible_set(schema: &Schema, answers: &Answers) -> VisibleSet {
    schema
        .questions()
        .filter(|question| is_visible(schema, question, answers))
        .map(|question| question.id.clone())
        .collect()
}

/// Drops answers to hidden questions until evaluation and answers agree.
/// Returns the final visible set; `answers` then only holds visible keys.
pub fn settle(schema: &Schema, answers: &mut Answers) -> VisibleSet {
    let mut rounds = 0usize;
    loop {
        rounds += 1;
        let visible = visible_set(schema, answers);
        let before = answers.len();
        answers.retain(|id, _| visible.contains(id));
        if answers.len() == before {
            if rounds > 1 {
                tracing::debug!(rounds, "visibility settled");
            }
            return visible;
        }
    }
}

/// Recomputes visibility and prunes `answers` according to `strategy`.
pub fn reconcile(schema: &Schema, answers: &mut Answers, strategy: VisibilityStrategy) -> VisibleSet {
    match strategy {
        VisibilityStrategy::OnePass => {
            let visible = visible_set(schema, answers);
            answers.retain(|id, _| visible.contains(id));
            visible
        }
        VisibilityStrategy::Settled => settle(schema, answers),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> Schema {
        serde_json::from_value(json!({
            "jobId": "job-unit",
            "sections": [{
                "id": "s1",
                "title": "General",
                "questions": [
                    { "id": "q1", "label": "One" },
                    { "id": "q2", "label": "Two" },
                    { "id": "q3", "label": "Three", "conditional": ["q1", "q2"] },
                    { "id": "q4", "label": "Four", "conditional": ["gone"] }
                ]
            }]
        }))
        .expect("schema")
    }

    #[test]
    fn unconditional_question_is_always_visible() {
        let schema = schema();
        let q = schema.question("q1").expect("q1");
        assert!(is_visible(&schema, q, &Answers::new()));
    }

    #[test]
    fn every_dependency_must_be_satisfied() {
        let schema = schema();
        let q = schema.question("q3").expect("q3");
        let mut answers = Answers::new();
        answers.insert("q1".into(), Answer::from("yes"));
        assert!(!is_visible(&schema, q, &answers));
        answers.insert("q2".into(), Answer::Choices(vec!["a".into()]));
        assert!(is_visible(&schema, q, &answers));
        answers.insert("q2".into(), Answer::Choices(vec![]));
        assert!(!is_visible(&schema, q, &answers));
    }

    #[test]
    fn stale_answer_does_not_satisfy_a_dangling_dependency() {
        let schema = schema();
        let q = schema.question("q4").expect("q4");
        let mut answers = Answers::new();
        answers.insert("gone".into(), Answer::from("stale"));
        assert!(!is_visible(&schema, q, &answers));
        assert!(!visible_set(&schema, &answers).contains(&q.id));
    }

    #[test]
    fn number_answers_are_satisfied_when_non_zero() {
        assert!(is_satisfied(Some(&Answer::from(3))));
        assert!(!is_satisfied(Some(&Answer::from(0))));
        assert!(!is_satisfied(Some(&Answer::from(""))));
        assert!(!is_satisfied(None));
    }
}
