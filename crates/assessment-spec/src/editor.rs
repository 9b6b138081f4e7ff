//! Authoring operations. Each one takes the current snapshot and returns a
//! new one; the input schema is never modified.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Number;
use thiserror::Error;

use crate::spec::{Question, QuestionId, QuestionKind, QuestionType, Schema, Section, SectionId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("section '{0}' does not exist")]
    UnknownSection(SectionId),
    #[error("question '{0}' does not exist")]
    UnknownQuestion(QuestionId),
    #[error("section id '{0}' is already in use")]
    DuplicateSection(SectionId),
    #[error("question id '{0}' is already in use")]
    DuplicateQuestion(QuestionId),
    #[error("question '{0}' cannot depend on itself")]
    SelfDependency(QuestionId),
    #[error("making '{question}' depend on '{dependency}' would create a dependency cycle")]
    CyclicDependency {
        question: QuestionId,
        dependency: QuestionId,
    },
    #[error("'{field}' does not apply to {kind} questions")]
    ConstraintNotApplicable {
        field: &'static str,
        kind: QuestionType,
    },
}

/// Partial question update. Absent fields are left untouched; for the
/// nullable fields an explicit `null` clears the value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<Option<String>>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<QuestionType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub min: Option<Option<Number>>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub max: Option<Option<Number>>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_length: Option<Option<usize>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditional: Option<Vec<QuestionId>>,
}

// distinguishes `"field": null` (Some(None)) from a missing field (None)
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Serializable form of every editor operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum EditOp {
    AddSection {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<SectionId>,
    },
    RenameSection {
        section_id: SectionId,
        title: String,
    },
    DeleteSection {
        section_id: SectionId,
    },
    AddQuestion {
        section_id: SectionId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<QuestionId>,
    },
    UpdateQuestion {
        section_id: SectionId,
        question_id: QuestionId,
        patch: QuestionPatch,
    },
    DeleteQuestion {
        section_id: SectionId,
        question_id: QuestionId,
    },
    AddConditional {
        question_id: QuestionId,
        dependency_id: QuestionId,
    },
    RemoveConditional {
        question_id: QuestionId,
        dependency_id: QuestionId,
    },
}

pub fn apply(schema: &Schema, op: &EditOp) -> Result<Schema, EditError> {
    match op {
        EditOp::AddSection { id: None } => Ok(add_section(schema)),
        EditOp::AddSection { id: Some(id) } => add_section_with_id(schema, id.clone()),
        EditOp::RenameSection { section_id, title } => rename_section(schema, section_id, title),
        EditOp::DeleteSection { section_id } => delete_section(schema, section_id),
        EditOp::AddQuestion { section_id, id: None } => add_question(schema, section_id),
        EditOp::AddQuestion {
            section_id,
            id: Some(id),
        } => add_question_with_id(schema, section_id, id.clone()),
        EditOp::UpdateQuestion {
            section_id,
            question_id,
            patch,
        } => update_question(schema, section_id, question_id, patch),
        EditOp::DeleteQuestion {
            section_id,
            question_id,
        } => delete_question(schema, section_id, question_id),
        EditOp::AddConditional {
            question_id,
            dependency_id,
        } => add_conditional(schema, question_id, dependency_id),
        EditOp::RemoveConditional {
            question_id,
            dependency_id,
        } => remove_conditional(schema, question_id, dependency_id),
    }
}

/// Appends an empty section titled "New Section" with a generated id.
pub fn add_section(schema: &Schema) -> Schema {
    let mut next = schema.clone();
    next.sections.push(Section::new(SectionId::generate()));
    next
}

pub fn add_section_with_id(schema: &Schema, id: SectionId) -> Result<Schema, EditError> {
    if schema.section(id.as_str()).is_some() {
        return Err(EditError::DuplicateSection(id));
    }
    let mut next = schema.clone();
    next.sections.push(Section::new(id));
    Ok(next)
}

pub fn rename_section(
    schema: &Schema,
    section_id: &SectionId,
    title: &str,
) -> Result<Schema, EditError> {
    let mut next = schema.clone();
    section_mut(&mut next, section_id)?.title = title.to_string();
    Ok(next)
}

/// Removes a section and every question in it, cascading the removed ids
/// out of the remaining conditional sets.
pub fn delete_section(schema: &Schema, section_id: &SectionId) -> Result<Schema, EditError> {
    let section = schema
        .section(section_id.as_str())
        .ok_or_else(|| EditError::UnknownSection(section_id.clone()))?;
    let removed = section.questions.clone();

    let mut next = schema.clone();
    next.sections.retain(|section| &section.id != section_id);
    for id in &removed {
        next.questions.remove(id);
    }
    for question in next.questions.values_mut() {
        question.conditional.retain(|dep| !removed.contains(dep));
    }
    Ok(next)
}

/// Appends a default short-text question with a generated id.
pub fn add_question(schema: &Schema, section_id: &SectionId) -> Result<Schema, EditError> {
    add_question_with_id(schema, section_id, QuestionId::generate())
}

pub fn add_question_with_id(
    schema: &Schema,
    section_id: &SectionId,
    id: QuestionId,
) -> Result<Schema, EditError> {
    if schema.contains_question(id.as_str()) {
        return Err(EditError::DuplicateQuestion(id));
    }
    let mut next = schema.clone();
    section_mut(&mut next, section_id)?.questions.push(id.clone());
    next.questions.insert(id.clone(), Question::new(id));
    Ok(next)
}

/// Merges `patch` into the question. Changing the type keeps only the
/// constraints shared with the new type; constraint fields the resulting
/// type cannot hold are rejected.
pub fn update_question(
    schema: &Schema,
    section_id: &SectionId,
    question_id: &QuestionId,
    patch: &QuestionPatch,
) -> Result<Schema, EditError> {
    ensure_in_section(schema, section_id, question_id)?;
    let mut next = schema.clone();

    let question = question_mut(&mut next, question_id)?;
    if let Some(label) = &patch.label {
        question.label = label.clone();
    }
    if let Some(description) = &patch.description {
        question.description = description.clone();
    }
    if let Some(required) = patch.required {
        question.required = required;
    }
    if let Some(kind) = patch.kind {
        question.kind = question.kind.convert(kind);
    }
    apply_constraints(&mut question.kind, patch)?;

    if let Some(conditional) = &patch.conditional {
        question.conditional.clear();
        for dep in conditional {
            next = add_conditional(&next, question_id, dep)?;
        }
    }

    Ok(next)
}

fn apply_constraints(kind: &mut QuestionKind, patch: &QuestionPatch) -> Result<(), EditError> {
    let not_applicable = |field, kind: &QuestionKind| EditError::ConstraintNotApplicable {
        field,
        kind: kind.question_type(),
    };

    if let Some(new_options) = &patch.options {
        match kind {
            QuestionKind::Single { options } | QuestionKind::Multi { options } => {
                *options = new_options.clone();
            }
            other => return Err(not_applicable("options", other)),
        }
    }

    if patch.min.is_some() || patch.max.is_some() {
        match kind {
            QuestionKind::Numeric { min, max } => {
                if let Some(value) = &patch.min {
                    *min = value.clone();
                }
                if let Some(value) = &patch.max {
                    *max = value.clone();
                }
            }
            other => {
                let field = if patch.min.is_some() { "min" } else { "max" };
                return Err(not_applicable(field, other));
            }
        }
    }

    if let Some(value) = patch.max_length {
        match kind {
            QuestionKind::Short { max_length } | QuestionKind::Long { max_length } => {
                *max_length = value;
            }
            other => return Err(not_applicable("maxLength", other)),
        }
    }

    Ok(())
}

/// Removes the question and, in the same snapshot, every reference to it
/// from other questions' conditional sets.
pub fn delete_question(
    schema: &Schema,
    section_id: &SectionId,
    question_id: &QuestionId,
) -> Result<Schema, EditError> {
    ensure_in_section(schema, section_id, question_id)?;
    let dependents = schema.dependency_graph().dependents(question_id.as_str());

    let mut next = schema.clone();
    section_mut(&mut next, section_id)?
        .questions
        .retain(|id| id != question_id);
    next.questions.remove(question_id);
    for dependent in &dependents {
        if let Some(question) = next.questions.get_mut(dependent) {
            question.conditional.retain(|dep| dep != question_id);
        }
    }
    Ok(next)
}

/// Makes `question_id` visible only once `dependency_id` is answered.
/// Rejects self references, unknown ids and edges that would close a cycle.
pub fn add_conditional(
    schema: &Schema,
    question_id: &QuestionId,
    dependency_id: &QuestionId,
) -> Result<Schema, EditError> {
    if question_id == dependency_id {
        return Err(EditError::SelfDependency(question_id.clone()));
    }
    let question = schema
        .question(question_id.as_str())
        .ok_or_else(|| EditError::UnknownQuestion(question_id.clone()))?;
    if !schema.contains_question(dependency_id.as_str()) {
        return Err(EditError::UnknownQuestion(dependency_id.clone()));
    }
    if question.depends_on(dependency_id.as_str()) {
        return Ok(schema.clone());
    }
    if schema
        .dependency_graph()
        .would_create_cycle(question_id.as_str(), dependency_id.as_str())
    {
        return Err(EditError::CyclicDependency {
            question: question_id.clone(),
            dependency: dependency_id.clone(),
        });
    }

    let mut next = schema.clone();
    question_mut(&mut next, question_id)?
        .conditional
        .push(dependency_id.clone());
    Ok(next)
}

pub fn remove_conditional(
    schema: &Schema,
    question_id: &QuestionId,
    dependency_id: &QuestionId,
) -> Result<Schema, EditError> {
    let mut next = schema.clone();
    question_mut(&mut next, question_id)?
        .conditional
        .retain(|dep| dep != dependency_id);
    Ok(next)
}

fn ensure_in_section(
    schema: &Schema,
    section_id: &SectionId,
    question_id: &QuestionId,
) -> Result<(), EditError> {
    let section = schema
        .section(section_id.as_str())
        .ok_or_else(|| EditError::UnknownSection(section_id.clone()))?;
    if section.contains(question_id.as_str()) {
        Ok(())
    } else {
        Err(EditError::UnknownQuestion(question_id.clone()))
    }
}

fn section_mut<'a>(schema: &'a mut Schema, id: &SectionId) -> Result<&'a mut Section, EditError> {
    schema
        .sections
        .iter_mut()
        .find(|section| &section.id == id)
        .ok_or_else(|| EditError::UnknownSection(id.clone()))
}

fn question_mut<'a>(
    schema: &'a mut Schema,
    id: &QuestionId,
) -> Result<&'a mut Question, EditError> {
    schema
        .questions
        .get_mut(id)
        .ok_or_else(|| EditError::UnknownQuestion(id.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_distinguishes_null_from_missing() {
        let patch: QuestionPatch =
            serde_json::from_str(r#"{"min": null, "max": 5}"#).expect("deserialize");
        assert_eq!(patch.min, Some(None));
        assert_eq!(patch.max, Some(Some(5.into())));
        assert_eq!(patch.description, None);
    }

    #[test]
    fn edit_ops_use_snake_case_tags() {
        let op: EditOp = serde_json::from_str(
            r#"{"op": "add_conditional", "question_id": "q2", "dependency_id": "q1"}"#,
        )
        .expect("deserialize");
        assert_eq!(
            op,
            EditOp::AddConditional {
                question_id: "q2".into(),
                dependency_id: "q1".into(),
            }
        );
    }
}
