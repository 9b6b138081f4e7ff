use serde::{Deserialize, Serialize};
use serde_json::Number;

use crate::answers::{Answer, Answers};
use crate::spec::{Question, QuestionId, QuestionKind, Schema};
use crate::visibility::VisibleSet;

/// Toggles for validation rules beyond the required/numeric core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationPolicy {
    /// Treat an empty multiple-choice selection as a missing required answer.
    #[serde(default)]
    pub empty_selection_is_missing: bool,
    /// Check text length, option membership and answer shape.
    #[serde(default = "default_check_constraints")]
    pub check_constraints: bool,
}

fn default_check_constraints() -> bool {
    true
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self {
            empty_selection_is_missing: false,
            check_constraints: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Required,
    NotANumber,
    BelowMinimum,
    AboveMaximum,
    TooLong,
    InvalidOption,
    TypeMismatch,
}

/// One violated rule for one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    pub question_id: QuestionId,
    pub code: ErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
}

impl ValidationResult {
    /// Error messages in schema order, e.g. `"Age must be ≤ 10"`.
    pub fn messages(&self) -> Vec<String> {
        self.errors
            .iter()
            .map(|error| error.message.clone())
            .collect()
    }
}

pub fn validate(schema: &Schema, answers: &Answers, visible: &VisibleSet) -> ValidationResult {
    validate_with(schema, answers, visible, &ValidationPolicy::default())
}

/// Checks every visible question and accumulates all violations; hidden
/// questions never produce errors.
pub fn validate_with(
    schema: &Schema,
    answers: &Answers,
    visible: &VisibleSet,
    policy: &ValidationPolicy,
) -> ValidationResult {
    let mut errors = Vec::new();

    for question in schema.questions() {
        if !visible.contains(&question.id) {
            continue;
        }

        let answer = answers.get(&question.id);
        if question.required && is_missing(answer, policy) {
            errors.push(error(question, ErrorCode::Required, "is required".into()));
        }

        let Some(answer) = answer else {
            continue;
        };

        match &question.kind {
            QuestionKind::Numeric { min, max } => {
                check_numeric(question, answer, min.as_ref(), max.as_ref(), &mut errors);
            }
            _ if policy.check_constraints => check_constraints(question, answer, &mut errors),
            _ => {}
        }
    }

    ValidationResult {
        valid: errors.is_empty(),
        errors,
    }
}

fn is_missing(answer: Option<&Answer>, policy: &ValidationPolicy) -> bool {
    match answer {
        None => true,
        Some(Answer::Text(text)) => text.is_empty(),
        Some(Answer::Choices(choices)) => policy.empty_selection_is_missing && choices.is_empty(),
        Some(Answer::Number(_)) => false,
    }
}

enum NumericInput {
    Blank,
    Invalid,
    Value(f64),
}

fn numeric_input(answer: &Answer) -> NumericInput {
    match answer {
        Answer::Number(number) => number
            .as_f64()
            .map_or(NumericInput::Invalid, NumericInput::Value),
        // blank text counts as unanswered, not as zero
        Answer::Text(text) if text.trim().is_empty() => NumericInput::Blank,
        Answer::Text(text) => match text.trim().parse::<f64>() {
            Ok(value) if value.is_finite() => NumericInput::Value(value),
            _ => NumericInput::Invalid,
        },
        Answer::Choices(_) => NumericInput::Invalid,
    }
}

fn check_numeric(
    question: &Question,
    answer: &Answer,
    min: Option<&Number>,
    max: Option<&Number>,
    errors: &mut Vec<ValidationError>,
) {
    let value = match numeric_input(answer) {
        NumericInput::Blank => return,
        NumericInput::Invalid => {
            errors.push(error(
                question,
                ErrorCode::NotANumber,
                "must be a number".into(),
            ));
            return;
        }
        NumericInput::Value(value) => value,
    };

    if let Some(min) = min
        && let Some(bound) = min.as_f64()
        && value < bound
    {
        errors.push(error(
            question,
            ErrorCode::BelowMinimum,
            format!("must be ≥ {min}"),
        ));
    }

    if let Some(max) = max
        && let Some(bound) = max.as_f64()
        && value > bound
    {
        errors.push(error(
            question,
            ErrorCode::AboveMaximum,
            format!("must be ≤ {max}"),
        ));
    }
}

fn check_constraints(question: &Question, answer: &Answer, errors: &mut Vec<ValidationError>) {
    match (&question.kind, answer) {
        (QuestionKind::Short { max_length } | QuestionKind::Long { max_length }, Answer::Text(text)) => {
            if let Some(limit) = max_length
                && text.chars().count() > *limit
            {
                errors.push(error(
                    question,
                    ErrorCode::TooLong,
                    format!("must be at most {limit} characters"),
                ));
            }
        }
        // membership is only checked against a declared option list
        (QuestionKind::Single { options }, Answer::Text(text)) => {
            if !text.is_empty() && !options.is_empty() && !options.contains(text) {
                errors.push(invalid_option(question));
            }
        }
        (QuestionKind::Multi { options }, Answer::Choices(choices)) => {
            if !options.is_empty() && choices.iter().any(|choice| !options.contains(choice)) {
                errors.push(invalid_option(question));
            }
        }
        // an untouched multiple-choice input reports an empty string
        (QuestionKind::Multi { .. }, Answer::Text(text)) if text.is_empty() => {}
        (QuestionKind::File, Answer::Text(_)) => {}
        _ => errors.push(error(
            question,
            ErrorCode::TypeMismatch,
            "has an answer of the wrong type".into(),
        )),
    }
}

fn invalid_option(question: &Question) -> ValidationError {
    error(
        question,
        ErrorCode::InvalidOption,
        "must be one of the listed options".into(),
    )
}

fn error(question: &Question, code: ErrorCode, constraint: String) -> ValidationError {
    ValidationError {
        question_id: question.id.clone(),
        code,
        message: format!("{} {}", question.label, constraint),
    }
}
