use std::fmt::Write;

use assessment_spec::{
    Question, QuestionKind, Schema, SubmissionRequest, ValidationResult, VisibleSet,
};

/// Controls which bits of state the preview prints.
#[derive(Copy, Clone, Eq, PartialEq)]
pub enum Verbosity {
    /// Clean output: question prompts only.
    Clean,
    /// Verbose output: visible questions, choices, CBOR payload.
    Verbose,
}

impl Verbosity {
    pub fn from_verbose(verbose: bool) -> Self {
        if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Clean
        }
    }

    pub fn is_verbose(&self) -> bool {
        matches!(self, Verbosity::Verbose)
    }
}

/// Prints prompts and results for an interactive preview run.
pub struct PreviewPresenter {
    verbosity: Verbosity,
    header_printed: bool,
}

impl PreviewPresenter {
    pub fn new(verbosity: Verbosity) -> Self {
        Self {
            verbosity,
            header_printed: false,
        }
    }

    pub fn show_header(&mut self, schema: &Schema) {
        if self.header_printed {
            return;
        }
        println!(
            "Assessment: {}",
            schema.title().unwrap_or_else(|| schema.job_id())
        );
        if self.verbosity.is_verbose() {
            println!(
                "Sections: {}, questions: {}",
                schema.sections().len(),
                schema.len()
            );
        }
        self.header_printed = true;
    }

    pub fn show_status(&self, schema: &Schema, visible: &VisibleSet, answered: usize) {
        if self.verbosity.is_verbose() {
            println!("Answered {} of {} visible", answered, visible.len());
            print_visible_questions(schema, visible);
        } else if visible.is_empty() {
            println!("No visible questions are available; check your conditional logic.");
        }
    }

    pub fn show_prompt(&self, prompt: &PromptContext) {
        let mut line = format!("{}/{} {}", prompt.index, prompt.total, prompt.title);
        if prompt.required {
            line.push_str(" *");
        }
        if let Some(hint) = &prompt.hint {
            line.push(' ');
            line.push_str(hint);
        }
        println!("{}", line);
        if let Some(description) = &prompt.description {
            println!("{}", description);
        }
        if self.verbosity.is_verbose() && !prompt.choices.is_empty() {
            let numbered: Vec<String> = prompt
                .choices
                .iter()
                .enumerate()
                .map(|(index, choice)| format!("{}) {}", index + 1, choice))
                .collect();
            println!("Choices: {}", numbered.join(", "));
        }
    }

    pub fn show_parse_error(&self, error: &AnswerParseError) {
        eprintln!("Invalid answer: {}", error.user_message);
        if let Some(debug) = &error.debug_message {
            eprintln!("  Expected: {}", debug);
        }
    }

    pub fn show_completion(&self, request: &SubmissionRequest) {
        println!("Done ✅");
        match serde_json::to_string_pretty(request) {
            Ok(pretty) => println!("{}", pretty),
            Err(err) => eprintln!("Failed to serialize submission to JSON: {}", err),
        }
        if self.verbosity.is_verbose() {
            match request.to_cbor() {
                Ok(bytes) => println!("Submission (CBOR hex): {}", encode_hex(&bytes)),
                Err(err) => eprintln!("Failed to serialize submission to CBOR: {}", err),
            }
        }
    }
}

pub fn print_visible_questions(schema: &Schema, visible: &VisibleSet) {
    println!("Visible questions:");
    for question in schema
        .questions()
        .filter(|question| visible.contains(&question.id))
    {
        let mut entry = format!(" - {} ({})", question.id, question.label);
        if question.required {
            entry.push_str(" [required]");
        }
        println!("{}", entry);
    }
}

pub fn describe_validation(result: &ValidationResult) {
    println!(
        "Validation result: {}",
        if result.valid { "valid" } else { "invalid" }
    );
    if !result.errors.is_empty() {
        println!("Errors:");
        for error in &result.errors {
            println!("  {} - {}", error.question_id, error.message);
        }
    }
}

/// Context used to format a single prompt.
pub struct PromptContext {
    pub index: usize,
    pub total: usize,
    pub title: String,
    pub description: Option<String>,
    pub required: bool,
    pub hint: Option<String>,
    pub choices: Vec<String>,
}

impl PromptContext {
    pub fn new(question: &Question, index: usize, total: usize) -> Self {
        Self {
            index: index.max(1),
            total,
            title: question.label.clone(),
            description: question
                .description
                .clone()
                .filter(|description| !description.is_empty()),
            required: question.required,
            hint: hint(&question.kind),
            choices: question.kind.options().to_vec(),
        }
    }
}

fn hint(kind: &QuestionKind) -> Option<String> {
    match kind {
        QuestionKind::Short { .. } | QuestionKind::Long { .. } => kind
            .max_length()
            .map(|limit| format!("(up to {} characters)", limit)),
        QuestionKind::Single { options } if !options.is_empty() => {
            Some(format!("({})", options.join("/")))
        }
        QuestionKind::Multi { options } if !options.is_empty() => {
            Some(format!("(comma separated: {})", options.join(", ")))
        }
        QuestionKind::Numeric { min, max } => Some(match (min, max) {
            (Some(min), Some(max)) => format!("(number {}..{})", min, max),
            (Some(min), None) => format!("(number ≥ {})", min),
            (None, Some(max)) => format!("(number ≤ {})", max),
            (None, None) => "(number)".to_string(),
        }),
        QuestionKind::File => Some("(file name)".to_string()),
        _ => None,
    }
}

/// Error produced when parsing answers from the user.
#[derive(Debug)]
pub struct AnswerParseError {
    pub user_message: String,
    pub debug_message: Option<String>,
}

impl AnswerParseError {
    pub fn new(user_message: impl Into<String>, debug_message: Option<String>) -> Self {
        Self {
            user_message: user_message.into(),
            debug_message,
        }
    }
}

fn encode_hex(bytes: &[u8]) -> String {
    let mut encoded = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(&mut encoded, "{:02x}", byte);
    }
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_encoding_is_lowercase_pairs() {
        assert_eq!(encode_hex(&[0x00, 0xab, 0x10]), "00ab10");
    }

    #[test]
    fn numeric_hint_shows_bounds() {
        let kind = QuestionKind::Numeric {
            min: Some(0.into()),
            max: Some(10.into()),
        };
        assert_eq!(hint(&kind).as_deref(), Some("(number 0..10)"));
        assert_eq!(hint(&QuestionKind::Short { max_length: None }), None);
    }
}
