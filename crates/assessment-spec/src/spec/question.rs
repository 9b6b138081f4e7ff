use std::borrow::Borrow;
use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Number;
use uuid::Uuid;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Fresh random identifier (UUID v4).
            pub fn generate() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(
    /// Question identifier, unique across a whole schema.
    QuestionId
);
string_id!(
    /// Section identifier, stable for the lifetime of the section.
    SectionId
);

/// Wire label of a question kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    #[default]
    Short,
    Long,
    Single,
    Multi,
    Numeric,
    File,
}

impl QuestionType {
    pub const ALL: [QuestionType; 6] = [
        QuestionType::Short,
        QuestionType::Long,
        QuestionType::Single,
        QuestionType::Multi,
        QuestionType::Numeric,
        QuestionType::File,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::Short => "short",
            QuestionType::Long => "long",
            QuestionType::Single => "single",
            QuestionType::Multi => "multi",
            QuestionType::Numeric => "numeric",
            QuestionType::File => "file",
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Question kind together with the constraints that only make sense for it.
#[derive(Debug, Clone, PartialEq)]
pub enum QuestionKind {
    Short { max_length: Option<usize> },
    Long { max_length: Option<usize> },
    Single { options: Vec<String> },
    Multi { options: Vec<String> },
    Numeric { min: Option<Number>, max: Option<Number> },
    File,
}

impl Default for QuestionKind {
    fn default() -> Self {
        QuestionKind::Short { max_length: None }
    }
}

impl QuestionKind {
    /// Unconstrained kind for the given type.
    pub fn empty(kind: QuestionType) -> Self {
        match kind {
            QuestionType::Short => QuestionKind::Short { max_length: None },
            QuestionType::Long => QuestionKind::Long { max_length: None },
            QuestionType::Single => QuestionKind::Single {
                options: Vec::new(),
            },
            QuestionType::Multi => QuestionKind::Multi {
                options: Vec::new(),
            },
            QuestionType::Numeric => QuestionKind::Numeric {
                min: None,
                max: None,
            },
            QuestionType::File => QuestionKind::File,
        }
    }

    pub fn question_type(&self) -> QuestionType {
        match self {
            QuestionKind::Short { .. } => QuestionType::Short,
            QuestionKind::Long { .. } => QuestionType::Long,
            QuestionKind::Single { .. } => QuestionType::Single,
            QuestionKind::Multi { .. } => QuestionType::Multi,
            QuestionKind::Numeric { .. } => QuestionType::Numeric,
            QuestionKind::File => QuestionType::File,
        }
    }

    /// Switches to `target`, keeping only constraints shared by both kinds
    /// (text length between short/long, options between single/multi).
    pub fn convert(&self, target: QuestionType) -> Self {
        match (self, target) {
            (
                QuestionKind::Short { max_length } | QuestionKind::Long { max_length },
                QuestionType::Short,
            ) => QuestionKind::Short {
                max_length: *max_length,
            },
            (
                QuestionKind::Short { max_length } | QuestionKind::Long { max_length },
                QuestionType::Long,
            ) => QuestionKind::Long {
                max_length: *max_length,
            },
            (
                QuestionKind::Single { options } | QuestionKind::Multi { options },
                QuestionType::Single,
            ) => QuestionKind::Single {
                options: options.clone(),
            },
            (
                QuestionKind::Single { options } | QuestionKind::Multi { options },
                QuestionType::Multi,
            ) => QuestionKind::Multi {
                options: options.clone(),
            },
            (QuestionKind::Numeric { min, max }, QuestionType::Numeric) => QuestionKind::Numeric {
                min: min.clone(),
                max: max.clone(),
            },
            (_, target) => QuestionKind::empty(target),
        }
    }

    pub fn options(&self) -> &[String] {
        match self {
            QuestionKind::Single { options } | QuestionKind::Multi { options } => options,
            _ => &[],
        }
    }

    pub fn max_length(&self) -> Option<usize> {
        match self {
            QuestionKind::Short { max_length } | QuestionKind::Long { max_length } => *max_length,
            _ => None,
        }
    }
}

/// A single typed question.
#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    pub id: QuestionId,
    pub label: String,
    pub description: Option<String>,
    pub required: bool,
    pub kind: QuestionKind,
    /// Questions whose answers must all be satisfied for this one to show.
    /// Kept free of duplicates; order is the authoring order.
    pub conditional: Vec<QuestionId>,
}

impl Question {
    pub const DEFAULT_LABEL: &'static str = "Untitled";

    pub fn new(id: QuestionId) -> Self {
        Self {
            id,
            label: Self::DEFAULT_LABEL.to_string(),
            description: None,
            required: false,
            kind: QuestionKind::default(),
            conditional: Vec::new(),
        }
    }

    pub fn question_type(&self) -> QuestionType {
        self.kind.question_type()
    }

    pub fn depends_on(&self, id: &str) -> bool {
        self.conditional.iter().any(|dep| dep.as_str() == id)
    }
}

/// Flat wire shape of a question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRecord {
    pub id: QuestionId,
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: QuestionType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<f64>")]
    pub min: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<f64>")]
    pub max: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    /// `null` and a missing field both mean "no dependencies".
    #[serde(default)]
    pub conditional: Option<Vec<QuestionId>>,
}

impl From<QuestionRecord> for Question {
    fn from(record: QuestionRecord) -> Self {
        let kind = match record.kind {
            QuestionType::Short => QuestionKind::Short {
                max_length: record.max_length,
            },
            QuestionType::Long => QuestionKind::Long {
                max_length: record.max_length,
            },
            QuestionType::Single => QuestionKind::Single {
                options: record.options,
            },
            QuestionType::Multi => QuestionKind::Multi {
                options: record.options,
            },
            QuestionType::Numeric => QuestionKind::Numeric {
                min: record.min,
                max: record.max,
            },
            QuestionType::File => QuestionKind::File,
        };

        let mut conditional: Vec<QuestionId> = Vec::new();
        for dep in record.conditional.unwrap_or_default() {
            if !conditional.contains(&dep) {
                conditional.push(dep);
            }
        }

        Question {
            id: record.id,
            label: record.label,
            description: record.description,
            required: record.required,
            kind,
            conditional,
        }
    }
}

impl From<Question> for QuestionRecord {
    fn from(question: Question) -> Self {
        let kind = question.question_type();
        let mut record = QuestionRecord {
            id: question.id,
            label: question.label,
            description: question.description,
            kind,
            required: question.required,
            options: Vec::new(),
            min: None,
            max: None,
            max_length: None,
            conditional: Some(question.conditional),
        };
        match question.kind {
            QuestionKind::Short { max_length } | QuestionKind::Long { max_length } => {
                record.max_length = max_length;
            }
            QuestionKind::Single { options } | QuestionKind::Multi { options } => {
                record.options = options;
            }
            QuestionKind::Numeric { min, max } => {
                record.min = min;
                record.max = max;
            }
            QuestionKind::File => {}
        }
        record
    }
}
