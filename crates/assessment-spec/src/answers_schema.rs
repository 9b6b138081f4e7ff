use serde_json::{Map, Value, json};

use crate::spec::{Question, QuestionKind, Schema};
use crate::visibility::VisibleSet;

/// JSON Schema of the answer object accepted for the visible questions.
pub fn generate(schema: &Schema, visible: &VisibleSet) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for question in schema.questions() {
        if !visible.contains(&question.id) {
            continue;
        }
        properties.insert(question.id.to_string(), question_schema(question));
        if question.required {
            required.push(Value::String(question.id.to_string()));
        }
    }

    let mut root = json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false,
    });
    if let Some(title) = schema.title() {
        root["title"] = Value::String(title.to_string());
    }
    root
}

fn question_schema(question: &Question) -> Value {
    let mut schema = match &question.kind {
        QuestionKind::Short { max_length } | QuestionKind::Long { max_length } => {
            let mut schema = json!({ "type": "string" });
            if let Some(limit) = max_length {
                schema["maxLength"] = json!(limit);
            }
            schema
        }
        QuestionKind::Single { options } => choice_schema(options),
        QuestionKind::Multi { options } => json!({
            "type": "array",
            "items": choice_schema(options),
            "uniqueItems": true,
        }),
        QuestionKind::Numeric { min, max } => {
            let mut schema = json!({ "type": ["number", "string"] });
            if let Some(min) = min {
                schema["minimum"] = Value::Number(min.clone());
            }
            if let Some(max) = max {
                schema["maximum"] = Value::Number(max.clone());
            }
            schema
        }
        // file questions carry the uploaded file name
        QuestionKind::File => json!({ "type": "string" }),
    };

    schema["title"] = Value::String(question.label.clone());
    if let Some(description) = question.description.as_deref().filter(|d| !d.is_empty()) {
        schema["description"] = Value::String(description.to_string());
    }
    schema
}

// without declared options any text is accepted
fn choice_schema(options: &[String]) -> Value {
    if options.is_empty() {
        json!({ "type": "string" })
    } else {
        json!({ "type": "string", "enum": options })
    }
}
