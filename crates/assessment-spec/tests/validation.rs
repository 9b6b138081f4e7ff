use serde_json::json;

use assessment_spec::{
    Answer, AnswerStore, Answers, ErrorCode, Schema, ValidationPolicy, VisibilityStrategy,
    answers_schema, settle, validate, validate_with, visible_set,
};

fn screening() -> Schema {
    serde_json::from_str(include_str!("fixtures/screening.json")).unwrap()
}

fn numeric_schema() -> Schema {
    serde_json::from_value(json!({
        "jobId": "job-b",
        "sections": [{
            "id": "s1",
            "title": "Experience",
            "questions": [{
                "id": "Q3",
                "label": "Years",
                "type": "numeric",
                "required": true,
                "options": [],
                "min": 0,
                "max": 10,
                "conditional": []
            }]
        }]
    }))
    .unwrap()
}

fn parse_answers(value: serde_json::Value) -> Answers {
    serde_json::from_value(value).unwrap()
}

#[test]
fn numeric_above_maximum_reports_one_error() {
    let schema = numeric_schema();
    let answers = parse_answers(json!({ "Q3": "12" }));
    let visible = visible_set(&schema, &answers);

    let result = validate(&schema, &answers, &visible);
    assert!(!result.valid);
    assert_eq!(result.messages(), vec!["Years must be ≤ 10".to_string()]);
    assert_eq!(result.errors[0].code, ErrorCode::AboveMaximum);
}

#[test]
fn numeric_bounds_are_inclusive() {
    let schema = numeric_schema();
    for value in ["0", "10", " 7 "] {
        let answers = parse_answers(json!({ "Q3": value }));
        let visible = visible_set(&schema, &answers);
        assert!(validate(&schema, &answers, &visible).valid, "{value}");
    }

    let answers = parse_answers(json!({ "Q3": -1 }));
    let visible = visible_set(&schema, &answers);
    let result = validate(&schema, &answers, &visible);
    assert_eq!(result.messages(), vec!["Years must be ≥ 0".to_string()]);
}

#[test]
fn non_numeric_text_is_not_a_number() {
    let schema = numeric_schema();
    let answers = parse_answers(json!({ "Q3": "abc" }));
    let visible = visible_set(&schema, &answers);

    let result = validate(&schema, &answers, &visible);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].code, ErrorCode::NotANumber);
    assert_eq!(result.errors[0].message, "Years must be a number");
}

#[test]
fn blank_numeric_answer_only_fails_required() {
    let schema = numeric_schema();
    let answers = parse_answers(json!({ "Q3": "" }));
    let visible = visible_set(&schema, &answers);

    let result = validate(&schema, &answers, &visible);
    assert_eq!(result.messages(), vec!["Years is required".to_string()]);
}

#[test]
fn hidden_required_question_is_never_reported() {
    let schema = screening();
    // q2 (City) is required but hidden until q1 is answered
    let answers = parse_answers(json!({ "q1": "", "q4": 3, "q5": ["Rust"] }));
    let visible = visible_set(&schema, &answers);
    assert!(!visible.contains("q2"));

    let result = validate(&schema, &answers, &visible);
    assert!(result.errors.iter().all(|error| error.question_id.as_str() != "q2"));
}

#[test]
fn errors_accumulate_in_schema_order() {
    let schema = screening();
    let answers = parse_answers(json!({ "q4": "eleven" }));
    let visible = visible_set(&schema, &answers);

    let result = validate(&schema, &answers, &visible);
    let ids: Vec<&str> = result
        .errors
        .iter()
        .map(|error| error.question_id.as_str())
        .collect();
    assert_eq!(ids, vec!["q1", "q4", "q5"]);
    assert_eq!(
        result.messages(),
        vec![
            "Relocate is required".to_string(),
            "Years must be a number".to_string(),
            "Stack is required".to_string(),
        ]
    );
}

#[test]
fn complete_answers_pass() {
    let schema = screening();
    let mut answers = parse_answers(json!({
        "q1": "Yes",
        "q2": "Lisbon",
        "q4": 4,
        "q5": ["Rust", "Go"],
        "q6": "cv.pdf"
    }));
    let visible = settle(&schema, &mut answers);

    let result = validate(&schema, &answers, &visible);
    assert!(result.valid, "{:?}", result.errors);
}

#[test]
fn empty_selection_counts_as_answered_unless_policy_says_otherwise() {
    let schema = screening();
    let answers = parse_answers(json!({ "q1": "No", "q2": "Porto", "q4": 1, "q5": [] }));
    let visible = visible_set(&schema, &answers);

    assert!(validate(&schema, &answers, &visible).valid);

    let strict = ValidationPolicy {
        empty_selection_is_missing: true,
        ..ValidationPolicy::default()
    };
    let result = validate_with(&schema, &answers, &visible, &strict);
    assert_eq!(result.messages(), vec!["Stack is required".to_string()]);
}

#[test]
fn constraint_violations_are_reported() {
    let schema = screening();
    let mut answers = parse_answers(json!({
        "q1": "Maybe",
        "q2": "x".repeat(41),
        "q4": 2,
        "q5": ["Rust", "Cobol"],
        "q6": ["a.pdf"]
    }));
    let visible = visible_set(&schema, &answers);

    let result = validate(&schema, &answers, &visible);
    let codes: Vec<ErrorCode> = result.errors.iter().map(|error| error.code).collect();
    assert_eq!(
        codes,
        vec![
            ErrorCode::InvalidOption,
            ErrorCode::TooLong,
            ErrorCode::InvalidOption,
            ErrorCode::TypeMismatch,
        ]
    );
    assert_eq!(result.errors[1].message, "City must be at most 40 characters");

    let relaxed = ValidationPolicy {
        check_constraints: false,
        ..ValidationPolicy::default()
    };
    answers.remove("q6");
    assert!(validate_with(&schema, &answers, &visible, &relaxed).valid);
}

#[test]
fn choice_questions_without_options_accept_any_text() {
    let schema: Schema = serde_json::from_value(json!({
        "jobId": "job-open",
        "sections": [{
            "id": "s1",
            "title": "Open",
            "questions": [
                { "id": "q1", "label": "Pick", "type": "single", "required": true, "options": [] },
                { "id": "q2", "label": "Tags", "type": "multi", "options": [] }
            ]
        }]
    }))
    .unwrap();
    let answers = parse_answers(json!({ "q1": "foo", "q2": ["a", "b"] }));
    let visible = visible_set(&schema, &answers);

    assert!(validate(&schema, &answers, &visible).valid);
    let generated = answers_schema(&schema, &visible);
    assert_eq!(generated["properties"]["q1"].get("enum"), None);
    assert_eq!(generated["properties"]["q2"]["items"], json!({ "type": "string" }));
}

#[test]
fn answers_schema_lists_visible_questions_only() {
    let schema = screening();
    let answers = Answers::new();
    let visible = visible_set(&schema, &answers);

    let generated = answers_schema(&schema, &visible);
    let props = generated["properties"].as_object().unwrap();
    assert!(props.contains_key("q1"));
    assert!(!props.contains_key("q2"));
    assert_eq!(props["q4"]["maximum"], json!(10));
    assert_eq!(props["q4"]["description"], json!("Professional years"));
    assert_eq!(props["q5"]["items"]["enum"], json!(["Rust", "Go", "Java"]));
    assert_eq!(generated["title"], json!("Backend Screening"));

    let required: Vec<&str> = generated["required"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|value| value.as_str())
        .collect();
    assert_eq!(required, vec!["q1", "q4", "q5"]);
}

#[test]
fn store_strategy_does_not_change_validation_of_settled_answers() {
    let schema = screening();
    let mut store = AnswerStore::new(&schema, VisibilityStrategy::Settled);
    store.set(&schema, "q4".into(), Answer::from("12"));
    let result = validate(&schema, store.answers(), store.visible());
    assert!(result.messages().contains(&"Years must be ≤ 10".to_string()));
}
