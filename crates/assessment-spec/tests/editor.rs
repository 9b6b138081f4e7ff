use serde_json::json;

use assessment_spec::editor::{
    self, add_conditional, add_question_with_id, add_section, delete_question, delete_section,
    remove_conditional, rename_section, update_question,
};
use assessment_spec::{
    EditError, EditOp, QuestionId, QuestionKind, QuestionPatch, QuestionType, Schema, SectionId,
};

fn qid(id: &str) -> QuestionId {
    QuestionId::from(id)
}

fn sid(id: &str) -> SectionId {
    SectionId::from(id)
}

fn two_sections() -> Schema {
    serde_json::from_value(json!({
        "jobId": "job-edit",
        "sections": [
            {
                "id": "s1",
                "title": "General",
                "questions": [
                    { "id": "Q1", "label": "Relocate", "type": "single", "options": ["Yes", "No"] },
                    { "id": "Q2", "label": "City", "type": "short", "conditional": ["Q1"] }
                ]
            },
            {
                "id": "s2",
                "title": "Experience",
                "questions": [
                    { "id": "Q3", "label": "Years", "type": "numeric", "min": 0, "max": 10 },
                    { "id": "Q4", "label": "Notes", "type": "long", "conditional": ["Q1", "Q3"] }
                ]
            }
        ]
    }))
    .unwrap()
}

#[test]
fn add_section_appends_default_section_without_touching_input() {
    let schema = two_sections();
    let next = add_section(&schema);

    assert_eq!(schema.sections().len(), 2);
    assert_eq!(next.sections().len(), 3);
    let added = &next.sections()[2];
    assert_eq!(added.title, "New Section");
    assert!(added.question_ids().is_empty());
    assert_ne!(added.id, next.sections()[0].id);
}

#[test]
fn add_question_uses_defaults_and_rejects_duplicates() {
    let schema = two_sections();
    let next = add_question_with_id(&schema, &sid("s2"), qid("Q5")).unwrap();

    let question = next.question("Q5").unwrap();
    assert_eq!(question.label, "Untitled");
    assert_eq!(question.question_type(), QuestionType::Short);
    assert!(!question.required);
    assert!(question.conditional.is_empty());
    assert_eq!(next.section("s2").unwrap().question_ids().last(), Some(&qid("Q5")));

    assert_eq!(
        add_question_with_id(&next, &sid("s1"), qid("Q5")),
        Err(EditError::DuplicateQuestion(qid("Q5")))
    );
    assert_eq!(
        add_question_with_id(&schema, &sid("nope"), qid("Q9")),
        Err(EditError::UnknownSection(sid("nope")))
    );
}

#[test]
fn rename_section_changes_only_the_title() {
    let schema = two_sections();
    let next = rename_section(&schema, &sid("s1"), "Basics").unwrap();
    assert_eq!(next.section("s1").unwrap().title, "Basics");
    assert_eq!(schema.section("s1").unwrap().title, "General");
    assert_eq!(next.len(), schema.len());

    assert_eq!(
        rename_section(&schema, &sid("s9"), "Missing"),
        Err(EditError::UnknownSection(sid("s9")))
    );
}

#[test]
fn cyclic_conditional_is_rejected() {
    let schema = two_sections();

    let err = add_conditional(&schema, &qid("Q1"), &qid("Q2")).unwrap_err();
    assert_eq!(
        err,
        EditError::CyclicDependency {
            question: qid("Q1"),
            dependency: qid("Q2"),
        }
    );

    // Q3 -> Q2 -> Q1, so Q1 may no longer depend on Q3
    let chained = add_conditional(&schema, &qid("Q3"), &qid("Q2")).unwrap();
    assert!(matches!(
        add_conditional(&chained, &qid("Q1"), &qid("Q3")),
        Err(EditError::CyclicDependency { .. })
    ));
    assert!(add_conditional(&schema, &qid("Q1"), &qid("Q3")).is_ok());

    assert_eq!(
        add_conditional(&schema, &qid("Q1"), &qid("Q1")),
        Err(EditError::SelfDependency(qid("Q1")))
    );
    assert_eq!(
        add_conditional(&schema, &qid("Q1"), &qid("Q9")),
        Err(EditError::UnknownQuestion(qid("Q9")))
    );
}

#[test]
fn conditional_may_point_across_sections_and_is_not_duplicated() {
    let schema = two_sections();
    let next = add_conditional(&schema, &qid("Q3"), &qid("Q2")).unwrap();
    assert_eq!(next.question("Q3").unwrap().conditional, vec![qid("Q2")]);

    let again = add_conditional(&next, &qid("Q3"), &qid("Q2")).unwrap();
    assert_eq!(again.question("Q3").unwrap().conditional, vec![qid("Q2")]);

    let removed = remove_conditional(&again, &qid("Q3"), &qid("Q2")).unwrap();
    assert!(removed.question("Q3").unwrap().conditional.is_empty());

    let untouched = remove_conditional(&removed, &qid("Q3"), &qid("Q2")).unwrap();
    assert!(untouched.question("Q3").unwrap().conditional.is_empty());
    assert_eq!(
        remove_conditional(&schema, &qid("Q9"), &qid("Q1")),
        Err(EditError::UnknownQuestion(qid("Q9")))
    );
}

#[test]
fn deleting_a_question_cascades_into_conditionals() {
    let schema = two_sections();
    let next = delete_question(&schema, &sid("s1"), &qid("Q1")).unwrap();

    assert!(next.question("Q1").is_none());
    assert!(next.question("Q2").unwrap().conditional.is_empty());
    assert_eq!(next.question("Q4").unwrap().conditional, vec![qid("Q3")]);
    assert!(next.dependency_graph().dangling().is_empty());

    assert_eq!(
        delete_question(&schema, &sid("s2"), &qid("Q1")),
        Err(EditError::UnknownQuestion(qid("Q1")))
    );
}

#[test]
fn deleting_a_section_removes_its_questions_everywhere() {
    let schema = two_sections();
    let next = delete_section(&schema, &sid("s1")).unwrap();

    assert_eq!(next.sections().len(), 1);
    assert_eq!(next.len(), 2);
    assert_eq!(next.question("Q4").unwrap().conditional, vec![qid("Q3")]);
}

#[test]
fn patch_merges_fields_and_converts_type() {
    let schema = two_sections();
    let patch: QuestionPatch = serde_json::from_value(json!({
        "label": "Years of Rust",
        "required": true,
        "max": 20
    }))
    .unwrap();
    let next = update_question(&schema, &sid("s2"), &qid("Q3"), &patch).unwrap();
    let question = next.question("Q3").unwrap();
    assert_eq!(question.label, "Years of Rust");
    assert!(question.required);
    assert_eq!(
        question.kind,
        QuestionKind::Numeric {
            min: Some(0.into()),
            max: Some(20.into()),
        }
    );

    let to_short: QuestionPatch = serde_json::from_value(json!({ "type": "short" })).unwrap();
    let next = update_question(&next, &sid("s2"), &qid("Q3"), &to_short).unwrap();
    assert_eq!(
        next.question("Q3").unwrap().kind,
        QuestionKind::Short { max_length: None }
    );
}

#[test]
fn patch_rejects_constraints_the_type_cannot_hold() {
    let schema = two_sections();
    let patch: QuestionPatch = serde_json::from_value(json!({ "options": ["a"] })).unwrap();
    assert_eq!(
        update_question(&schema, &sid("s2"), &qid("Q3"), &patch),
        Err(EditError::ConstraintNotApplicable {
            field: "options",
            kind: QuestionType::Numeric,
        })
    );

    let patch: QuestionPatch = serde_json::from_value(json!({ "type": "single", "min": 1 })).unwrap();
    assert!(matches!(
        update_question(&schema, &sid("s2"), &qid("Q3"), &patch),
        Err(EditError::ConstraintNotApplicable { field: "min", .. })
    ));
}

#[test]
fn patch_null_clears_nullable_fields() {
    let schema = two_sections();
    let patch: QuestionPatch = serde_json::from_value(json!({ "min": null })).unwrap();
    let next = update_question(&schema, &sid("s2"), &qid("Q3"), &patch).unwrap();
    assert_eq!(
        next.question("Q3").unwrap().kind,
        QuestionKind::Numeric {
            min: None,
            max: Some(10.into()),
        }
    );
}

#[test]
fn patch_conditional_goes_through_cycle_check() {
    let schema = two_sections();
    let patch: QuestionPatch = serde_json::from_value(json!({ "conditional": ["Q4"] })).unwrap();
    assert!(matches!(
        update_question(&schema, &sid("s1"), &qid("Q1"), &patch),
        Err(EditError::CyclicDependency { .. })
    ));

    let patch: QuestionPatch = serde_json::from_value(json!({ "conditional": [] })).unwrap();
    let next = update_question(&schema, &sid("s2"), &qid("Q4"), &patch).unwrap();
    assert!(next.question("Q4").unwrap().conditional.is_empty());
}

#[test]
fn operations_replay_from_json() {
    let ops: Vec<EditOp> = serde_json::from_value(json!([
        { "op": "add_section", "id": "s3" },
        { "op": "rename_section", "section_id": "s3", "title": "Extras" },
        { "op": "add_question", "section_id": "s3", "id": "Q5" },
        {
            "op": "update_question",
            "section_id": "s3",
            "question_id": "Q5",
            "patch": { "type": "multi", "options": ["A", "B"], "label": "Pick" }
        },
        { "op": "add_conditional", "question_id": "Q5", "dependency_id": "Q3" },
        { "op": "delete_question", "section_id": "s2", "question_id": "Q3" }
    ]))
    .unwrap();

    let mut schema = two_sections();
    for op in &ops {
        schema = editor::apply(&schema, op).unwrap();
    }

    let section = schema.section("s3").unwrap();
    assert_eq!(section.title, "Extras");
    let question = schema.question("Q5").unwrap();
    assert_eq!(question.label, "Pick");
    assert_eq!(question.kind.options().to_vec(), vec!["A".to_string(), "B".to_string()]);
    assert!(question.conditional.is_empty());
    assert!(schema.dependency_graph().is_acyclic());
}
