use serde::{Deserialize, Serialize};

use crate::answers::Answers;
use crate::spec::Schema;
use crate::visibility::settle;

/// Payload handed to the submission endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRequest {
    pub candidate_id: String,
    pub answers: Answers,
}

impl SubmissionRequest {
    pub fn to_cbor(&self) -> Result<Vec<u8>, serde_cbor::Error> {
        serde_cbor::to_vec(self)
    }
}

/// Submission as recorded by the endpoint, which assigns `id` and
/// `submittedAt`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
    pub id: String,
    pub job_id: String,
    pub candidate_id: String,
    pub answers: Answers,
    pub submitted_at: i64,
}

/// Builds the submission payload. Visibility is derived again from the
/// answers instead of trusting the caller's pruning, so answers to hidden
/// questions never leave the engine.
pub fn assemble_submission(
    schema: &Schema,
    answers: &Answers,
    candidate_id: impl Into<String>,
) -> SubmissionRequest {
    let mut restricted = answers.clone();
    settle(schema, &mut restricted);
    SubmissionRequest {
        candidate_id: candidate_id.into(),
        answers: restricted,
    }
}
