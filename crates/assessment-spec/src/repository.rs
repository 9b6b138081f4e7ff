use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::spec::Schema;
use crate::submission::{SubmissionReceipt, SubmissionRequest};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error(
        "assessment for job '{job_id}' changed since it was loaded (stored {stored}, submitted {submitted})"
    )]
    Conflict {
        job_id: String,
        stored: i64,
        submitted: i64,
    },
    #[error("transport failure: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// How a save treats a snapshot that was loaded before the latest save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConcurrencyPolicy {
    /// Every save replaces the stored schema.
    #[default]
    LastWriteWins,
    /// A save whose `updatedAt` differs from the stored one is refused.
    RejectStale,
}

/// Storage of assessment schemas, one per job.
#[async_trait]
pub trait SchemaRepository: Send + Sync {
    /// `Ok(None)` when the job has no assessment.
    async fn get(&self, job_id: &str) -> Result<Option<Schema>, RepositoryError>;

    /// Replaces the whole schema; the returned snapshot carries the stored
    /// `jobId` and the new `updatedAt`.
    async fn put(&self, job_id: &str, schema: Schema) -> Result<Schema, RepositoryError>;
}

#[async_trait]
pub trait SubmissionRepository: Send + Sync {
    async fn post(
        &self,
        job_id: &str,
        request: SubmissionRequest,
    ) -> Result<SubmissionReceipt, RepositoryError>;
}

/// Process-local stand-in for the assessment endpoints.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    schemas: RwLock<BTreeMap<String, Schema>>,
    submissions: RwLock<Vec<SubmissionReceipt>>,
    policy: ConcurrencyPolicy,
}

impl InMemoryRepository {
    pub fn new(policy: ConcurrencyPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    /// Repository honouring the `concurrency` switch of an engine config.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.concurrency)
    }

    /// Stores a schema as-is, bypassing stamping and version checks.
    pub async fn seed(&self, schema: Schema) {
        self.schemas
            .write()
            .await
            .insert(schema.job_id().to_string(), schema);
    }

    pub async fn submissions(&self, job_id: &str) -> Vec<SubmissionReceipt> {
        self.submissions
            .read()
            .await
            .iter()
            .filter(|receipt| receipt.job_id == job_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl SchemaRepository for InMemoryRepository {
    async fn get(&self, job_id: &str) -> Result<Option<Schema>, RepositoryError> {
        Ok(self.schemas.read().await.get(job_id).cloned())
    }

    async fn put(&self, job_id: &str, schema: Schema) -> Result<Schema, RepositoryError> {
        let mut schemas = self.schemas.write().await;
        let stored = schemas.get(job_id).map(Schema::updated_at);

        if self.policy == ConcurrencyPolicy::RejectStale
            && let Some(stored) = stored
            && stored != schema.updated_at()
        {
            tracing::warn!(
                job_id,
                stored,
                submitted = schema.updated_at(),
                "rejected stale assessment save"
            );
            return Err(RepositoryError::Conflict {
                job_id: job_id.to_string(),
                stored,
                submitted: schema.updated_at(),
            });
        }

        let updated_at = next_timestamp(stored);
        let saved = schema.with_revision(job_id, updated_at);
        schemas.insert(job_id.to_string(), saved.clone());
        tracing::info!(job_id, updated_at, questions = saved.len(), "assessment saved");
        Ok(saved)
    }
}

#[async_trait]
impl SubmissionRepository for InMemoryRepository {
    async fn post(
        &self,
        job_id: &str,
        request: SubmissionRequest,
    ) -> Result<SubmissionReceipt, RepositoryError> {
        let receipt = SubmissionReceipt {
            id: Uuid::new_v4().to_string(),
            job_id: job_id.to_string(),
            candidate_id: request.candidate_id,
            answers: request.answers,
            submitted_at: Utc::now().timestamp_millis(),
        };
        self.submissions.write().await.push(receipt.clone());
        tracing::info!(
            job_id,
            submission_id = %receipt.id,
            answers = receipt.answers.len(),
            "assessment submission recorded"
        );
        Ok(receipt)
    }
}

// strictly increasing so a stamp can serve as a version
fn next_timestamp(previous: Option<i64>) -> i64 {
    let now = Utc::now().timestamp_millis();
    previous.map_or(now, |previous| now.max(previous + 1))
}
