use std::fmt;

use thiserror::Error;

use crate::answers::{Answer, AnswerStore, Answers};
use crate::config::EngineConfig;
use crate::editor::{self, EditError, EditOp};
use crate::repository::{RepositoryError, SchemaRepository, SubmissionRepository};
use crate::spec::{QuestionId, Schema};
use crate::submission::{SubmissionReceipt, assemble_submission};
use crate::validate::{ValidationError, ValidationPolicy, ValidationResult, validate_with};
use crate::visibility::{VisibilityStrategy, VisibleSet};

/// Respondent session lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Loading,
    Ready,
    Validating,
    Submitted,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SessionState::Loading => "loading",
            SessionState::Ready => "ready",
            SessionState::Validating => "validating",
            SessionState::Submitted => "submitted",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("assessment session is {0}, not ready for input")]
    NotReady(SessionState),
    #[error("assessment has already been submitted")]
    Closed,
    #[error("assessment has {} validation error(s)", .0.errors.len())]
    Invalid(ValidationResult),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// One respondent filling in one job's assessment.
///
/// `Loading -> Ready`; answer changes keep it `Ready`; validation passes
/// through `Validating` and returns to `Ready` with the errors attached;
/// a successful submission ends in `Submitted`.
#[derive(Debug)]
pub struct RespondentSession {
    job_id: String,
    schema: Option<Schema>,
    store: AnswerStore,
    strategy: VisibilityStrategy,
    policy: ValidationPolicy,
    state: SessionState,
    errors: Vec<ValidationError>,
}

impl RespondentSession {
    /// Session waiting for its schema.
    pub fn open(job_id: impl Into<String>, config: &EngineConfig) -> Self {
        Self {
            job_id: job_id.into(),
            schema: None,
            store: AnswerStore::default(),
            strategy: config.visibility,
            policy: config.validation,
            state: SessionState::Loading,
            errors: Vec::new(),
        }
    }

    /// Session over an already loaded schema.
    pub fn from_schema(schema: Schema, config: &EngineConfig) -> Self {
        let mut session = Self::open(schema.job_id().to_string(), config);
        session.start(schema);
        session
    }

    /// Fetches the schema. Returns `false` and stays `Loading` when the job
    /// has no assessment.
    pub async fn load(&mut self, repo: &dyn SchemaRepository) -> Result<bool, SessionError> {
        if self.state != SessionState::Loading {
            return Err(SessionError::NotReady(self.state));
        }
        match repo.get(&self.job_id).await? {
            Some(schema) => {
                self.start(schema);
                Ok(true)
            }
            None => {
                tracing::debug!(job_id = %self.job_id, "no assessment for job");
                Ok(false)
            }
        }
    }

    fn start(&mut self, schema: Schema) {
        self.store = AnswerStore::new(&schema, self.strategy);
        self.schema = Some(schema);
        self.state = SessionState::Ready;
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn schema(&self) -> Option<&Schema> {
        self.schema.as_ref()
    }

    pub fn answers(&self) -> &Answers {
        self.store.answers()
    }

    pub fn visible(&self) -> &VisibleSet {
        self.store.visible()
    }

    /// Errors from the last validation.
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    pub fn set_answer(
        &mut self,
        id: impl Into<QuestionId>,
        answer: impl Into<Answer>,
    ) -> Result<&VisibleSet, SessionError> {
        self.ensure_ready()?;
        let schema = self.schema.as_ref().ok_or(SessionError::NotReady(self.state))?;
        Ok(self.store.set(schema, id.into(), answer.into()))
    }

    pub fn clear_answer(&mut self, id: &str) -> Result<&VisibleSet, SessionError> {
        self.ensure_ready()?;
        let schema = self.schema.as_ref().ok_or(SessionError::NotReady(self.state))?;
        Ok(self.store.clear(schema, id))
    }

    pub fn validate(&mut self) -> Result<ValidationResult, SessionError> {
        self.ensure_ready()?;
        let schema = self.schema.as_ref().ok_or(SessionError::NotReady(self.state))?;
        self.state = SessionState::Validating;
        let result = validate_with(schema, self.store.answers(), self.store.visible(), &self.policy);
        self.errors = result.errors.clone();
        self.state = SessionState::Ready;
        Ok(result)
    }

    /// Validates, assembles and posts the submission. On any failure the
    /// session returns to `Ready` with its answers intact; nothing is retried.
    pub async fn submit(
        &mut self,
        repo: &dyn SubmissionRepository,
        candidate_id: &str,
    ) -> Result<SubmissionReceipt, SessionError> {
        let result = self.validate()?;
        if !result.valid {
            return Err(SessionError::Invalid(result));
        }
        let schema = self.schema.as_ref().ok_or(SessionError::NotReady(self.state))?;
        let request = assemble_submission(schema, self.store.answers(), candidate_id);

        self.state = SessionState::Validating;
        match repo.post(&self.job_id, request).await {
            Ok(receipt) => {
                self.state = SessionState::Submitted;
                self.store = AnswerStore::default();
                tracing::info!(job_id = %self.job_id, submission_id = %receipt.id, "assessment submitted");
                Ok(receipt)
            }
            Err(err) => {
                self.state = SessionState::Ready;
                tracing::warn!(job_id = %self.job_id, error = %err, "assessment submission failed");
                Err(err.into())
            }
        }
    }

    fn ensure_ready(&self) -> Result<(), SessionError> {
        match self.state {
            SessionState::Ready => Ok(()),
            SessionState::Submitted => Err(SessionError::Closed),
            other => Err(SessionError::NotReady(other)),
        }
    }
}

/// Author-side editing of one schema. Edits apply locally right away; a save
/// sends the whole snapshot once and keeps local work if it fails.
#[derive(Debug, Clone)]
pub struct AuthoringSession {
    schema: Schema,
    dirty: bool,
}

impl AuthoringSession {
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            dirty: false,
        }
    }

    /// Loads the stored schema; `Ok(None)` when the job has none yet.
    pub async fn load(
        repo: &dyn SchemaRepository,
        job_id: &str,
    ) -> Result<Option<Self>, RepositoryError> {
        Ok(repo.get(job_id).await?.map(Self::new))
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Whether there are edits not yet accepted by the repository.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn apply(&mut self, op: &EditOp) -> Result<&Schema, EditError> {
        self.schema = editor::apply(&self.schema, op)?;
        self.dirty = true;
        Ok(&self.schema)
    }

    pub async fn save(&mut self, repo: &dyn SchemaRepository) -> Result<&Schema, RepositoryError> {
        let job_id = self.schema.job_id().to_string();
        let saved = repo.put(&job_id, self.schema.clone()).await?;
        self.schema = saved;
        self.dirty = false;
        Ok(&self.schema)
    }
}
