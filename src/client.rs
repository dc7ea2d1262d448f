//! External collaborators and the session driver.
//!
//! The engine never talks HTTP itself: the hosting application implements
//! [`PortalApi`] (transport, retries below a small fixed bound, token
//! handling) and [`ImageProbe`] (image decoding), and [`FlowSession`] wires
//! them to the schema model, the wizard, and the assembler.

use crate::compile::ProbeOutcome;
use crate::error::{ApiError, FlowError, ProbeError};
use crate::lookup::{LookupCache, LookupId, LookupOption};
use crate::schema::{FieldKind, FlowResponse, FlowSchema};
use crate::submit::{assemble, CaseReceipt, CaseSubmission, FileBlob, FileTypeCatalog};
use crate::value::Value;
use crate::wizard::{Advance, DerivedState, Wizard};
use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Schema-load attempts beyond the first.
const SCHEMA_FETCH_RETRIES: usize = 2;

/// The portal backend, as seen by the engine.
#[async_trait]
pub trait PortalApi: Send + Sync {
    async fn fetch_flow_schema(&self, service_code: &str) -> Result<FlowResponse, ApiError>;

    async fn fetch_lookup_options(&self, lookup: LookupId)
        -> Result<Vec<LookupOption>, ApiError>;

    /// Submits a completed case. File-bearing payloads go out as multipart
    /// form submissions, plain payloads as JSON; that choice belongs to the
    /// implementor (`CaseSubmission::has_attachments` tells them which).
    async fn submit_case(&self, case: &CaseSubmission) -> Result<CaseReceipt, ApiError>;

    async fn save_draft_case(&self, case: &CaseSubmission) -> Result<CaseReceipt, ApiError>;

    /// Gates `FlowSession::load`; the engine never reads token contents.
    fn is_authenticated(&self) -> bool;
}

/// Asynchronous image decoding for the dimension validator.
#[async_trait]
pub trait ImageProbe: Send + Sync {
    async fn dimensions(&self, blob: &FileBlob) -> Result<(u32, u32), ProbeError>;
}

/// Static configuration of one flow session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Service code used to fetch the flow schema.
    pub service_code: String,
    /// Backend case-type id of the service being applied for.
    pub case_type: i64,
    /// Applicant classification forwarded verbatim into the payload.
    pub applicant_type: i64,
    /// File-type classification codes for file-bearing fields.
    pub file_types: FileTypeCatalog,
}

/// Outcome of a forward transition at the session level.
#[derive(Debug, Clone)]
pub enum SessionAdvance {
    Moved(usize),
    /// The last step validated and the case was submitted.
    Submitted(CaseReceipt),
    Blocked {
        errors: Vec<crate::error::ValidationError>,
        pending: Vec<String>,
    },
}

enum SessionState {
    Idle,
    Ready {
        schema: FlowSchema,
        wizard: Wizard,
        /// Canceled whenever the step index changes or the session is
        /// abandoned; in-flight probes for the departed step die with it.
        step_guard: CancellationToken,
    },
    Failed(FlowError),
}

/// Owns one user's walk through one service flow.
///
/// All mutation goes through this single owner; the engine performs no
/// parallel work of its own. The three suspension points (schema load,
/// lookup fetch, image probe) are awaited here and never stall evaluation
/// of unrelated fields.
pub struct FlowSession {
    api: Arc<dyn PortalApi>,
    probe: Arc<dyn ImageProbe>,
    lookups: Arc<LookupCache>,
    config: SessionConfig,
    state: SessionState,
}

impl FlowSession {
    pub fn new(
        api: Arc<dyn PortalApi>,
        probe: Arc<dyn ImageProbe>,
        lookups: Arc<LookupCache>,
        config: SessionConfig,
    ) -> Self {
        Self {
            api,
            probe,
            lookups,
            config,
            state: SessionState::Idle,
        }
    }

    /// Loads the schema, builds the wizard, and prefetches lookup options.
    ///
    /// Transient fetch failures are retried up to two times; any final
    /// failure is recorded and returned, and a later `load` call starts
    /// over from scratch.
    pub async fn load(&mut self) -> Result<(), FlowError> {
        self.state = SessionState::Idle;

        if !self.api.is_authenticated() {
            return self.fail(ApiError::Unauthorized.into());
        }

        let response = match self.fetch_schema_with_retries().await {
            Ok(response) => response,
            Err(err) => return self.fail(err.into()),
        };

        let schema = match FlowSchema::from_response(response) {
            Ok(schema) => schema,
            Err(err) => return self.fail(err.into()),
        };

        let wizard = Wizard::new(&schema);
        debug!(
            steps = wizard.total_steps(),
            service = %self.config.service_code,
            "service flow ready"
        );

        self.prefetch_lookups(&schema).await;

        self.state = SessionState::Ready {
            schema,
            wizard,
            step_guard: CancellationToken::new(),
        };
        Ok(())
    }

    async fn fetch_schema_with_retries(&self) -> Result<FlowResponse, ApiError> {
        let mut attempt = 0;
        loop {
            match self.api.fetch_flow_schema(&self.config.service_code).await {
                Ok(response) => return Ok(response),
                Err(err) if err.is_transient() && attempt < SCHEMA_FETCH_RETRIES => {
                    attempt += 1;
                    warn!(attempt, error = %err, "schema fetch failed; retrying");
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Resolves every lookup referenced by a choice field, once per id.
    /// Failures degrade to empty option lists and never fail the load.
    async fn prefetch_lookups(&self, schema: &FlowSchema) {
        let mut seen = Vec::new();
        for step in schema.navigable_steps() {
            for field in step.fields() {
                if let FieldKind::Choice(rules) = &field.kind {
                    if rules.options.is_empty() {
                        if let Some(id) = rules.lookup {
                            if !seen.contains(&id) {
                                seen.push(id);
                                self.lookups.get_or_fetch(id, self.api.as_ref()).await;
                            }
                        }
                    }
                }
            }
        }
    }

    fn fail(&mut self, err: FlowError) -> Result<(), FlowError> {
        self.state = SessionState::Failed(err.clone());
        Err(err)
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, SessionState::Ready { .. })
    }

    pub fn last_error(&self) -> Option<&FlowError> {
        match &self.state {
            SessionState::Failed(err) => Some(err),
            _ => None,
        }
    }

    pub fn schema(&self) -> Option<&FlowSchema> {
        match &self.state {
            SessionState::Ready { schema, .. } => Some(schema),
            _ => None,
        }
    }

    pub fn wizard(&self) -> Option<&Wizard> {
        match &self.state {
            SessionState::Ready { wizard, .. } => Some(wizard),
            _ => None,
        }
    }

    pub fn wizard_mut(&mut self) -> Option<&mut Wizard> {
        match &mut self.state {
            SessionState::Ready { wizard, .. } => Some(wizard),
            _ => None,
        }
    }

    /// Writes one value on the current step and returns the fresh derived
    /// state.
    pub fn set_value(
        &mut self,
        field: &str,
        value: impl Into<Value>,
    ) -> Result<&DerivedState, FlowError> {
        match &mut self.state {
            SessionState::Ready { wizard, .. } => {
                Ok(wizard.current_step_mut().set_value(field, value))
            }
            _ => Err(FlowError::NotReady),
        }
    }

    /// Attaches a file on the current step.
    pub fn set_file(&mut self, field: &str, blob: FileBlob) -> Result<&DerivedState, FlowError> {
        match &mut self.state {
            SessionState::Ready { wizard, .. } => {
                Ok(wizard.current_step_mut().set_file(field, blob))
            }
            _ => Err(FlowError::NotReady),
        }
    }

    /// The options a choice field should render: inline options win,
    /// otherwise whatever the lookup cache has resolved so far.
    pub fn options_for(&self, field_name: &str) -> Vec<LookupOption> {
        let Some(schema) = self.schema() else {
            return Vec::new();
        };
        for step in schema.navigable_steps() {
            if let Some(field) = step.field(field_name) {
                if let FieldKind::Choice(rules) = &field.kind {
                    if !rules.options.is_empty() {
                        return rules.options.clone();
                    }
                    if let Some(id) = rules.lookup {
                        if let Some(options) = self.lookups.get(id) {
                            return (*options).clone();
                        }
                    }
                }
                return Vec::new();
            }
        }
        Vec::new()
    }

    /// Drives every pending image-dimension check of the current step to a
    /// resolution. Returns early (without touching state) if the step guard
    /// is canceled, and discards resolutions whose token went stale.
    pub async fn settle(&mut self) -> Result<(), FlowError> {
        let SessionState::Ready {
            wizard, step_guard, ..
        } = &mut self.state
        else {
            return Err(FlowError::NotReady);
        };

        loop {
            let pending = wizard.current_step().derived().pending.clone();
            if pending.is_empty() {
                return Ok(());
            }
            let guard = step_guard.clone();

            for check in pending {
                let Some(blob) = wizard.current_step().file(&check.field).cloned() else {
                    continue;
                };
                let outcome = tokio::select! {
                    _ = guard.cancelled() => return Ok(()),
                    result = self.probe.dimensions(&blob) => match result {
                        Ok((width, height)) => ProbeOutcome::Dimensions { width, height },
                        Err(err) => {
                            warn!(field = %check.field, error = %err, "image probe failed; dimension limits waived");
                            ProbeOutcome::Undecodable
                        }
                    },
                };
                wizard
                    .current_step_mut()
                    .resolve_probe(&check.field, check.token, outcome);
            }
        }
    }

    /// Attempts to move forward, settling pending checks first. On the
    /// last step a valid form is assembled and submitted; a submission
    /// failure preserves the full wizard state for a retry.
    pub async fn next(&mut self) -> Result<SessionAdvance, FlowError> {
        if !self.is_ready() {
            return Err(FlowError::NotReady);
        }
        self.settle().await?;

        let advance = match &mut self.state {
            SessionState::Ready { wizard, .. } => wizard.advance(),
            _ => return Err(FlowError::NotReady),
        };

        match advance {
            Advance::Blocked { errors, pending } => Ok(SessionAdvance::Blocked { errors, pending }),
            Advance::Moved(index) => {
                self.rotate_step_guard();
                Ok(SessionAdvance::Moved(index))
            }
            Advance::SubmissionRequired => {
                let payload = self.assemble_payload()?;
                match self.api.submit_case(&payload).await {
                    Ok(receipt) => {
                        // A submitted flow is finished; its state is dropped.
                        self.abandon();
                        Ok(SessionAdvance::Submitted(receipt))
                    }
                    Err(err) => Err(FlowError::Submission(err)),
                }
            }
        }
    }

    fn rotate_step_guard(&mut self) {
        if let SessionState::Ready { step_guard, .. } = &mut self.state {
            rotate(step_guard);
        }
    }

    /// Moves backward; never validates, never clears completion marks.
    pub fn previous(&mut self) -> Result<Option<usize>, FlowError> {
        match &mut self.state {
            SessionState::Ready {
                wizard, step_guard, ..
            } => {
                let moved = wizard.retreat();
                if moved.is_some() {
                    rotate(step_guard);
                }
                Ok(moved)
            }
            _ => Err(FlowError::NotReady),
        }
    }

    /// Collects all entered values, valid or not, and hands them to the
    /// draft endpoint. The step index does not change.
    pub async fn save_draft(&mut self) -> Result<CaseReceipt, FlowError> {
        let payload = self.assemble_payload()?;
        self.api
            .save_draft_case(&payload)
            .await
            .map_err(FlowError::Api)
    }

    /// Assembles the submission payload from the current state.
    pub fn assemble_payload(&self) -> Result<CaseSubmission, FlowError> {
        let SessionState::Ready { schema, wizard, .. } = &self.state else {
            return Err(FlowError::NotReady);
        };
        Ok(assemble(
            schema,
            self.config.applicant_type,
            self.config.case_type,
            &wizard.step_values(),
            &wizard.file_selections(),
            &self.config.file_types,
        ))
    }

    /// Drops all flow state, canceling anything still in flight. Called on
    /// navigation away and after a successful submission.
    pub fn abandon(&mut self) {
        if let SessionState::Ready { step_guard, .. } = &self.state {
            step_guard.cancel();
        }
        self.state = SessionState::Idle;
    }
}

/// Cancels the departed step's guard and arms a fresh one.
fn rotate(guard: &mut CancellationToken) {
    guard.cancel();
    *guard = CancellationToken::new();
}
