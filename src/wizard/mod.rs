//! Multi-step wizard state.
//!
//! A [`Wizard`] owns one [`StepForm`] per navigable schema step and
//! enforces the transition rules: forward movement requires the current
//! step to be fully valid for its *visible* fields, backward movement is
//! unconditional and lossless, and advancing past the last step requests
//! submission instead of moving. The summary/submit stage is virtual: it is
//! exactly the [`Advance::SubmissionRequired`] outcome.

use crate::error::ValidationError;
use crate::schema::FlowSchema;
use crate::submit::FileSelection;
use crate::value::ValueMap;

mod form;

pub use form::{DerivedState, PendingCheck, StepForm};

/// The outcome of a forward transition attempt.
#[derive(Debug, Clone)]
pub enum Advance {
    /// Moved to the given step index.
    Moved(usize),
    /// The last step is complete; the caller should assemble and submit.
    SubmissionRequired,
    /// The current step is not valid (or still settling); no movement.
    Blocked {
        errors: Vec<ValidationError>,
        /// Names of fields with unresolved asynchronous checks.
        pending: Vec<String>,
    },
}

/// A point-in-time snapshot of the wizard, for hosts that mirror the
/// engine's state into their own UI model.
#[derive(Debug, Clone)]
pub struct WizardState {
    pub current_step: usize,
    pub total_steps: usize,
    pub per_step_values: Vec<ValueMap>,
    pub completed_steps: Vec<bool>,
    pub is_valid: bool,
}

/// Step sequencing and per-step form state for one service flow.
pub struct Wizard {
    steps: Vec<StepForm>,
    current: usize,
    completed: Vec<bool>,
}

impl Wizard {
    /// Builds one form per navigable step. The schema is only read here;
    /// the wizard owns all mutable state afterwards.
    pub fn new(schema: &FlowSchema) -> Self {
        let steps: Vec<StepForm> = schema.navigable_steps().map(StepForm::new).collect();
        let completed = vec![false; steps.len()];
        Self {
            steps,
            current: 0,
            completed,
        }
    }

    pub fn total_steps(&self) -> usize {
        self.steps.len()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn is_last_step(&self) -> bool {
        self.current + 1 == self.steps.len()
    }

    pub fn completed(&self) -> &[bool] {
        &self.completed
    }

    pub fn step(&self, index: usize) -> Option<&StepForm> {
        self.steps.get(index)
    }

    pub fn step_mut(&mut self, index: usize) -> Option<&mut StepForm> {
        self.steps.get_mut(index)
    }

    pub fn current_step(&self) -> &StepForm {
        &self.steps[self.current]
    }

    pub fn current_step_mut(&mut self) -> &mut StepForm {
        &mut self.steps[self.current]
    }

    pub fn is_current_valid(&self) -> bool {
        self.current_step().derived().is_valid
    }

    /// Attempts to move forward.
    ///
    /// Only legal when the current step's visible fields all validate and
    /// nothing is pending. Marks the step completed; on the last step the
    /// transition becomes a submission request and the index stays put.
    pub fn advance(&mut self) -> Advance {
        let derived = self.current_step().derived();
        if !derived.is_valid {
            return Advance::Blocked {
                errors: derived.errors.values().flatten().cloned().collect(),
                pending: derived.pending.iter().map(|p| p.field.clone()).collect(),
            };
        }

        self.completed[self.current] = true;
        if self.is_last_step() {
            Advance::SubmissionRequired
        } else {
            self.current += 1;
            Advance::Moved(self.current)
        }
    }

    /// Moves backward without any validity requirement. Values and the
    /// completion mark of the step being left are both preserved.
    pub fn retreat(&mut self) -> Option<usize> {
        if self.current == 0 {
            return None;
        }
        self.current -= 1;
        Some(self.current)
    }

    /// Clones every step's value map, in step order, without validating.
    /// This is the draft-save collection path.
    pub fn step_values(&self) -> Vec<ValueMap> {
        self.steps.iter().map(|s| s.values().clone()).collect()
    }

    /// Every file currently attached, keyed for the assembler.
    pub fn file_selections(&self) -> Vec<FileSelection> {
        let mut selections = Vec::new();
        for (index, step) in self.steps.iter().enumerate() {
            for field in step.fields() {
                if let Some(blob) = step.file(&field.name) {
                    selections.push(FileSelection {
                        step_index: index,
                        field_name: field.name.clone(),
                        blob: blob.clone(),
                    });
                }
            }
        }
        selections
    }

    pub fn state(&self) -> WizardState {
        WizardState {
            current_step: self.current,
            total_steps: self.steps.len(),
            per_step_values: self.step_values(),
            completed_steps: self.completed.clone(),
            is_valid: self.is_current_valid(),
        }
    }
}
