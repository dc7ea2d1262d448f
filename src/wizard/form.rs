use crate::compile::{compile, CompiledField, ProbeOutcome};
use crate::condition::is_visible;
use crate::error::ValidationError;
use crate::schema::Step;
use crate::submit::FileBlob;
use crate::value::{Value, ValueMap};
use ahash::AHashMap;
use tracing::debug;

/// An image-dimension check waiting for its probe.
///
/// The token pins the check to the file that was selected when it was
/// issued: a resolution carrying a stale token is discarded, which is how
/// canceled or superseded probes are prevented from mutating state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCheck {
    pub field: String,
    pub token: u64,
}

/// Everything derived from the current value map: visibility, per-field
/// errors, unresolved checks, and aggregate validity.
///
/// Recomputation is pull-based: it runs after every write and reads only
/// the latest value map, so overlapping edits collapse to the newest
/// snapshot (last-write-wins).
#[derive(Debug, Clone, Default)]
pub struct DerivedState {
    pub visible: AHashMap<String, bool>,
    pub errors: AHashMap<String, Vec<ValidationError>>,
    pub pending: Vec<PendingCheck>,
    pub is_valid: bool,
}

impl DerivedState {
    pub fn field_errors(&self, name: &str) -> &[ValidationError] {
        self.errors.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_field_visible(&self, name: &str) -> bool {
        self.visible.get(name).copied().unwrap_or(false)
    }
}

/// The live form state of one wizard step.
pub struct StepForm {
    fields: Vec<CompiledField>,
    values: ValueMap,
    files: AHashMap<String, FileBlob>,
    probed: AHashMap<String, ProbeOutcome>,
    file_tokens: AHashMap<String, u64>,
    revision: u64,
    derived: DerivedState,
}

impl StepForm {
    /// Compiles every field of the step and materializes default values.
    pub fn new(step: &Step) -> Self {
        let fields: Vec<CompiledField> = step.fields().map(compile).collect();
        let values: ValueMap = fields
            .iter()
            .map(|f| (f.name.clone(), f.default.clone()))
            .collect();

        let mut form = Self {
            fields,
            values,
            files: AHashMap::new(),
            probed: AHashMap::new(),
            file_tokens: AHashMap::new(),
            revision: 0,
            derived: DerivedState::default(),
        };
        form.recompute();
        form
    }

    /// Writes one field value and recomputes the derived state.
    ///
    /// Writes to unknown or disabled fields are ignored; the returned
    /// derived state is then simply the current one.
    pub fn set_value(&mut self, name: &str, value: impl Into<Value>) -> &DerivedState {
        let disabled = self
            .fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.is_disabled);
        match disabled {
            Some(false) => {
                self.values.insert(name.to_string(), value.into());
                self.revision += 1;
                self.recompute();
            }
            Some(true) => debug!(field = name, "ignored write to disabled field"),
            None => debug!(field = name, "ignored write to unknown field"),
        }
        &self.derived
    }

    /// Attaches a file to a field. The form value becomes the file name;
    /// the blob itself is held for validation and submission. Any earlier
    /// probe result for the field is dropped.
    pub fn set_file(&mut self, name: &str, blob: FileBlob) -> &DerivedState {
        if !self.fields.iter().any(|f| f.name == name) {
            debug!(field = name, "ignored file for unknown field");
            return &self.derived;
        }
        self.revision += 1;
        self.values
            .insert(name.to_string(), Value::Text(blob.file_name.clone()));
        self.files.insert(name.to_string(), blob);
        self.file_tokens.insert(name.to_string(), self.revision);
        self.probed.remove(name);
        self.recompute();
        &self.derived
    }

    /// Removes a field's file selection.
    pub fn clear_file(&mut self, name: &str) -> &DerivedState {
        if self.files.remove(name).is_some() {
            self.revision += 1;
            self.values
                .insert(name.to_string(), Value::Text(String::new()));
            self.file_tokens.remove(name);
            self.probed.remove(name);
            self.recompute();
        }
        &self.derived
    }

    /// Delivers a probe result. Returns `false` (and changes nothing) when
    /// the token is stale, i.e. the file changed or was cleared while the
    /// probe was in flight.
    pub fn resolve_probe(&mut self, field: &str, token: u64, outcome: ProbeOutcome) -> bool {
        if self.file_tokens.get(field) != Some(&token) {
            debug!(field, token, "discarded stale probe result");
            return false;
        }
        self.probed.insert(field.to_string(), outcome);
        self.recompute();
        true
    }

    /// Recomputes visibility and validity from the current value map.
    ///
    /// Invisible fields contribute neither errors nor pending checks, no
    /// matter what their own constraints say; their entries reappear the
    /// moment a condition makes them visible again.
    fn recompute(&mut self) {
        let mut derived = DerivedState {
            is_valid: true,
            ..DerivedState::default()
        };

        for field in &self.fields {
            let visible = !field.is_hidden && is_visible(&field.conditions, &self.values);
            derived.visible.insert(field.name.clone(), visible);
            if !visible {
                continue;
            }

            let value = self.values.get(&field.name).unwrap_or(&Value::Null);
            let check = field.validate(
                value,
                self.files.get(&field.name),
                self.probed.get(&field.name),
            );

            if check.needs_probe {
                derived.pending.push(PendingCheck {
                    field: field.name.clone(),
                    token: self.file_tokens.get(&field.name).copied().unwrap_or(0),
                });
                derived.is_valid = false;
            }
            if !check.errors.is_empty() {
                derived.is_valid = false;
                derived.errors.insert(field.name.clone(), check.errors);
            }
        }

        self.derived = derived;
    }

    pub fn derived(&self) -> &DerivedState {
        &self.derived
    }

    pub fn values(&self) -> &ValueMap {
        &self.values
    }

    pub fn value(&self, name: &str) -> &Value {
        self.values.get(name).unwrap_or(&Value::Null)
    }

    pub fn file(&self, name: &str) -> Option<&FileBlob> {
        self.files.get(name)
    }

    pub fn files(&self) -> &AHashMap<String, FileBlob> {
        &self.files
    }

    pub fn fields(&self) -> &[CompiledField] {
        &self.fields
    }

    /// Monotonic write counter; pending checks are tokenized against it.
    pub fn revision(&self) -> u64 {
        self.revision
    }
}
