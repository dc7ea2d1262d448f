//! Case-submission assembly.
//!
//! Collects the per-step value maps into one flat `case_data` map, overlays
//! file selections as file-bearing entries, and emits the ordered
//! `file_types` classification list. Assembly is deterministic: identical
//! inputs produce value-equal payloads, so a failed submission can be
//! retried idempotently.

use crate::lookup::LookupOption;
use crate::schema::{Field, FieldKind, FlowSchema};
use crate::value::{Value, ValueMap};
use ahash::AHashMap;
use serde::ser::{Serialize, Serializer};
use serde::Deserialize;
use std::sync::Arc;

/// An attachment owned by the form until submission.
///
/// The bytes sit behind an `Arc` so assembling a payload shares rather than
/// copies them, and the wizard keeps its selection for a retry after a
/// failed submission.
#[derive(Debug, Clone, PartialEq)]
pub struct FileBlob {
    pub file_name: String,
    pub content_type: String,
    bytes: Arc<Vec<u8>>,
}

impl FileBlob {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes: Arc::new(bytes),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// The dot-prefixed, lowercased extension ("report.PDF" -> ".pdf").
    pub fn extension(&self) -> String {
        let tail = self
            .file_name
            .rsplit('.')
            .next()
            .unwrap_or(self.file_name.as_str());
        format!(".{}", tail.to_lowercase())
    }

    pub fn is_image(&self) -> bool {
        self.content_type.starts_with("image/")
    }
}

/// A file chosen for a specific field of a specific navigable step.
#[derive(Debug, Clone, PartialEq)]
pub struct FileSelection {
    pub step_index: usize,
    pub field_name: String,
    pub blob: FileBlob,
}

/// Maps field names to the portal's file-type classification codes.
///
/// The mapping is an explicit configuration input: the backend schema does
/// not declare it, so the hosting application supplies the codes it knows
/// plus a fallback for fields without one.
#[derive(Debug, Clone, PartialEq)]
pub struct FileTypeCatalog {
    codes: AHashMap<String, String>,
    fallback: String,
}

impl FileTypeCatalog {
    pub fn new(fallback: impl Into<String>) -> Self {
        Self {
            codes: AHashMap::new(),
            fallback: fallback.into(),
        }
    }

    pub fn with_code(mut self, field_name: impl Into<String>, code: impl Into<String>) -> Self {
        self.codes.insert(field_name.into(), code.into());
        self
    }

    pub fn code_for(&self, field_name: &str) -> &str {
        self.codes
            .get(field_name)
            .map(String::as_str)
            .unwrap_or(&self.fallback)
    }
}

/// One entry of `case_data`: either plain data or a file-bearing value the
/// transport must encode as a multipart part.
#[derive(Debug, Clone, PartialEq)]
pub enum CaseValue {
    Data(Value),
    File(FileBlob),
}

impl CaseValue {
    pub fn is_file(&self) -> bool {
        matches!(self, CaseValue::File(_))
    }
}

// File entries serialize as their file name; the transport substitutes the
// actual part when it builds the multipart body.
impl Serialize for CaseValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CaseValue::Data(value) => value.serialize(serializer),
            CaseValue::File(blob) => blob.file_name.serialize(serializer),
        }
    }
}

/// The assembled case payload, ready for the transport collaborator.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct CaseSubmission {
    pub applicant_type: i64,
    pub case_type: i64,
    pub case_data: AHashMap<String, CaseValue>,
    pub file_types: Vec<String>,
}

impl CaseSubmission {
    /// True when the transport must use multipart encoding.
    pub fn has_attachments(&self) -> bool {
        self.case_data.values().any(CaseValue::is_file)
    }
}

/// Acknowledgement returned by the case endpoints.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CaseReceipt {
    #[serde(default)]
    pub case_id: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Builds the submission payload from per-step values and file selections.
///
/// `step_values` holds one value map per navigable step, in step order;
/// later steps overwrite earlier ones on a (schema-authoring-error) key
/// collision. Each file selection replaces the flattened value of its field
/// and appends one classification code to `file_types`, in schema
/// field-iteration order.
pub fn assemble(
    schema: &FlowSchema,
    applicant_type: i64,
    case_type: i64,
    step_values: &[ValueMap],
    files: &[FileSelection],
    catalog: &FileTypeCatalog,
) -> CaseSubmission {
    let mut case_data = AHashMap::new();

    for (index, step) in schema.navigable_steps().enumerate() {
        let Some(values) = step_values.get(index) else {
            continue;
        };
        for field in step.fields() {
            if let Some(value) = normalized_value(field, values.get(&field.name)) {
                case_data.insert(field.name.clone(), CaseValue::Data(value));
            }
        }
    }

    let by_slot: AHashMap<(usize, &str), &FileSelection> = files
        .iter()
        .map(|f| ((f.step_index, f.field_name.as_str()), f))
        .collect();

    let mut file_types = Vec::new();
    for (index, step) in schema.navigable_steps().enumerate() {
        for field in step.fields() {
            if let Some(selection) = by_slot.get(&(index, field.name.as_str())) {
                case_data.insert(
                    field.name.clone(),
                    CaseValue::File(selection.blob.clone()),
                );
                file_types.push(catalog.code_for(&field.name).to_string());
            }
        }
    }

    CaseSubmission {
        applicant_type,
        case_type,
        case_data,
        file_types,
    }
}

/// Normalizes one field's raw form value for submission; `None` drops the
/// entry from `case_data`.
fn normalized_value(field: &Field, value: Option<&Value>) -> Option<Value> {
    let value = value?;
    if matches!(value, Value::Null) {
        return None;
    }

    match &field.kind {
        FieldKind::Numeric(rules) => {
            let mut n = value.as_number()?;
            if rules.integer_only {
                n = n.floor();
            } else if let Some(precision) = rules.precision {
                let scale = 10f64.powi(precision as i32);
                n = (n * scale).round() / scale;
            }
            Some(Value::Number(n))
        }
        FieldKind::Boolean { .. } => Some(Value::Bool(truthy(value))),
        FieldKind::Choice(rules) => {
            if rules.is_single() {
                Some(value.clone())
            } else {
                // Multi-selects always submit a list, even for a lone value.
                match value {
                    Value::List(_) => Some(value.clone()),
                    other => Some(Value::List(vec![other.clone()])),
                }
            }
        }
        // File fields only reach case_data through a FileSelection.
        FieldKind::File(_) => None,
        FieldKind::Nested(_) => None,
        _ => {
            let text = value.coerce_text().trim().to_string();
            Some(Value::Text(text))
        }
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => *n != 0.0,
        Value::Text(s) => !s.is_empty(),
        Value::List(items) => !items.is_empty(),
        Value::Null => false,
    }
}

/// Convenience for tests and hosts seeding choice fields from inline
/// options: the submitted value of an option is its id.
pub fn option_value(option: &LookupOption) -> Value {
    Value::Number(option.id as f64)
}
