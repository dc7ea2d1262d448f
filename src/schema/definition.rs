//! The typed, normalized service-flow model the engine runs on.
//!
//! Built once by [`FlowSchema::from_response`](super::FlowSchema::from_response)
//! and never mutated afterwards.

use crate::condition::VisibilityCondition;
use crate::lookup::{LookupId, LookupOption};

/// A complete, ordered service flow.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowSchema {
    /// Every step, hidden ones included, in ascending sequence order.
    /// Hidden steps keep their slot so indices stay stable.
    pub steps: Vec<Step>,
    /// Indices into `steps` of the pages the wizard actually walks.
    pub(crate) navigable: Vec<usize>,
}

impl FlowSchema {
    /// Indices of the navigable (non-hidden) steps, in display order.
    pub fn navigable(&self) -> &[usize] {
        &self.navigable
    }

    /// The navigable steps themselves, in display order.
    pub fn navigable_steps(&self) -> impl Iterator<Item = &Step> {
        self.navigable.iter().map(|&i| &self.steps[i])
    }

    /// The `position`-th navigable step, if in range.
    pub fn navigable_step(&self, position: usize) -> Option<&Step> {
        self.navigable.get(position).map(|&i| &self.steps[i])
    }
}

/// One page of the wizard.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub page_id: i64,
    /// Parsed numeric display order.
    pub sequence: u32,
    pub name: String,
    pub name_ara: Option<String>,
    pub description: String,
    pub is_hidden: bool,
    pub categories: Vec<Category>,
}

impl Step {
    /// All fields of the step, flattened in category order.
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.categories.iter().flat_map(|c| c.fields.iter())
    }

    /// Finds a field by its submission key.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields().find(|f| f.name == name)
    }
}

/// A named grouping of fields within a step.
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub name_ara: Option<String>,
    pub repeatable: bool,
    pub fields: Vec<Field>,
}

/// A single form field: common attributes plus a kind-specific payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Stable submission key.
    pub name: String,
    pub field_id: i64,
    pub display_name: String,
    pub display_name_ara: Option<String>,
    pub mandatory: bool,
    pub is_hidden: bool,
    pub is_disabled: bool,
    pub visibility_conditions: Vec<VisibilityCondition>,
    pub kind: FieldKind,
}

impl Field {
    /// The label used in validation messages.
    pub fn label(&self) -> &str {
        if self.display_name.is_empty() {
            &self.name
        } else {
            &self.display_name
        }
    }
}

/// The tagged union of field kinds with their declared constraints.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Text(TextRules),
    Numeric(NumericRules),
    Boolean { default: bool },
    Choice(ChoiceRules),
    File(FileRules),
    /// A grouping field carrying sub-fields; it has no value of its own.
    Nested(Vec<Field>),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextRules {
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub regex_pattern: Option<String>,
    pub allowed_characters: Option<String>,
    /// Comma-separated forbidden substrings, matched case-insensitively.
    pub forbidden_words: Option<String>,
}

/// Which numeric presentation the field uses. All three share constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericStyle {
    Number,
    Decimal,
    Percentage,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NumericRules {
    pub style: NumericStyle,
    /// Strict lower bound: the value must be greater than this.
    pub greater_than: Option<f64>,
    /// Strict upper bound: the value must be less than this.
    pub less_than: Option<f64>,
    pub integer_only: bool,
    pub positive_only: bool,
    /// Maximum digits after the decimal point.
    pub precision: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChoiceRules {
    /// Backend lookup table feeding the options, if any.
    pub lookup: Option<LookupId>,
    /// Inline options; take precedence over the lookup reference.
    pub options: Vec<LookupOption>,
    pub min_selections: Option<usize>,
    pub max_selections: Option<usize>,
}

impl ChoiceRules {
    /// A choice capped at one selection behaves as a single-select.
    pub fn is_single(&self) -> bool {
        self.max_selections == Some(1)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileRules {
    /// Comma-separated, dot-prefixed extension whitelist (".pdf,.png").
    pub accepted_types: Option<String>,
    pub max_size: Option<u64>,
    pub max_width: Option<u32>,
    pub max_height: Option<u32>,
}
