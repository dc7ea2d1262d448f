//! Wire-format structures for the service-flow response.
//!
//! These structs match the backend JSON one-to-one and are only an input to
//! the normalization in [`parse`](super::parse); the rest of the engine
//! works on the typed model in [`definition`](super::definition).

use crate::condition::VisibilityCondition;
use crate::lookup::{LookupId, LookupOption};
use serde::Deserialize;

/// The top-level response of the service-flow endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct FlowResponse {
    #[serde(default)]
    pub service_flow: Vec<RawStep>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawStep {
    /// Display order, delivered as a string. Non-numeric content is a
    /// schema error, not a sort-them-last tolerance.
    pub sequence_number: String,
    pub name: String,
    #[serde(default)]
    pub name_ara: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub description_ara: String,
    #[serde(default)]
    pub is_hidden_page: bool,
    pub page_id: i64,
    #[serde(default)]
    pub categories: Vec<RawCategory>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawCategory {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub name_ara: Option<String>,
    #[serde(default)]
    pub repeatable: bool,
    #[serde(default)]
    pub fields: Vec<RawField>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawField {
    pub name: String,
    pub field_id: i64,
    pub display_name: String,
    pub display_name_ara: Option<String>,
    pub field_type: String,
    pub mandatory: bool,
    pub lookup: Option<LookupId>,
    pub allowed_lookups: Vec<LookupOption>,
    pub sub_fields: Vec<RawField>,
    pub is_hidden: bool,
    pub is_disabled: bool,
    pub visibility_conditions: Vec<VisibilityCondition>,

    // Text
    pub max_length: Option<usize>,
    pub min_length: Option<usize>,
    pub regex_pattern: Option<String>,
    pub allowed_characters: Option<String>,
    pub forbidden_words: Option<String>,

    // Numeric
    pub value_greater_than: Option<f64>,
    pub value_less_than: Option<f64>,
    pub integer_only: bool,
    pub positive_only: bool,
    pub precision: Option<u32>,

    // Boolean
    pub default_boolean: Option<bool>,

    // Choice
    pub max_selections: Option<usize>,
    pub min_selections: Option<usize>,

    // File
    pub file_types: Option<String>,
    pub max_file_size: Option<u64>,
    pub image_max_width: Option<u32>,
    pub image_max_height: Option<u32>,
}
