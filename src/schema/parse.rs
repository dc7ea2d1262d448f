//! Normalization of the wire format into the typed model.

use super::definition::{
    Category, ChoiceRules, Field, FieldKind, FileRules, FlowSchema, NumericRules, NumericStyle,
    Step, TextRules,
};
use super::raw::{FlowResponse, RawCategory, RawField, RawStep};
use crate::error::SchemaError;
use itertools::Itertools;

impl FlowSchema {
    /// Builds the normalized schema from a backend response.
    ///
    /// Steps are sorted by ascending numeric sequence; hidden pages stay in
    /// the list (index stability) but are excluded from the navigable
    /// sequence. A non-numeric sequence number or an empty flow fails.
    pub fn from_response(response: FlowResponse) -> Result<FlowSchema, SchemaError> {
        let steps = response
            .service_flow
            .into_iter()
            .map(parse_step)
            .collect::<Result<Vec<_>, _>>()?;
        FlowSchema::from_steps(steps)
    }

    /// Builds the schema from already-typed steps, applying the same
    /// ordering and navigability rules as [`FlowSchema::from_response`].
    pub fn from_steps(steps: Vec<Step>) -> Result<FlowSchema, SchemaError> {
        if steps.is_empty() {
            return Err(SchemaError::EmptyFlow);
        }

        let steps: Vec<Step> = steps
            .into_iter()
            .sorted_by_key(|step| step.sequence)
            .collect();

        let navigable = steps
            .iter()
            .enumerate()
            .filter(|(_, step)| !step.is_hidden)
            .map(|(index, _)| index)
            .collect();

        Ok(FlowSchema { steps, navigable })
    }

    /// Convenience: decode a raw JSON response and normalize it.
    pub fn from_json(json: &str) -> Result<FlowSchema, SchemaError> {
        let response: FlowResponse =
            serde_json::from_str(json).map_err(|e| SchemaError::Decode(e.to_string()))?;
        FlowSchema::from_response(response)
    }
}

fn parse_step(raw: RawStep) -> Result<Step, SchemaError> {
    let sequence = raw.sequence_number.trim().parse::<u32>().map_err(|_| {
        SchemaError::InvalidSequenceNumber {
            page_id: raw.page_id,
            raw: raw.sequence_number.clone(),
        }
    })?;

    Ok(Step {
        page_id: raw.page_id,
        sequence,
        name: raw.name,
        name_ara: raw.name_ara,
        description: raw.description,
        is_hidden: raw.is_hidden_page,
        categories: raw.categories.into_iter().map(parse_category).collect(),
    })
}

fn parse_category(raw: RawCategory) -> Category {
    Category {
        id: raw.id,
        name: raw.name,
        name_ara: raw.name_ara,
        repeatable: raw.repeatable,
        fields: raw.fields.into_iter().map(parse_field).collect(),
    }
}

fn parse_field(raw: RawField) -> Field {
    let kind = parse_kind(&raw);
    Field {
        name: raw.name,
        field_id: raw.field_id,
        display_name: raw.display_name,
        display_name_ara: raw.display_name_ara,
        mandatory: raw.mandatory,
        is_hidden: raw.is_hidden,
        is_disabled: raw.is_disabled,
        visibility_conditions: raw.visibility_conditions,
        kind,
    }
}

fn parse_kind(raw: &RawField) -> FieldKind {
    match raw.field_type.as_str() {
        "text" => FieldKind::Text(text_rules(raw)),
        "number" => FieldKind::Numeric(numeric_rules(raw, NumericStyle::Number)),
        "decimal" => FieldKind::Numeric(numeric_rules(raw, NumericStyle::Decimal)),
        "percentage" => FieldKind::Numeric(numeric_rules(raw, NumericStyle::Percentage)),
        "boolean" => FieldKind::Boolean {
            default: raw.default_boolean.unwrap_or(false),
        },
        "choice" => FieldKind::Choice(ChoiceRules {
            lookup: raw.lookup,
            options: raw.allowed_lookups.clone(),
            min_selections: raw.min_selections,
            max_selections: raw.max_selections,
        }),
        "file" => FieldKind::File(FileRules {
            accepted_types: raw.file_types.clone(),
            max_size: raw.max_file_size,
            max_width: raw.image_max_width,
            max_height: raw.image_max_height,
        }),
        // Unknown tags with sub-fields act as grouping containers; every
        // other unknown tag (date, email, url, ...) degrades to text-like
        // behavior instead of failing the load.
        _ if !raw.sub_fields.is_empty() => {
            FieldKind::Nested(raw.sub_fields.iter().cloned().map(parse_field).collect())
        }
        _ => FieldKind::Text(text_rules(raw)),
    }
}

fn text_rules(raw: &RawField) -> TextRules {
    TextRules {
        min_length: raw.min_length,
        max_length: raw.max_length,
        regex_pattern: raw.regex_pattern.clone(),
        allowed_characters: raw.allowed_characters.clone(),
        forbidden_words: raw.forbidden_words.clone(),
    }
}

fn numeric_rules(raw: &RawField, style: NumericStyle) -> NumericRules {
    NumericRules {
        style,
        greater_than: raw.value_greater_than,
        less_than: raw.value_less_than,
        integer_only: raw.integer_only,
        positive_only: raw.positive_only,
        precision: raw.precision,
    }
}
