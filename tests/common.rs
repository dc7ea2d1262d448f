//! Common test utilities for building service-flow schemas and values.
use caseflow::prelude::*;

/// Creates a bare field of the given kind; not mandatory, always visible.
#[allow(dead_code)]
pub fn field(name: &str, kind: FieldKind) -> Field {
    Field {
        name: name.to_string(),
        field_id: 0,
        display_name: name.to_string(),
        display_name_ara: None,
        mandatory: false,
        is_hidden: false,
        is_disabled: false,
        visibility_conditions: Vec::new(),
        kind,
    }
}

#[allow(dead_code)]
pub fn text_field(name: &str) -> Field {
    field(name, FieldKind::Text(TextRules::default()))
}

#[allow(dead_code)]
pub fn mandatory(mut f: Field) -> Field {
    f.mandatory = true;
    f
}

#[allow(dead_code)]
pub fn with_conditions(mut f: Field, conditions: Vec<VisibilityCondition>) -> Field {
    f.visibility_conditions = conditions;
    f
}

/// Creates a step with one "General" category holding the fields.
#[allow(dead_code)]
pub fn step(name: &str, sequence: u32, fields: Vec<Field>) -> Step {
    Step {
        page_id: sequence as i64,
        sequence,
        name: name.to_string(),
        name_ara: None,
        description: String::new(),
        is_hidden: false,
        categories: vec![Category {
            id: 1,
            name: "General".to_string(),
            name_ara: None,
            repeatable: false,
            fields,
        }],
    }
}

#[allow(dead_code)]
pub fn single_step_schema(fields: Vec<Field>) -> FlowSchema {
    FlowSchema::from_steps(vec![step("Details", 1, fields)]).expect("valid schema")
}

#[allow(dead_code)]
pub fn rule(field: &str, operation: Operation, value: Value) -> ConditionRule {
    ConditionRule {
        field: field.to_string(),
        operation,
        value,
    }
}

#[allow(dead_code)]
pub fn condition(rules: Vec<ConditionRule>) -> VisibilityCondition {
    VisibilityCondition {
        condition_logic: rules,
    }
}

#[allow(dead_code)]
pub fn values(entries: &[(&str, Value)]) -> ValueMap {
    entries
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}

#[allow(dead_code)]
pub fn png_blob(name: &str, size: usize) -> FileBlob {
    FileBlob::new(name, "image/png", vec![0u8; size])
}

#[allow(dead_code)]
pub fn pdf_blob(name: &str, size: usize) -> FileBlob {
    FileBlob::new(name, "application/pdf", vec![0u8; size])
}

/// A three-step flow: applicant details, an optional age gate, documents.
#[allow(dead_code)]
pub fn three_step_schema() -> FlowSchema {
    FlowSchema::from_steps(vec![
        step(
            "Applicant",
            1,
            vec![mandatory(text_field("full_name")), text_field("nickname")],
        ),
        step(
            "Eligibility",
            2,
            vec![
                field("has_age", FieldKind::Boolean { default: false }),
                with_conditions(
                    mandatory(field(
                        "age",
                        FieldKind::Numeric(NumericRules {
                            style: NumericStyle::Number,
                            greater_than: None,
                            less_than: None,
                            integer_only: true,
                            positive_only: true,
                            precision: None,
                        }),
                    )),
                    vec![condition(vec![rule(
                        "has_age",
                        Operation::Equal,
                        Value::Bool(true),
                    )])],
                ),
            ],
        ),
        step(
            "Documents",
            3,
            vec![field("attachment", FieldKind::File(FileRules::default()))],
        ),
    ])
    .expect("valid schema")
}
