//! Constraint-to-validator compilation.
//!
//! Each field kind maps to one compiler routine that turns the declared
//! constraints into a fixed [`Validator`] list plus the kind's default
//! value. Compilation happens once per schema load; the compiled output is
//! evaluated on every edit.

use crate::condition::VisibilityCondition;
use crate::error::ValidationError;
use crate::schema::{Field, FieldKind};
use crate::submit::FileBlob;
use crate::value::Value;

mod validators;

pub use validators::{CompiledPattern, ProbeOutcome, Validator, Verdict};

/// The compiled form of one field: everything the wizard needs at runtime
/// without going back to the schema.
#[derive(Debug, Clone)]
pub struct CompiledField {
    pub name: String,
    pub label: String,
    pub mandatory: bool,
    pub is_hidden: bool,
    pub is_disabled: bool,
    pub conditions: Vec<VisibilityCondition>,
    pub validators: Vec<Validator>,
    pub default: Value,
}

/// The outcome of running one field's validators against a value.
#[derive(Debug, Clone, Default)]
pub struct FieldCheck {
    pub errors: Vec<ValidationError>,
    /// True when the image-dimension validator is waiting for a probe;
    /// the field is then neither valid nor invalid.
    pub needs_probe: bool,
}

impl FieldCheck {
    pub fn is_settled_and_valid(&self) -> bool {
        self.errors.is_empty() && !self.needs_probe
    }
}

impl CompiledField {
    /// Runs every validator. Failures accumulate; they never short-circuit
    /// so the form can render all inline messages at once.
    pub fn validate(
        &self,
        value: &Value,
        file: Option<&FileBlob>,
        probed: Option<&ProbeOutcome>,
    ) -> FieldCheck {
        let mut check = FieldCheck::default();
        for validator in &self.validators {
            match validator.check(&self.label, value, file, probed) {
                Verdict::Pass => {}
                Verdict::Fail(error) => check.errors.push(error),
                Verdict::NeedsProbe => check.needs_probe = true,
            }
        }
        check
    }
}

/// Compiles a schema field into its validator list and default value.
pub fn compile(field: &Field) -> CompiledField {
    let mut validators = Vec::new();

    if field.mandatory {
        validators.push(Validator::Required);
    }

    match &field.kind {
        FieldKind::Text(rules) => compile_text(rules, &mut validators),
        FieldKind::Numeric(rules) => compile_numeric(rules, &mut validators),
        FieldKind::Choice(rules) => compile_choice(rules, &mut validators),
        FieldKind::File(rules) => compile_file(rules, &mut validators),
        // Booleans and nested containers carry no constraints of their own.
        FieldKind::Boolean { .. } | FieldKind::Nested(_) => {}
    }

    CompiledField {
        name: field.name.clone(),
        label: field.label().to_string(),
        mandatory: field.mandatory,
        is_hidden: field.is_hidden,
        is_disabled: field.is_disabled,
        conditions: field.visibility_conditions.clone(),
        validators,
        default: default_value(&field.kind),
    }
}

/// Default-value policy: booleans take their declared default, numerics and
/// single-choices start unset, multi-choices start empty, everything else
/// starts as an empty string.
pub fn default_value(kind: &FieldKind) -> Value {
    match kind {
        FieldKind::Boolean { default } => Value::Bool(*default),
        FieldKind::Numeric(_) => Value::Null,
        FieldKind::Choice(rules) if rules.is_single() => Value::Null,
        FieldKind::Choice(_) => Value::List(Vec::new()),
        _ => Value::Text(String::new()),
    }
}

fn compile_text(rules: &crate::schema::TextRules, validators: &mut Vec<Validator>) {
    if let Some(min) = rules.min_length {
        validators.push(Validator::MinLength(min));
    }
    if let Some(max) = rules.max_length {
        validators.push(Validator::MaxLength(max));
    }
    if let Some(pattern) = &rules.regex_pattern {
        validators.push(Validator::Pattern(CompiledPattern::anchored_as_is(pattern)));
    }
    if let Some(chars) = &rules.allowed_characters {
        validators.push(Validator::AllowedCharacters(
            CompiledPattern::character_class(chars),
        ));
    }
    if let Some(words) = &rules.forbidden_words {
        let words: Vec<String> = words
            .split(',')
            .map(|w| w.trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();
        if !words.is_empty() {
            validators.push(Validator::ForbiddenWords(words));
        }
    }
}

fn compile_numeric(rules: &crate::schema::NumericRules, validators: &mut Vec<Validator>) {
    // The parse check runs first so bound failures on garbage input do not
    // pile up behind a clear "must be a valid number".
    validators.push(Validator::NumericParse);
    if let Some(min) = rules.greater_than {
        validators.push(Validator::GreaterThan(min));
    }
    if let Some(max) = rules.less_than {
        validators.push(Validator::LessThan(max));
    }
    if rules.integer_only {
        validators.push(Validator::IntegerOnly);
    }
    if rules.positive_only {
        validators.push(Validator::PositiveOnly);
    }
    if let Some(precision) = rules.precision {
        validators.push(Validator::Precision(precision));
    }
}

fn compile_choice(rules: &crate::schema::ChoiceRules, validators: &mut Vec<Validator>) {
    if let Some(min) = rules.min_selections {
        validators.push(Validator::MinSelections(min));
    }
    if let Some(max) = rules.max_selections {
        validators.push(Validator::MaxSelections(max));
    }
}

fn compile_file(rules: &crate::schema::FileRules, validators: &mut Vec<Validator>) {
    if let Some(max) = rules.max_size {
        validators.push(Validator::MaxFileSize(max));
    }
    if let Some(types) = &rules.accepted_types {
        let extensions: Vec<String> = types
            .split(',')
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        if !extensions.is_empty() {
            validators.push(Validator::FileExtension {
                allowed: extensions,
                display: types.clone(),
            });
        }
    }
    if rules.max_width.is_some() || rules.max_height.is_some() {
        validators.push(Validator::ImageDimensions {
            max_width: rules.max_width,
            max_height: rules.max_height,
        });
    }
}
