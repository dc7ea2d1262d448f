use crate::error::ValidationError;
use crate::submit::FileBlob;
use crate::value::Value;
use regex::Regex;
use tracing::warn;

/// A regex-backed validator component. A pattern that fails to compile is a
/// configuration warning, not a crash: the component degrades to a no-op
/// and only that one validator stops checking anything.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    pub source: String,
    regex: Option<Regex>,
}

impl CompiledPattern {
    /// Compiles the backend's pattern exactly as declared.
    pub fn anchored_as_is(pattern: &str) -> Self {
        Self::build(pattern.to_string(), pattern)
    }

    /// Renders an allowed-character whitelist as the class `^[chars]*$`.
    pub fn character_class(chars: &str) -> Self {
        Self::build(chars.to_string(), &format!("^[{}]*$", chars))
    }

    fn build(source: String, pattern: &str) -> Self {
        let regex = match Regex::new(pattern) {
            Ok(regex) => Some(regex),
            Err(err) => {
                warn!(pattern, error = %err, "invalid pattern; validator degraded to pass");
                None
            }
        };
        Self { source, regex }
    }

    /// True when the input matches, or when the pattern is degraded.
    fn accepts(&self, input: &str) -> bool {
        match &self.regex {
            Some(regex) => regex.is_match(input),
            None => true,
        }
    }
}

/// The result of probing an image file for its pixel dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    Dimensions { width: u32, height: u32 },
    /// The blob could not be decoded; dimension limits are waived, matching
    /// the tolerance for files the backend will re-check anyway.
    Undecodable,
}

/// The verdict of one validator for one value.
#[derive(Debug, Clone)]
pub enum Verdict {
    Pass,
    Fail(ValidationError),
    /// The image-dimension check cannot settle synchronously; the caller
    /// must schedule a probe and re-validate once it resolves.
    NeedsProbe,
}

/// One compiled validation unit.
///
/// Every variant except `ImageDimensions` settles synchronously. Constraint
/// validators pass on absent values; only `Required` treats absence as a
/// failure, and the selection-count validators see empty lists as real
/// (zero-length) selections.
#[derive(Debug, Clone)]
pub enum Validator {
    Required,
    MinLength(usize),
    MaxLength(usize),
    Pattern(CompiledPattern),
    AllowedCharacters(CompiledPattern),
    ForbiddenWords(Vec<String>),
    /// Implicit on numeric fields: present values must read as numbers.
    NumericParse,
    /// Strict: the value must be greater than the bound.
    GreaterThan(f64),
    /// Strict: the value must be less than the bound.
    LessThan(f64),
    IntegerOnly,
    PositiveOnly,
    Precision(u32),
    MinSelections(usize),
    MaxSelections(usize),
    MaxFileSize(u64),
    FileExtension {
        allowed: Vec<String>,
        display: String,
    },
    ImageDimensions {
        max_width: Option<u32>,
        max_height: Option<u32>,
    },
}

impl Validator {
    pub fn check(
        &self,
        label: &str,
        value: &Value,
        file: Option<&FileBlob>,
        probed: Option<&ProbeOutcome>,
    ) -> Verdict {
        match self {
            Validator::Required => {
                if value.is_absent() {
                    fail(ValidationError::Required {
                        label: label.to_string(),
                    })
                } else {
                    Verdict::Pass
                }
            }

            Validator::MinSelections(min) => match value {
                Value::List(items) if items.len() < *min => {
                    fail(ValidationError::MinSelections {
                        label: label.to_string(),
                        min: *min,
                        actual: items.len(),
                    })
                }
                _ => Verdict::Pass,
            },

            Validator::MaxSelections(max) => match value {
                Value::List(items) if items.len() > *max => {
                    fail(ValidationError::MaxSelections {
                        label: label.to_string(),
                        max: *max,
                        actual: items.len(),
                    })
                }
                _ => Verdict::Pass,
            },

            Validator::MaxFileSize(max) => match file {
                Some(blob) if blob.size() > *max => fail(ValidationError::FileSize {
                    label: label.to_string(),
                    max: *max,
                    actual: blob.size(),
                }),
                _ => Verdict::Pass,
            },

            Validator::FileExtension { allowed, display } => match file {
                Some(blob) => {
                    let extension = blob.extension();
                    if allowed.contains(&extension) {
                        Verdict::Pass
                    } else {
                        fail(ValidationError::FileType {
                            label: label.to_string(),
                            allowed: display.clone(),
                            actual: extension,
                        })
                    }
                }
                None => Verdict::Pass,
            },

            Validator::ImageDimensions {
                max_width,
                max_height,
            } => match file {
                Some(blob) if blob.is_image() => match probed {
                    Some(ProbeOutcome::Dimensions { width, height }) => {
                        let too_wide = max_width.is_some_and(|max| *width > max);
                        let too_tall = max_height.is_some_and(|max| *height > max);
                        if too_wide || too_tall {
                            fail(ValidationError::ImageDimensions {
                                label: label.to_string(),
                                width: *width,
                                height: *height,
                            })
                        } else {
                            Verdict::Pass
                        }
                    }
                    Some(ProbeOutcome::Undecodable) => Verdict::Pass,
                    None => Verdict::NeedsProbe,
                },
                _ => Verdict::Pass,
            },

            // Everything below only constrains present values.
            _ if value.is_absent() => Verdict::Pass,

            Validator::MinLength(min) => {
                let actual = value.text_len();
                if actual < *min {
                    fail(ValidationError::MinLength {
                        label: label.to_string(),
                        min: *min,
                        actual,
                    })
                } else {
                    Verdict::Pass
                }
            }

            Validator::MaxLength(max) => {
                let actual = value.text_len();
                if actual > *max {
                    fail(ValidationError::MaxLength {
                        label: label.to_string(),
                        max: *max,
                        actual,
                    })
                } else {
                    Verdict::Pass
                }
            }

            Validator::Pattern(pattern) => {
                if pattern.accepts(&value.coerce_text()) {
                    Verdict::Pass
                } else {
                    fail(ValidationError::Pattern {
                        label: label.to_string(),
                    })
                }
            }

            Validator::AllowedCharacters(pattern) => {
                if pattern.accepts(&value.coerce_text()) {
                    Verdict::Pass
                } else {
                    fail(ValidationError::AllowedCharacters {
                        label: label.to_string(),
                    })
                }
            }

            Validator::ForbiddenWords(words) => {
                let haystack = value.coerce_text().to_lowercase();
                match words.iter().find(|word| haystack.contains(word.as_str())) {
                    Some(word) => fail(ValidationError::ForbiddenWords {
                        label: label.to_string(),
                        word: word.clone(),
                    }),
                    None => Verdict::Pass,
                }
            }

            Validator::NumericParse => match value.as_number() {
                Some(_) => Verdict::Pass,
                None => fail(ValidationError::NotANumber {
                    label: label.to_string(),
                }),
            },

            Validator::GreaterThan(min) => match value.as_number() {
                Some(n) if n <= *min => fail(ValidationError::GreaterThan {
                    label: label.to_string(),
                    min: *min,
                    actual: n,
                }),
                _ => Verdict::Pass,
            },

            Validator::LessThan(max) => match value.as_number() {
                Some(n) if n >= *max => fail(ValidationError::LessThan {
                    label: label.to_string(),
                    max: *max,
                    actual: n,
                }),
                _ => Verdict::Pass,
            },

            Validator::IntegerOnly => match value.as_number() {
                Some(n) if n.fract() != 0.0 => fail(ValidationError::IntegerOnly {
                    label: label.to_string(),
                }),
                _ => Verdict::Pass,
            },

            Validator::PositiveOnly => match value.as_number() {
                Some(n) if n <= 0.0 => fail(ValidationError::PositiveOnly {
                    label: label.to_string(),
                }),
                _ => Verdict::Pass,
            },

            Validator::Precision(max) => {
                let text = value.coerce_text();
                let actual = text
                    .split_once('.')
                    .map(|(_, decimals)| decimals.chars().count() as u32)
                    .unwrap_or(0);
                if actual > *max {
                    fail(ValidationError::Precision {
                        label: label.to_string(),
                        max: *max,
                        actual,
                    })
                } else {
                    Verdict::Pass
                }
            }
        }
    }
}

fn fail(error: ValidationError) -> Verdict {
    Verdict::Fail(error)
}
