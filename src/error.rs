use thiserror::Error;

/// Errors that can occur while loading and normalizing a service-flow schema.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    #[error("step (page {page_id}) has a non-numeric sequence number: '{raw}'")]
    InvalidSequenceNumber { page_id: i64, raw: String },

    #[error("service flow contains no steps")]
    EmptyFlow,

    #[error("failed to decode service flow response: {0}")]
    Decode(String),
}

/// A field-scoped validation failure.
///
/// Validation failures are data, not control flow: compiled validators
/// accumulate them per field so the caller can render inline messages and
/// derive step validity. The `Display` output is the renderable message.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{label} is required")]
    Required { label: String },

    #[error("{label} must be at least {min} characters")]
    MinLength {
        label: String,
        min: usize,
        actual: usize,
    },

    #[error("{label} cannot exceed {max} characters")]
    MaxLength {
        label: String,
        max: usize,
        actual: usize,
    },

    #[error("{label} format is invalid")]
    Pattern { label: String },

    #[error("{label} contains invalid characters")]
    AllowedCharacters { label: String },

    #[error("{label} contains forbidden words")]
    ForbiddenWords { label: String, word: String },

    #[error("{label} must be a valid number")]
    NotANumber { label: String },

    #[error("{label} must be greater than {min}")]
    GreaterThan {
        label: String,
        min: f64,
        actual: f64,
    },

    #[error("{label} must be less than {max}")]
    LessThan {
        label: String,
        max: f64,
        actual: f64,
    },

    #[error("{label} must be a whole number")]
    IntegerOnly { label: String },

    #[error("{label} must be a positive number")]
    PositiveOnly { label: String },

    #[error("{label} can have at most {max} decimal places")]
    Precision {
        label: String,
        max: u32,
        actual: u32,
    },

    #[error("select at least {min} options for {label}")]
    MinSelections {
        label: String,
        min: usize,
        actual: usize,
    },

    #[error("select at most {max} options for {label}")]
    MaxSelections {
        label: String,
        max: usize,
        actual: usize,
    },

    #[error("file size for {label} must be less than {max} bytes")]
    FileSize {
        label: String,
        max: u64,
        actual: u64,
    },

    #[error("invalid file type for {label}; allowed types: {allowed}")]
    FileType {
        label: String,
        allowed: String,
        actual: String,
    },

    #[error("image dimensions for {label} exceed the maximum allowed size")]
    ImageDimensions {
        label: String,
        width: u32,
        height: u32,
    },
}

impl ValidationError {
    /// A stable machine-readable code, matching the portal's error keys.
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::Required { .. } => "required",
            ValidationError::MinLength { .. } => "minlength",
            ValidationError::MaxLength { .. } => "maxlength",
            ValidationError::Pattern { .. } => "pattern",
            ValidationError::AllowedCharacters { .. } => "allowedCharacters",
            ValidationError::ForbiddenWords { .. } => "forbiddenWords",
            ValidationError::NotANumber { .. } => "number",
            ValidationError::GreaterThan { .. } => "min",
            ValidationError::LessThan { .. } => "max",
            ValidationError::IntegerOnly { .. } => "integer",
            ValidationError::PositiveOnly { .. } => "positive",
            ValidationError::Precision { .. } => "precision",
            ValidationError::MinSelections { .. } => "minSelections",
            ValidationError::MaxSelections { .. } => "maxSelections",
            ValidationError::FileSize { .. } => "fileSize",
            ValidationError::FileType { .. } => "fileType",
            ValidationError::ImageDimensions { .. } => "imageDimensions",
        }
    }

    /// The display label of the field this failure belongs to.
    pub fn label(&self) -> &str {
        match self {
            ValidationError::Required { label }
            | ValidationError::MinLength { label, .. }
            | ValidationError::MaxLength { label, .. }
            | ValidationError::Pattern { label }
            | ValidationError::AllowedCharacters { label }
            | ValidationError::ForbiddenWords { label, .. }
            | ValidationError::NotANumber { label }
            | ValidationError::GreaterThan { label, .. }
            | ValidationError::LessThan { label, .. }
            | ValidationError::IntegerOnly { label }
            | ValidationError::PositiveOnly { label }
            | ValidationError::Precision { label, .. }
            | ValidationError::MinSelections { label, .. }
            | ValidationError::MaxSelections { label, .. }
            | ValidationError::FileSize { label, .. }
            | ValidationError::FileType { label, .. }
            | ValidationError::ImageDimensions { label, .. } => label,
        }
    }
}

/// Errors surfaced by the transport collaborator.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(String),

    #[error("request failed with status {status}")]
    Status { status: u16 },

    #[error("not authenticated")]
    Unauthorized,

    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Whether a retry of the same request could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ApiError::Network(_) | ApiError::Status { status: 500..=599 }
        )
    }
}

/// Errors produced by the injected image probe.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProbeError {
    #[error("failed to decode image: {0}")]
    Decode(String),
}

/// Umbrella error for session-level operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FlowError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Api(#[from] ApiError),

    /// Submission failed; the wizard state is preserved so the user can
    /// retry without re-entering data.
    #[error("submission failed: {0}")]
    Submission(ApiError),

    #[error("the service flow is not loaded")]
    NotReady,
}
