//! Prelude module for convenient imports
//!
//! Re-exports the most commonly used types of the caseflow crate so hosts
//! can pull in the whole working set with one `use`.
//!
//! # Example
//!
//! ```rust,no_run
//! use caseflow::prelude::*;
//!
//! # fn run_example() -> Result<(), Box<dyn std::error::Error>> {
//! let schema_json = std::fs::read_to_string("path/to/service_flow.json")?;
//! let schema = FlowSchema::from_json(&schema_json)?;
//! let wizard = Wizard::new(&schema);
//! println!("{} steps to walk", wizard.total_steps());
//! # Ok(())
//! # }
//! ```

// Schema model
pub use crate::schema::{
    Category, ChoiceRules, Field, FieldKind, FileRules, FlowResponse, FlowSchema, NumericRules,
    NumericStyle, Step, TextRules,
};

// Condition evaluation
pub use crate::condition::{is_visible, ConditionRule, Operation, VisibilityCondition};

// Constraint compilation
pub use crate::compile::{compile, default_value, CompiledField, ProbeOutcome, Validator, Verdict};

// Runtime values
pub use crate::value::{Value, ValueMap};

// Wizard state
pub use crate::wizard::{Advance, DerivedState, PendingCheck, StepForm, Wizard, WizardState};

// Submission assembly
pub use crate::submit::{
    assemble, option_value, CaseReceipt, CaseSubmission, CaseValue, FileBlob, FileSelection,
    FileTypeCatalog,
};

// Lookups
pub use crate::lookup::{LookupCache, LookupId, LookupOption};

// Session driver and collaborator traits
pub use crate::client::{
    FlowSession, ImageProbe, PortalApi, SessionAdvance, SessionConfig,
};

// Error types
pub use crate::error::{ApiError, FlowError, ProbeError, SchemaError, ValidationError};
