//! # Caseflow - Service-Flow Form Compilation and Evaluation Engine
//!
//! **Caseflow** is the engine behind a dynamic multi-step application form:
//! the backend describes a "service flow" (steps containing categories
//! containing typed, constrained, conditionally visible fields), and this
//! crate compiles that description ahead of time into per-field validator
//! lists, then evaluates visibility and validity on every edit.
//!
//! ## Core Workflow
//!
//! 1.  **Load**: decode the backend's schema response and normalize it into
//!     a [`FlowSchema`](schema::FlowSchema) (sequence ordering, hidden-page
//!     handling, typed field kinds).
//! 2.  **Compile**: building a [`Wizard`](wizard::Wizard) compiles every
//!     field's declared constraints into validators and materializes the
//!     default value map of every step.
//! 3.  **Evaluate**: each write through
//!     [`StepForm::set_value`](wizard::StepForm::set_value) recomputes
//!     field visibility and step validity from the latest values; failures
//!     are returned as data, never thrown.
//! 4.  **Assemble**: once the last step validates,
//!     [`assemble`](submit::assemble) flattens the per-step values and file
//!     selections into a deterministic, retry-safe case payload.
//!
//! Network transport, image decoding, routing, and rendering stay outside:
//! hosts implement [`PortalApi`](client::PortalApi) and
//! [`ImageProbe`](client::ImageProbe) and drive the engine through a
//! [`FlowSession`](client::FlowSession).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use caseflow::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // 1. Load and normalize the backend schema.
//!     let schema_json = std::fs::read_to_string("path/to/service_flow.json")?;
//!     let schema = FlowSchema::from_json(&schema_json)?;
//!
//!     // 2. Building the wizard compiles all constraints up front.
//!     let mut wizard = Wizard::new(&schema);
//!
//!     // 3. Edits recompute visibility and validity immediately.
//!     let derived = wizard.current_step_mut().set_value("applicant_name", "Jane Doe");
//!     if let Some(errors) = derived.errors.get("applicant_name") {
//!         for error in errors {
//!             println!("-> {}", error);
//!         }
//!     }
//!
//!     // 4. Step forward; the last step turns into a submission request.
//!     match wizard.advance() {
//!         Advance::Moved(step) => println!("now on step {}", step),
//!         Advance::SubmissionRequired => {
//!             let catalog = FileTypeCatalog::new("01");
//!             let payload = assemble(
//!                 &schema,
//!                 13,
//!                 42,
//!                 &wizard.step_values(),
//!                 &wizard.file_selections(),
//!                 &catalog,
//!             );
//!             println!("submitting {} fields", payload.case_data.len());
//!         }
//!         Advance::Blocked { errors, .. } => {
//!             println!("step not valid yet: {} problems", errors.len());
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod compile;
pub mod condition;
pub mod error;
pub mod lookup;
pub mod prelude;
pub mod schema;
pub mod submit;
pub mod value;
pub mod wizard;
