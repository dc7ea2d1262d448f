pub mod definition;
pub mod parse;
pub mod raw;

pub use definition::*;
pub use raw::FlowResponse;
