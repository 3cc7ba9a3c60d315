// Application layer - use cases and orchestration on top of the journal.

mod error;
mod service;

pub use error::*;
pub use service::*;
