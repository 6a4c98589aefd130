// Application layer - the guarded wallet service and its storage bridge.

pub mod error;
pub mod service;

pub use error::*;
pub use service::*;
