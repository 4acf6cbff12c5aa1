//! Mock BearyChat Incoming endpoint for exercising webhook clients in tests.

pub mod error;
pub mod incoming;

pub use error::MockError;
pub use incoming::{IncomingServer, Responder, RunningServer, NOT_FOUND_CODE, NOT_FOUND_MESSAGE};
