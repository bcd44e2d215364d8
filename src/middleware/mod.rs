//! HTTP middleware: request-id propagation, request logging and the
//! standardized JSON error envelope.

pub mod error;
pub mod logging;
