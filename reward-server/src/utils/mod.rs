//! Utility module - errors, logging, validation helpers
//!
//! - [`AppError`] - application error type surfaced to the HTTP layer
//! - [`AppResponse`] - success envelope helpers
//! - [`logger`] - tracing subscriber setup

pub mod error;
pub mod logger;
pub mod time;
pub mod validation;

pub use error::{AppError, AppResponse, AppResult};
pub use time::time_now_ms;
