//! Application-wide error types for the host path.
//!
//! Domain errors live next to their modules: [`crate::backend::loader::LoadError`]
//! for the load step, [`crate::service::GateError`] for gated calls.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),

    #[error("logger error: {0}")]
    Logger(String),

    #[error("backend error: {0}")]
    Backend(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
