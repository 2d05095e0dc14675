//! Backend load abstraction.
//!
//! Loading a backend is the one I/O-like step in this crate: it may take
//! arbitrarily long and it may fail. A [`BackendLoader`] is consumed exactly
//! once and returns a boxed future so the service can race it against its
//! timeout and shutdown signal without knowing the transport behind it.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use thiserror::Error;

use super::{BackendHandle, table::TableBackend};
use crate::config::BackendConfig;

/// A boxed, owned future returned by [`BackendLoader::load`].
pub type LoadFuture =
    Pin<Box<dyn Future<Output = Result<BackendHandle, LoadError>> + Send + 'static>>;

/// Why a backend failed to become available.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("backend load timed out after {0:?}")]
    Timeout(Duration),

    #[error("backend load cancelled by shutdown")]
    Cancelled,

    #[error("backend init failed: {0}")]
    Init(String),

    #[error("unknown backend: {0}")]
    Unknown(String),
}

/// One-shot loader for a computation backend.
///
/// Implementors capture everything they need at construction time.
/// [`load`](Self::load) consumes the loader — a backend is loaded at most
/// once per loader instance.
pub trait BackendLoader: Send + 'static {
    /// Stable identifier used in log messages.
    fn id(&self) -> &str;

    /// Consume the loader and return the load step as a boxed future.
    fn load(self: Box<Self>) -> LoadFuture;
}

/// Loads the built-in [`TableBackend`], optionally after a simulated delay.
///
/// The delay stands in for the fetch/compile latency of a real module load
/// and makes the gate observable in demos.
pub struct TableLoader {
    delay: Duration,
}

impl TableLoader {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl BackendLoader for TableLoader {
    fn id(&self) -> &str {
        "table"
    }

    fn load(self: Box<Self>) -> LoadFuture {
        Box::pin(async move {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            Ok(std::sync::Arc::new(TableBackend::builtin()) as BackendHandle)
        })
    }
}

/// Build the loader named by the config. Adding a backend = new loader type
/// + new arm here.
pub fn build(config: &BackendConfig) -> Result<Box<dyn BackendLoader>, LoadError> {
    match config.provider.as_str() {
        "table" => Ok(Box::new(TableLoader::new(config.table.load_delay))),
        other => Err(LoadError::Unknown(other.to_string())),
    }
}
