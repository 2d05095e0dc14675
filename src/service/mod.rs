//! The async-gated facade — decouples call time from backend availability.
//!
//! [`PrimeService::spawn`] starts exactly one loader task and hands back a
//! cheaply cloneable service handle. Every operation suspends at the
//! readiness gate until the load reaches a terminal state:
//!
//! - load succeeded → the call applies the backend function and completes
//!   with its result;
//! - load failed (including timeout and shutdown cancellation) → the call
//!   rejects with [`GateError::Unavailable`], as does every later call.
//!
//! Calls issued in any order before readiness all begin backend evaluation
//! only after readiness; completion order between them is unspecified. The
//! facade caches nothing — each call re-invokes the backend.
//!
//! Single-flight: clones share the loader task's readiness cell, so handing
//! the service to any number of consumers never triggers a second load.

mod readiness;

use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace};

use crate::backend::loader::{BackendLoader, LoadError, LoadFuture};
use crate::backend::{BackendHandle, PrimeBackend};
use readiness::{Readiness, ReadinessCell, ReadinessWatch};

// ── Error ─────────────────────────────────────────────────────────────────────

/// Why a gated call could not reach the backend.
///
/// Calls never fail for domain reasons — "no such prime" is `Ok(None)` on
/// the operations that can produce it.
#[derive(Debug, Clone, Error)]
pub enum GateError {
    /// The backend never became available. Carries the rendered load
    /// failure, shared by every rejected call.
    #[error("prime backend unavailable: {0}")]
    Unavailable(Arc<str>),
}

// ── Service ───────────────────────────────────────────────────────────────────

/// Handle to the gated prime service. Clone freely; all clones observe the
/// same backend slot.
#[derive(Clone)]
pub struct PrimeService {
    readiness: ReadinessWatch,
}

impl PrimeService {
    /// Start the (single) backend load and return the service handle.
    ///
    /// `load_timeout` bounds the load step; `None` leaves it unbounded.
    /// Cancelling `shutdown` while the load is in flight publishes a
    /// failure, so held calls still resolve deterministically.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(
        loader: Box<dyn BackendLoader>,
        load_timeout: Option<Duration>,
        shutdown: CancellationToken,
    ) -> Self {
        let (cell, watch) = readiness::cell();
        tokio::spawn(run_loader(loader, cell, load_timeout, shutdown));
        Self { readiness: watch }
    }

    /// Wait for the readiness gate, then apply `apply` to the loaded
    /// backend. All operation wrappers funnel through here; nothing in this
    /// crate touches the backend any other way.
    async fn gated<T>(
        &self,
        op: &'static str,
        apply: impl FnOnce(&dyn PrimeBackend) -> T,
    ) -> Result<T, GateError> {
        let backend = self.readiness.backend().await.map_err(|reason| {
            debug!(op, %reason, "call rejected, backend unavailable");
            GateError::Unavailable(reason)
        })?;
        trace!(op, "dispatching to backend");
        Ok(apply(backend.as_ref()))
    }

    // ── Operations ────────────────────────────────────────────────────────
    // One wrapper per backend operation; arguments pass through unmodified
    // and return conventions are the backend's (see `PrimeBackend`).

    pub async fn is_prime(&self, num: u32) -> Result<bool, GateError> {
        self.gated("is_prime", |b| b.is_prime(num)).await
    }

    /// `Some(num)` iff `num` is prime.
    pub async fn prime(&self, num: u32) -> Result<Option<u32>, GateError> {
        self.gated("prime", |b| b.prime(num)).await
    }

    /// Zero-based: `nth(0)` resolves to `2`.
    pub async fn nth(&self, index: u32) -> Result<Option<u32>, GateError> {
        self.gated("nth", |b| b.nth(index)).await
    }

    /// Primes in the half-open range `[begin, end)`.
    pub async fn range_list(&self, begin: u32, end: u32) -> Result<Vec<u32>, GateError> {
        self.gated("range_list", |b| b.range_list(begin, end)).await
    }

    pub async fn random(&self) -> Result<Option<u32>, GateError> {
        self.gated("random", |b| b.random()).await
    }

    pub async fn random_in_range(&self, begin: u32, end: u32) -> Result<Option<u32>, GateError> {
        self.gated("random_in_range", |b| b.random_in_range(begin, end)).await
    }

    pub async fn closest_prime(&self, num: u32, ascending: bool) -> Result<Option<u32>, GateError> {
        self.gated("closest_prime", |b| b.closest_prime(num, ascending)).await
    }

    pub async fn is_even(&self, num: u32) -> Result<bool, GateError> {
        self.gated("is_even", |b| b.is_even(num)).await
    }

    pub async fn is_odd(&self, num: u32) -> Result<bool, GateError> {
        self.gated("is_odd", |b| b.is_odd(num)).await
    }
}

// ── Loader task ───────────────────────────────────────────────────────────────

/// Run the load step and publish its terminal state exactly once.
///
/// Success and failure are both logged here, at the point of detection;
/// callers see the outcome only through the readiness cell.
async fn run_loader(
    loader: Box<dyn BackendLoader>,
    cell: ReadinessCell,
    load_timeout: Option<Duration>,
    shutdown: CancellationToken,
) {
    let id = loader.id().to_string();
    debug!(backend = %id, "backend load started");
    let started = Instant::now();

    let outcome = tokio::select! {
        () = shutdown.cancelled() => Err(LoadError::Cancelled),
        res = bounded(loader.load(), load_timeout) => res,
    };

    match outcome {
        Ok(backend) => {
            info!(
                backend = %id,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "backend ready"
            );
            cell.publish(Readiness::Ready(backend));
        }
        Err(e) => {
            error!(backend = %id, error = %e, "backend load failed");
            cell.publish(Readiness::Failed(e.to_string().into()));
        }
    }
}

async fn bounded(
    load: LoadFuture,
    limit: Option<Duration>,
) -> Result<BackendHandle, LoadError> {
    match limit {
        Some(limit) => match tokio::time::timeout(limit, load).await {
            Ok(res) => res,
            Err(_) => Err(LoadError::Timeout(limit)),
        },
        None => load.await,
    }
}
