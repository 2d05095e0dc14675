//! Primegate — async-gated facade over a lazily loaded prime computation
//! backend.
//!
//! The backend (the module that actually knows about primes) arrives late:
//! it is loaded asynchronously, exactly once per process, and may fail to
//! load. Everything here exists to make that invisible to callers:
//! [`PrimeService`] republishes every backend operation as an async method
//! whose calls suspend until the load reaches a terminal state, then either
//! run against the loaded backend or reject with the shared load failure.
//!
//! The binary entry point is `src/main.rs`.

pub mod backend;
pub mod config;
pub mod error;
pub mod logger;
pub mod service;

pub use backend::loader::{BackendLoader, LoadError, LoadFuture};
pub use backend::{BackendHandle, PrimeBackend};
pub use service::{GateError, PrimeService};
