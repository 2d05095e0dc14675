//! Primegate — demo host entry point.
//!
//! Startup sequence:
//!   1. Load .env (if present)
//!   2. Load config
//!   3. Init logger (RUST_LOG > config)
//!   4. Build the configured backend loader
//!   5. Spawn the gated service; Ctrl-C cancels an in-flight load
//!   6. Issue a batch of queries — they suspend until the backend is ready

use tokio_util::sync::CancellationToken;
use tracing::info;

use primegate::backend::loader;
use primegate::error::AppError;
use primegate::{GateError, PrimeService, config, logger};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn gate_err(e: GateError) -> AppError {
    AppError::Backend(e.to_string())
}

async fn run() -> Result<(), AppError> {
    // Load .env if present — ignore errors (file is optional).
    let _ = dotenvy::dotenv();

    let config = config::load()?;
    logger::init(&config.log_level)?;

    info!(
        backend = %config.backend.provider,
        load_timeout = ?config.load_timeout,
        "config loaded"
    );

    let loader =
        loader::build(&config.backend).map_err(|e| AppError::Backend(e.to_string()))?;

    // Shared shutdown token — Ctrl-C cancels it so a hung load fails fast
    // instead of holding every query forever.
    let shutdown = CancellationToken::new();
    let ctrlc_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("ctrl-c received — cancelling backend load");
            ctrlc_token.cancel();
        }
    });

    let service = PrimeService::spawn(loader, config.load_timeout, shutdown);

    // All three are issued while the backend may still be loading; they
    // suspend at the gate and complete once it is ready.
    let (hundreds, nth, decade) = tokio::join!(
        service.range_list(900, 1000),
        service.nth(24),
        service.range_list(100, 110),
    );
    let hundreds = hundreds.map_err(gate_err)?;
    let nth = nth.map_err(gate_err)?;
    let decade = decade.map_err(gate_err)?;
    info!(?hundreds, "primes in [900, 1000)");
    info!(index = 24, value = ?nth, "nth prime");
    info!(?decade, "primes in [100, 110)");

    let up = service.closest_prime(520, true).await.map_err(gate_err)?;
    let down = service.closest_prime(520, false).await.map_err(gate_err)?;
    info!(around = 520, up = ?up, down = ?down, "closest primes");

    let any = service.random().await.map_err(gate_err)?;
    let bounded = service.random_in_range(100, 200).await.map_err(gate_err)?;
    info!(any = ?any, in_range = ?bounded, "random primes");

    let prime_97 = service.is_prime(97).await.map_err(gate_err)?;
    let even_42 = service.is_even(42).await.map_err(gate_err)?;
    let odd_42 = service.is_odd(42).await.map_err(gate_err)?;
    info!(prime_97, even_42, odd_42, "predicates");

    Ok(())
}
