//! Integration tests for the readiness gate: held calls, single-flight,
//! failure propagation, load timeout, and shutdown cancellation.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use primegate::backend::table::TableBackend;
use primegate::{
    BackendHandle, BackendLoader, GateError, LoadError, LoadFuture, PrimeBackend, PrimeService,
};

// ── Doubles ───────────────────────────────────────────────────────────────────

/// Counts every backend invocation; the count must stay at zero until the
/// load trigger fires.
struct ProbeBackend {
    inner: TableBackend,
    calls: Arc<AtomicUsize>,
}

impl ProbeBackend {
    fn with_primes(primes: Vec<u32>, calls: Arc<AtomicUsize>) -> BackendHandle {
        Arc::new(Self { inner: TableBackend::new(primes), calls })
    }

    fn touch(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

impl PrimeBackend for ProbeBackend {
    fn is_prime(&self, num: u32) -> bool {
        self.touch();
        self.inner.is_prime(num)
    }
    fn prime(&self, num: u32) -> Option<u32> {
        self.touch();
        self.inner.prime(num)
    }
    fn nth(&self, index: u32) -> Option<u32> {
        self.touch();
        self.inner.nth(index)
    }
    fn range_list(&self, begin: u32, end: u32) -> Vec<u32> {
        self.touch();
        self.inner.range_list(begin, end)
    }
    fn random(&self) -> Option<u32> {
        self.touch();
        self.inner.random()
    }
    fn random_in_range(&self, begin: u32, end: u32) -> Option<u32> {
        self.touch();
        self.inner.random_in_range(begin, end)
    }
    fn closest_prime(&self, num: u32, ascending: bool) -> Option<u32> {
        self.touch();
        self.inner.closest_prime(num, ascending)
    }
    fn is_even(&self, num: u32) -> bool {
        self.touch();
        self.inner.is_even(num)
    }
    fn is_odd(&self, num: u32) -> bool {
        self.touch();
        self.inner.is_odd(num)
    }
}

/// Loader whose outcome the test decides, whenever it wants.
struct ManualLoader {
    trigger: oneshot::Receiver<Result<BackendHandle, LoadError>>,
}

impl BackendLoader for ManualLoader {
    fn id(&self) -> &str {
        "manual"
    }

    fn load(self: Box<Self>) -> LoadFuture {
        Box::pin(async move {
            self.trigger
                .await
                .unwrap_or(Err(LoadError::Init("trigger dropped".into())))
        })
    }
}

fn manual() -> (
    oneshot::Sender<Result<BackendHandle, LoadError>>,
    Box<dyn BackendLoader>,
) {
    let (tx, rx) = oneshot::channel();
    (tx, Box::new(ManualLoader { trigger: rx }))
}

/// Counts load attempts; the gate must trigger exactly one.
struct CountingLoader {
    loads: Arc<AtomicUsize>,
}

impl BackendLoader for CountingLoader {
    fn id(&self) -> &str {
        "counting"
    }

    fn load(self: Box<Self>) -> LoadFuture {
        self.loads.fetch_add(1, Ordering::SeqCst);
        Box::pin(async { Ok(Arc::new(TableBackend::builtin()) as BackendHandle) })
    }
}

/// Never resolves — exercises the timeout path.
struct NeverLoader;

impl BackendLoader for NeverLoader {
    fn id(&self) -> &str {
        "never"
    }

    fn load(self: Box<Self>) -> LoadFuture {
        Box::pin(std::future::pending::<Result<BackendHandle, LoadError>>())
    }
}

fn gate(loader: Box<dyn BackendLoader>) -> PrimeService {
    PrimeService::spawn(loader, None, CancellationToken::new())
}

fn unavailable_reason(err: GateError) -> Arc<str> {
    match err {
        GateError::Unavailable(reason) => reason,
    }
}

// ── Gating ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn held_calls_complete_after_release() {
    let calls = Arc::new(AtomicUsize::new(0));
    let backend = ProbeBackend::with_primes(vec![2, 3, 5, 7, 11], calls.clone());
    let (release, loader) = manual();
    let service = gate(loader);

    let s = service.clone();
    let held = tokio::spawn(async move {
        tokio::join!(s.range_list(4, 11), s.nth(0), s.closest_prime(6, true))
    });

    // Give the held calls ample time to reach the gate.
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(0, calls.load(Ordering::SeqCst), "backend invoked before readiness");

    assert!(release.send(Ok(backend)).is_ok());

    let (range, nth, closest) = held.await.unwrap();
    assert_eq!(vec![5, 7], range.unwrap());
    assert_eq!(Some(2), nth.unwrap());
    assert_eq!(Some(7), closest.unwrap());
    assert_eq!(3, calls.load(Ordering::SeqCst));
}

#[tokio::test]
async fn calls_after_readiness_resolve_directly() {
    let calls = Arc::new(AtomicUsize::new(0));
    let backend = ProbeBackend::with_primes(vec![2, 3, 5, 7, 11], calls.clone());
    let (release, loader) = manual();
    let service = gate(loader);
    assert!(release.send(Ok(backend)).is_ok());

    assert_eq!(vec![5, 7], service.range_list(4, 11).await.unwrap());
    assert_eq!(Some(2), service.nth(0).await.unwrap());
    assert_eq!(Some(7), service.closest_prime(6, true).await.unwrap());
    assert_eq!(Some(5), service.closest_prime(6, false).await.unwrap());
    assert!(service.is_even(4).await.unwrap());
    assert!(!service.is_odd(4).await.unwrap());
    assert_eq!(Some(5), service.prime(5).await.unwrap());
    assert_eq!(None, service.prime(9).await.unwrap());
    assert_eq!(None, service.nth(5).await.unwrap());

    let picked = service.random_in_range(4, 11).await.unwrap();
    assert!(matches!(picked, Some(5) | Some(7)));
    assert!(service.random().await.unwrap().is_some());
    assert_eq!(None, service.random_in_range(8, 11).await.unwrap());
}

#[tokio::test]
async fn single_flight_across_clones() {
    let loads = Arc::new(AtomicUsize::new(0));
    let service = gate(Box::new(CountingLoader { loads: loads.clone() }));

    let clones: Vec<PrimeService> = (0..4).map(|_| service.clone()).collect();
    for s in &clones {
        assert!(s.is_prime(13).await.unwrap());
    }

    assert_eq!(1, loads.load(Ordering::SeqCst));
}

// ── Failure policy ────────────────────────────────────────────────────────────

#[tokio::test]
async fn load_failure_rejects_pending_and_future_calls() {
    let (release, loader) = manual();
    let service = gate(loader);

    let s = service.clone();
    let pending = tokio::spawn(async move { s.nth(3).await });
    tokio::task::yield_now().await;

    assert!(release.send(Err(LoadError::Init("module rejected".into()))).is_ok());

    let reason = unavailable_reason(pending.await.unwrap().unwrap_err());
    assert!(reason.contains("module rejected"));

    // Later calls observe the same terminal failure, with the same reason.
    let later = unavailable_reason(service.is_prime(2).await.unwrap_err());
    assert_eq!(reason, later);
}

#[tokio::test(start_paused = true)]
async fn load_timeout_publishes_failure() {
    let service = PrimeService::spawn(
        Box::new(NeverLoader),
        Some(Duration::from_secs(5)),
        CancellationToken::new(),
    );

    let reason = unavailable_reason(service.nth(0).await.unwrap_err());
    assert!(reason.contains("timed out"));
}

#[tokio::test]
async fn shutdown_cancels_inflight_load() {
    let shutdown = CancellationToken::new();
    let (_release, loader) = manual();
    let service = PrimeService::spawn(loader, None, shutdown.clone());

    let s = service.clone();
    let pending = tokio::spawn(async move { s.is_prime(7).await });
    tokio::task::yield_now().await;

    shutdown.cancel();

    let reason = unavailable_reason(pending.await.unwrap().unwrap_err());
    assert!(reason.contains("cancelled"));
}
