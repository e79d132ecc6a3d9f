//! Batch checker implementation.
//!
//! This module provides `BatchChecker`, which validates domains, dispatches
//! lookups over a bounded worker pool, sorts every domain into exactly one of
//! the Available / Registered / Error buckets and reports progress as it goes.

use crate::batch::BatchRun;
use crate::error::LookupError;
use crate::protocols::{DomainLookup, WhoisApiClient};
use crate::types::{BatchConfig, BatchProgress, BatchReport, Lookup, LookupResult};
use crate::utils::{dedup_domains, validate_domain};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Coordinates batch registration checks.
///
/// The checker owns its configuration and a lookup backend. Each call to
/// [`check_batch`](Self::check_batch) builds a fresh batch context, so nothing
/// carries over between batches.
///
/// # Example
///
/// ```rust,no_run
/// use whois_batch_lib::{BatchChecker, BatchConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let checker = BatchChecker::with_config(BatchConfig::default().with_pool_size(5))?;
///     let domains = vec!["example.com".to_string(), "888888.com".to_string()];
///     let report = checker.check_batch(&domains).await;
///     println!("available: {:?}", report.available);
///     Ok(())
/// }
/// ```
pub struct BatchChecker<L = WhoisApiClient> {
    /// Pool size, delay and timeout for this checker
    config: BatchConfig,
    /// Lookup backend shared by all workers
    lookup: Arc<L>,
}

impl BatchChecker<WhoisApiClient> {
    /// Create a checker for the default WHOIS API with default settings.
    ///
    /// Default settings:
    /// - Pool size: 5
    /// - Per-request delay: 1 second
    /// - Request timeout: 10 seconds
    pub fn new() -> Result<Self, LookupError> {
        Self::with_config(BatchConfig::default())
    }

    /// Create a checker for the WHOIS API with custom configuration.
    pub fn with_config(config: BatchConfig) -> Result<Self, LookupError> {
        let client = WhoisApiClient::with_config(&config)?;
        Ok(Self::with_lookup(config, client))
    }
}

impl<L: DomainLookup> BatchChecker<L> {
    /// Create a checker around any lookup backend.
    pub fn with_lookup(config: BatchConfig, lookup: L) -> Self {
        let config = BatchConfig {
            pool_size: config.pool_size.clamp(1, 100),
            ..config
        };
        Self {
            config,
            lookup: Arc::new(lookup),
        }
    }

    /// Get the configuration for this checker.
    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Check a single domain without the throttle delay.
    ///
    /// Never fails: invalid syntax and lookup failures come back as an Error
    /// result carrying the error kind and message.
    pub async fn check_domain(&self, domain: &str) -> LookupResult {
        if let Err(e) = validate_domain(domain) {
            debug!(domain, error = %e, "rejected before lookup");
            return LookupResult::error(domain, &e);
        }
        query(self.lookup.as_ref(), domain).await
    }

    /// Check a batch of domains.
    ///
    /// Equivalent to [`check_batch_with_progress`](Self::check_batch_with_progress)
    /// with a no-op progress callback.
    pub async fn check_batch(&self, domains: &[String]) -> BatchReport {
        self.check_batch_with_progress(domains, |_| {}).await
    }

    /// Check a batch of domains, reporting progress after each one.
    ///
    /// Duplicate inputs are collapsed first. Up to `pool_size` workers run at
    /// once; each validates its domain, queries the backend, sleeps the
    /// per-request delay if a request was sent, then records the outcome and
    /// calls `on_progress`. The callback sees `completed` go up by one per
    /// call and reach `total` exactly once, on the last call.
    ///
    /// Returns once every domain has a terminal classification.
    pub async fn check_batch_with_progress<F>(&self, domains: &[String], on_progress: F) -> BatchReport
    where
        F: Fn(BatchProgress) + Send + Sync + 'static,
    {
        let domains = dedup_domains(domains);
        let total = domains.len();
        let delay = self.config.per_request_delay;

        info!(
            total,
            pool_size = self.config.pool_size,
            delay_ms = delay.as_millis() as u64,
            "starting batch"
        );

        let run = Arc::new(BatchRun::new(total));
        let on_progress = Arc::new(on_progress);

        let workers = domains.into_iter().map(|domain| {
            let lookup = Arc::clone(&self.lookup);
            let run = Arc::clone(&run);
            let on_progress = Arc::clone(&on_progress);

            async move {
                let task = tokio::spawn({
                    let run = Arc::clone(&run);
                    let on_progress = Arc::clone(&on_progress);
                    let domain = domain.clone();
                    async move {
                        let result = run_worker(lookup.as_ref(), &domain, delay).await;
                        run.record(result, on_progress.as_ref());
                    }
                });

                if let Err(join_error) = task.await {
                    let err = LookupError::internal(format!("worker failed: {}", join_error));
                    warn!(domain = %domain, error = %err, "worker task did not finish");
                    run.record(LookupResult::error(&domain, &err), on_progress.as_ref());
                }
            }
        });

        let mut pool = stream::iter(workers).buffer_unordered(self.config.pool_size);
        while pool.next().await.is_some() {}
        drop(pool);

        let report = match Arc::try_unwrap(run) {
            Ok(run) => run.finish(),
            Err(shared) => shared.snapshot(),
        };

        info!(
            total = report.total,
            available = report.available.len(),
            registered = report.registered.len(),
            errors = report.errors.len(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "batch finished"
        );

        report
    }
}

/// One worker step: validate, query, throttle.
///
/// Rejected domains skip both the request and the delay.
async fn run_worker<L: DomainLookup>(lookup: &L, domain: &str, delay: Duration) -> LookupResult {
    if let Err(e) = validate_domain(domain) {
        debug!(domain, error = %e, "rejected before lookup");
        return LookupResult::error(domain, &e);
    }

    let result = query(lookup, domain).await;

    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    result
}

async fn query<L: DomainLookup>(lookup: &L, domain: &str) -> LookupResult {
    let start = Instant::now();

    let result = match lookup.lookup(domain).await {
        Ok(Lookup::Available) => {
            debug!(domain, "available");
            LookupResult::available(domain)
        }
        Ok(Lookup::Registered { dns_serve }) => {
            debug!(domain, dns_serve = %dns_serve, "registered");
            LookupResult::registered(domain, dns_serve)
        }
        Err(e) => {
            warn!(domain, kind = %e.kind(), error = %e, "lookup failed");
            LookupResult::error(domain, &e)
        }
    };

    result.with_duration(start.elapsed())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::types::LookupOutcome;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Deterministic backend: names starting with "taken" are registered,
    /// "fail" fails, anything else is available.
    #[derive(Default)]
    struct FakeLookup {
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        pause: Duration,
    }

    impl DomainLookup for FakeLookup {
        async fn lookup(&self, domain: &str) -> Result<Lookup, LookupError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);

            if !self.pause.is_zero() {
                tokio::time::sleep(self.pause).await;
            } else {
                tokio::task::yield_now().await;
            }

            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if domain.starts_with("taken") {
                Ok(Lookup::Registered {
                    dns_serve: "ns1.example.com".to_string(),
                })
            } else if domain.starts_with("fail") {
                Err(LookupError::http_status(domain, 500))
            } else {
                Ok(Lookup::Available)
            }
        }
    }

    fn fast_config(pool_size: usize) -> BatchConfig {
        BatchConfig::default()
            .with_pool_size(pool_size)
            .with_delay(Duration::ZERO)
    }

    fn domains(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_batch_of_ten_classifies_each_domain_once() {
        let checker = BatchChecker::with_lookup(fast_config(5), FakeLookup::default());
        let input: Vec<String> = (0..10)
            .map(|i| match i % 3 {
                0 => format!("taken{}.com", i),
                1 => format!("fail{}.com", i),
                _ => format!("free{}.com", i),
            })
            .collect();

        let report = checker.check_batch(&input).await;

        assert_eq!(report.total, 10);
        assert_eq!(report.classified(), 10);
        assert_eq!(report.results.len(), 10);

        let all: Vec<&String> = report
            .available
            .iter()
            .chain(&report.registered)
            .chain(&report.errors)
            .collect();
        let unique: HashSet<&String> = all.iter().copied().collect();
        assert_eq!(unique.len(), 10);
        for domain in &input {
            assert!(unique.contains(domain), "{} missing from buckets", domain);
        }

        assert_eq!(report.registered.len(), 4);
        assert_eq!(report.errors.len(), 3);
        assert_eq!(report.available.len(), 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_progress_is_monotonic_and_completes_once() {
        let checker = BatchChecker::with_lookup(fast_config(5), FakeLookup::default());
        let input: Vec<String> = (0..25).map(|i| format!("name{}.com", i)).collect();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        checker
            .check_batch_with_progress(&input, move |p| sink.lock().unwrap().push(p))
            .await;

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 25);
        for (i, p) in seen.iter().enumerate() {
            assert_eq!(p.completed, i + 1);
            assert_eq!(p.total, 25);
        }
        assert_eq!(seen.iter().filter(|p| p.is_complete()).count(), 1);
        assert!(seen.last().unwrap().is_complete());
    }

    #[tokio::test]
    async fn test_invalid_domains_never_reach_lookup() {
        let checker = BatchChecker::with_lookup(fast_config(3), FakeLookup::default());
        let input = domains(&["-abc.com", "abc..com", "abc.c", "good.com"]);

        let report = checker.check_batch(&input).await;

        assert_eq!(checker.lookup.calls.load(Ordering::SeqCst), 1);
        assert_eq!(report.available, vec!["good.com"]);
        assert_eq!(report.errors.len(), 3);
        for r in report.results.iter().filter(|r| r.outcome == LookupOutcome::Error) {
            assert_eq!(r.error_kind, Some(ErrorKind::InvalidFormat));
        }
    }

    #[tokio::test]
    async fn test_duplicates_are_checked_once() {
        let checker = BatchChecker::with_lookup(fast_config(2), FakeLookup::default());
        let input = domains(&["abc.com", "abc.com", "def.com"]);

        let report = checker.check_batch(&input).await;

        assert_eq!(report.total, 2);
        assert_eq!(report.available.len(), 2);
        assert!(report.available.contains(&"abc.com".to_string()));
        assert!(report.available.contains(&"def.com".to_string()));
        assert_eq!(checker.lookup.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_pool_size_bounds_concurrency() {
        let lookup = FakeLookup {
            pause: Duration::from_millis(20),
            ..Default::default()
        };
        let checker = BatchChecker::with_lookup(fast_config(3), lookup);
        let input: Vec<String> = (0..12).map(|i| format!("name{}.com", i)).collect();

        let report = checker.check_batch(&input).await;

        assert_eq!(report.classified(), 12);
        let max = checker.lookup.max_in_flight.load(Ordering::SeqCst);
        assert!(max <= 3, "saw {} concurrent lookups", max);
        assert!(max >= 2, "pool never ran lookups in parallel");
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_is_applied_per_request() {
        let config = BatchConfig::default()
            .with_pool_size(1)
            .with_delay(Duration::from_secs(1));
        let checker = BatchChecker::with_lookup(config, FakeLookup::default());
        let input = domains(&["a1.com", "b2.com", "-bad.com"]);

        let start = tokio::time::Instant::now();
        let report = checker.check_batch(&input).await;

        assert_eq!(report.classified(), 3);
        // two requests sent, the invalid domain is not throttled
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(2), "elapsed {:?}", elapsed);
        assert!(elapsed < Duration::from_secs(3), "elapsed {:?}", elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_is_applied_after_failed_requests() {
        let config = BatchConfig::default()
            .with_pool_size(1)
            .with_delay(Duration::from_secs(1));
        let checker = BatchChecker::with_lookup(config, FakeLookup::default());
        let input = domains(&["fail1.com", "fail2.com", "taken3.com"]);

        let start = tokio::time::Instant::now();
        let report = checker.check_batch(&input).await;

        assert_eq!(report.errors.len(), 2);
        assert_eq!(report.registered.len(), 1);
        assert_eq!(checker.lookup.calls.load(Ordering::SeqCst), 3);
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(3), "elapsed {:?}", elapsed);
        assert!(elapsed < Duration::from_secs(4), "elapsed {:?}", elapsed);
    }

    #[tokio::test]
    async fn test_check_domain_without_delay() {
        let checker = BatchChecker::with_lookup(fast_config(1), FakeLookup::default());

        let taken = checker.check_domain("taken.com").await;
        assert_eq!(taken.outcome, LookupOutcome::Registered);
        assert_eq!(taken.dns_serve.as_deref(), Some("ns1.example.com"));
        assert!(taken.check_duration.is_some());

        let failed = checker.check_domain("fail.com").await;
        assert_eq!(failed.outcome, LookupOutcome::Error);
        assert_eq!(failed.error_kind, Some(ErrorKind::Http));

        let invalid = checker.check_domain("abc.c").await;
        assert_eq!(invalid.error_kind, Some(ErrorKind::InvalidFormat));
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let checker = BatchChecker::with_lookup(fast_config(5), FakeLookup::default());
        let report = checker.check_batch(&[]).await;
        assert_eq!(report.total, 0);
        assert_eq!(report.classified(), 0);
    }
}
