//! Single-flight memoized computations
//!
//! A [`CalculatedValue`] runs its computation at most once. The first caller
//! to claim it computes; every concurrent caller waits for that outcome and
//! later callers read the stored outcome. A [`CalculatedValueCache`] keys
//! these values so independent requests for the same key share one
//! computation.
//!
//! # States
//!
//! | State | Meaning |
//! |-------|---------|
//! | Unstarted | Nobody has claimed the computation |
//! | InProgress | One caller is computing, others wait |
//! | Completed | Value stored, returned to every caller |
//! | Failed | Error stored, returned verbatim to every caller |

use crate::error::{ResolveError, ResolveResult};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use tokio::sync::watch;
use tracing::debug;

/// Completion state of a calculated value
#[derive(Debug, Clone)]
pub enum ComputationState<T> {
    Unstarted,
    InProgress,
    Completed(T),
    Failed(ResolveError),
}

impl<T: Clone> ComputationState<T> {
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Completed(_) | Self::Failed(_))
    }

    fn outcome(&self) -> Option<ResolveResult<T>> {
        match self {
            Self::Completed(value) => Some(Ok(value.clone())),
            Self::Failed(err) => Some(Err(err.clone())),
            Self::Unstarted | Self::InProgress => None,
        }
    }
}

/// A deferred computation shared by every caller asking for it
pub struct CalculatedValue<T> {
    description: String,
    state: watch::Sender<ComputationState<T>>,
}

impl<T: Clone + Send + Sync> CalculatedValue<T> {
    pub fn new(description: impl Into<String>) -> Self {
        let (state, _) = watch::channel(ComputationState::Unstarted);
        Self {
            description: description.into(),
            state,
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Snapshot of the current state
    pub fn state(&self) -> ComputationState<T> {
        self.state.borrow().clone()
    }

    /// Stored outcome, if the computation has finished
    pub fn try_get(&self) -> Option<ResolveResult<T>> {
        self.state.borrow().outcome()
    }

    /// Return the outcome, computing it if no one has claimed it yet
    pub async fn get_or_compute<F, Fut>(&self, compute: F) -> ResolveResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ResolveResult<T>>,
    {
        let claimed = self.state.send_if_modified(|state| {
            if matches!(state, ComputationState::Unstarted) {
                *state = ComputationState::InProgress;
                true
            } else {
                false
            }
        });

        if !claimed {
            return self.wait().await;
        }

        debug!("Computing {}", self.description);
        let guard = InProgressGuard { value: self };
        let outcome = compute().await;
        guard.finish(&outcome);
        outcome
    }

    /// Wait until whoever claimed the computation records an outcome
    async fn wait(&self) -> ResolveResult<T> {
        if let Some(outcome) = self.try_get() {
            return outcome;
        }

        debug!("Waiting for in-flight {}", self.description);
        let mut receiver = self.state.subscribe();
        let state = receiver
            .wait_for(ComputationState::is_finished)
            .await
            .map_err(|_| self.abandoned())?;
        state.outcome().unwrap_or_else(|| Err(self.abandoned()))
    }

    fn abandoned(&self) -> ResolveError {
        ResolveError::ComputationAbandoned {
            key: self.description.clone(),
        }
    }
}

impl<T> fmt::Debug for CalculatedValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &*self.state.borrow() {
            ComputationState::Unstarted => "unstarted",
            ComputationState::InProgress => "in progress",
            ComputationState::Completed(_) => "completed",
            ComputationState::Failed(_) => "failed",
        };
        f.debug_struct("CalculatedValue")
            .field("description", &self.description)
            .field("state", &state)
            .finish()
    }
}

/// Records an outcome for the claiming caller, or a failure if its
/// future is dropped before finishing so waiters are never stranded.
struct InProgressGuard<'a, T: Clone + Send + Sync> {
    value: &'a CalculatedValue<T>,
}

impl<T: Clone + Send + Sync> InProgressGuard<'_, T> {
    fn finish(self, outcome: &ResolveResult<T>) {
        let state = match outcome {
            Ok(value) => ComputationState::Completed(value.clone()),
            Err(err) => ComputationState::Failed(err.clone()),
        };
        self.value.state.send_replace(state);
        std::mem::forget(self);
    }
}

impl<T: Clone + Send + Sync> Drop for InProgressGuard<'_, T> {
    fn drop(&mut self) {
        debug!("Abandoned {}", self.value.description);
        self.value
            .state
            .send_replace(ComputationState::Failed(self.value.abandoned()));
    }
}

/// Keyed single-flight cache for one resolution session
pub struct CalculatedValueCache<K, T> {
    name: &'static str,
    values: Mutex<HashMap<K, Arc<CalculatedValue<T>>>>,
    aborted: OnceLock<ResolveError>,
}

impl<K, T> CalculatedValueCache<K, T>
where
    K: Eq + Hash + Clone + fmt::Display,
    T: Clone + Send + Sync,
{
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            values: Mutex::new(HashMap::new()),
            aborted: OnceLock::new(),
        }
    }

    /// The shared value for `key`, created unstarted on first request
    pub fn value_for(&self, key: &K) -> Arc<CalculatedValue<T>> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values
            .entry(key.clone())
            .or_insert_with(|| {
                Arc::new(CalculatedValue::new(format!("{} {}", self.name, key)))
            })
            .clone()
    }

    /// Get the outcome for `key`, computing it at most once per session
    ///
    /// After [`abort`](Self::abort), keys nobody has claimed yet fail with
    /// the abort error instead of starting `compute`.
    pub async fn get<F, Fut>(&self, key: &K, compute: F) -> ResolveResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ResolveResult<T>>,
    {
        let value = self.value_for(key);
        value
            .get_or_compute(|| async move {
                if let Some(err) = self.aborted.get() {
                    debug!("{}: session aborted, not computing {}", self.name, key);
                    return Err(err.clone());
                }
                compute().await
            })
            .await
    }

    /// Stored outcome for `key` without computing anything
    pub fn peek(&self, key: &K) -> Option<ResolveResult<T>> {
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.get(key).and_then(|value| value.try_get())
    }

    /// Stop starting new computations; the first abort error is kept
    ///
    /// Returns false if the cache had already been aborted.
    pub fn abort(&self, error: ResolveError) -> bool {
        let first = self.aborted.set(error).is_ok();
        if first {
            debug!("{}: aborted", self.name);
        }
        first
    }

    pub fn aborted(&self) -> Option<&ResolveError> {
        self.aborted.get()
    }

    /// Fail with the abort error if the cache has been aborted
    ///
    /// For computations that wait on a resource after claiming their key:
    /// call it again right before starting the expensive work.
    pub fn check_aborted(&self) -> ResolveResult<()> {
        match self.aborted.get() {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    pub fn len(&self) -> usize {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K, T> fmt::Debug for CalculatedValueCache<K, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CalculatedValueCache")
            .field("name", &self.name)
            .field("aborted", &self.aborted.get().is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Notify;

    #[tokio::test]
    async fn computes_once_and_memoizes() {
        let value = CalculatedValue::new("answer");
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let result = value
                .get_or_compute(|| async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(42)
                })
                .await
                .unwrap();
            assert_eq!(result, 42);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(value.state(), ComputationState::Completed(42)));
    }

    #[tokio::test]
    async fn failure_is_memoized_not_retried() {
        let value: CalculatedValue<u32> = CalculatedValue::new("broken");
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            let err = value
                .get_or_compute(|| async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(ResolveError::resolution("broken", "boom"))
                })
                .await
                .unwrap_err();
            assert!(err.to_string().contains("boom"));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_callers_share_one_computation() {
        let cache: Arc<CalculatedValueCache<String, String>> =
            Arc::new(CalculatedValueCache::new("test"));
        let calls = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let calls = Arc::clone(&calls);
                tokio::spawn(async move {
                    cache
                        .get(&"key".to_string(), || async {
                            calls.fetch_add(1, Ordering::SeqCst);
                            tokio::time::sleep(Duration::from_millis(50)).await;
                            Ok("value".to_string())
                        })
                        .await
                })
            })
            .collect();

        for task in tasks {
            assert_eq!(task.await.unwrap().unwrap(), "value");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_waiters_see_same_failure() {
        let cache: Arc<CalculatedValueCache<String, u32>> =
            Arc::new(CalculatedValueCache::new("test"));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                tokio::spawn(async move {
                    cache
                        .get(&"key".to_string(), || async {
                            tokio::time::sleep(Duration::from_millis(20)).await;
                            Err(ResolveError::resolution("key", "network down"))
                        })
                        .await
                })
            })
            .collect();

        for task in tasks {
            let err = task.await.unwrap().unwrap_err();
            assert_eq!(
                err.to_string(),
                "Could not resolve artifact key: network down"
            );
        }
    }

    #[tokio::test]
    async fn abort_fails_new_keys_with_abort_cause() {
        let cache: CalculatedValueCache<String, u32> = CalculatedValueCache::new("test");
        cache
            .get(&"done".to_string(), || async { Ok(1) })
            .await
            .unwrap();

        assert!(cache.abort(ResolveError::User("root cause".to_string())));
        assert!(!cache.abort(ResolveError::User("later".to_string())));

        let err = cache
            .get(&"fresh".to_string(), || async { Ok(2) })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "root cause");

        // Completed keys keep their stored value
        assert_eq!(
            cache.get(&"done".to_string(), || async { Ok(3) }).await.unwrap(),
            1
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn abort_lets_in_flight_computation_finish() {
        let cache: Arc<CalculatedValueCache<String, u32>> =
            Arc::new(CalculatedValueCache::new("test"));
        let calls = Arc::new(AtomicUsize::new(0));
        let release = Arc::new(Notify::new());

        let owner = {
            let cache = Arc::clone(&cache);
            let calls = Arc::clone(&calls);
            let release = Arc::clone(&release);
            tokio::spawn(async move {
                cache
                    .get(&"key".to_string(), || async {
                        calls.fetch_add(1, Ordering::SeqCst);
                        release.notified().await;
                        Ok(7)
                    })
                    .await
            })
        };
        let value = cache.value_for(&"key".to_string());
        while !matches!(value.state(), ComputationState::InProgress) {
            tokio::task::yield_now().await;
        }

        let waiter = {
            let cache = Arc::clone(&cache);
            let calls = Arc::clone(&calls);
            tokio::spawn(async move {
                cache
                    .get(&"key".to_string(), || async {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Ok(0)
                    })
                    .await
            })
        };

        cache.abort(ResolveError::User("fatal elsewhere".to_string()));
        release.notify_one();

        assert_eq!(owner.await.unwrap().unwrap(), 7);
        assert_eq!(waiter.await.unwrap().unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(cache.check_aborted().is_err());
    }

    #[test]
    fn check_aborted_reports_first_cause() {
        let cache: CalculatedValueCache<String, u32> = CalculatedValueCache::new("test");
        assert!(cache.check_aborted().is_ok());

        cache.abort(ResolveError::User("root cause".to_string()));
        let err = cache.check_aborted().unwrap_err();
        assert_eq!(err.to_string(), "root cause");
    }

    #[tokio::test]
    async fn dropped_computation_fails_waiters() {
        let value: Arc<CalculatedValue<u32>> = Arc::new(CalculatedValue::new("slow"));

        let owner = {
            let value = Arc::clone(&value);
            tokio::spawn(async move {
                value
                    .get_or_compute(|| async {
                        tokio::time::sleep(Duration::from_secs(60)).await;
                        Ok(1)
                    })
                    .await
            })
        };
        while !matches!(value.state(), ComputationState::InProgress) {
            tokio::task::yield_now().await;
        }
        owner.abort();
        let _ = owner.await;

        let err = value.get_or_compute(|| async { Ok(2) }).await.unwrap_err();
        assert!(matches!(err, ResolveError::ComputationAbandoned { .. }));
    }

    #[test]
    fn peek_does_not_compute() {
        let cache: CalculatedValueCache<String, u32> = CalculatedValueCache::new("test");
        assert!(cache.peek(&"missing".to_string()).is_none());
        assert!(cache.is_empty());
    }
}
