//! Keyed stale-while-revalidate request cache.
//!
//! Concurrent requests for the same key share one in-flight future and one
//! cached result. Every issued request is tagged with a per-key sequence
//! number; a response only updates the cache if no newer request has been
//! issued for that key since.

use std::{
    collections::HashMap,
    fmt::Debug,
    future::Future,
    hash::Hash,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tracing::debug;

use crate::error::{DashboardError, Result};

type SharedFetch<V> = Shared<BoxFuture<'static, Result<Arc<V>>>>;

/// What a subscriber sees for one key.
#[derive(Debug, Clone)]
pub enum FetchState<V> {
    Loading,
    Error(DashboardError),
    Data(Arc<V>),
}

impl<V> FetchState<V> {
    pub fn data(&self) -> Option<&Arc<V>> {
        match self {
            FetchState::Data(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, FetchState::Loading)
    }
}

struct Entry<V> {
    data: Option<Arc<V>>,
    error: Option<DashboardError>,
    issued: u64,
    in_flight: Option<(u64, SharedFetch<V>)>,
}

impl<V> Default for Entry<V> {
    fn default() -> Self {
        Self { data: None, error: None, issued: 0, in_flight: None }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Join in flight, else serve cached data, else issue.
    Cached,
    /// Join in flight, else issue.
    Join,
    /// Always issue.
    Force,
}

enum Lookup<V> {
    Hit(Arc<V>),
    Pending(SharedFetch<V>),
}

pub struct FetchCache<K, V> {
    entries: Arc<Mutex<HashMap<K, Entry<V>>>>,
}

impl<K, V> Clone for FetchCache<K, V> {
    fn clone(&self) -> Self {
        Self { entries: Arc::clone(&self.entries) }
    }
}

impl<K, V> Default for FetchCache<K, V> {
    fn default() -> Self {
        Self { entries: Arc::new(Mutex::new(HashMap::new())) }
    }
}

impl<K, V> Debug for FetchCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchCache").field("keys", &self.entries.lock().len()).finish()
    }
}

impl<K, V> FetchCache<K, V>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Current view of `key` without triggering a request.
    ///
    /// An error from the latest settled request takes precedence over stale
    /// data.
    pub fn state(&self, key: &K) -> FetchState<V> {
        let entries = self.entries.lock();
        match entries.get(key) {
            Some(Entry { error: Some(err), .. }) => FetchState::Error(err.clone()),
            Some(Entry { data: Some(data), .. }) => FetchState::Data(Arc::clone(data)),
            _ => FetchState::Loading,
        }
    }

    pub fn is_validating(&self, key: &K) -> bool {
        self.entries.lock().get(key).is_some_and(|e| e.in_flight.is_some())
    }

    /// Resolve `key`: join an in-flight request if there is one, else serve
    /// cached data, else issue a request.
    pub async fn fetch<F, Fut>(&self, key: K, fetcher: F) -> Result<Arc<V>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        match self.lookup(key, fetcher, Mode::Cached) {
            Lookup::Hit(data) => Ok(data),
            Lookup::Pending(pending) => pending.await,
        }
    }

    /// Issue a new request for `key` even if one is already in flight.
    /// Responses of older requests for `key` no longer update the cache.
    pub async fn refresh<F, Fut>(&self, key: K, fetcher: F) -> Result<Arc<V>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        match self.lookup(key, fetcher, Mode::Force) {
            Lookup::Hit(data) => Ok(data),
            Lookup::Pending(pending) => pending.await,
        }
    }

    /// Return whatever is cached for `key` right away and refresh it in the
    /// background. Must be called inside a tokio runtime.
    pub fn revalidate<F, Fut>(&self, key: K, fetcher: F) -> FetchState<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        let state = self.state(&key);
        if let Lookup::Pending(pending) = self.lookup(key, fetcher, Mode::Join) {
            tokio::spawn(async move {
                // Failures are recorded in the entry.
                let _ = pending.await;
            });
        }
        state
    }

    pub fn invalidate(&self, key: &K) {
        self.entries.lock().remove(key);
    }

    fn lookup<F, Fut>(&self, key: K, fetcher: F, mode: Mode) -> Lookup<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        let mut entries = self.entries.lock();
        let entry = entries.entry(key.clone()).or_default();

        if mode != Mode::Force {
            if let Some((seq, pending)) = &entry.in_flight {
                debug!(?key, seq, "joining in-flight request");
                return Lookup::Pending(pending.clone());
            }
        }
        if mode == Mode::Cached && entry.error.is_none() {
            if let Some(data) = &entry.data {
                debug!(?key, "cache hit");
                return Lookup::Hit(Arc::clone(data));
            }
        }

        entry.issued += 1;
        let seq = entry.issued;
        debug!(?key, seq, "issuing request");

        let request = fetcher();
        let cache = self.clone();
        let pending = async move {
            let outcome = request.await.map(Arc::new);
            cache.settle(&key, seq, &outcome);
            outcome
        }
        .boxed()
        .shared();

        entry.in_flight = Some((seq, pending.clone()));
        Lookup::Pending(pending)
    }

    fn settle(&self, key: &K, seq: u64, outcome: &Result<Arc<V>>) {
        let mut entries = self.entries.lock();
        let Some(entry) = entries.get_mut(key) else {
            return;
        };

        if entry.in_flight.as_ref().is_some_and(|(s, _)| *s == seq) {
            entry.in_flight = None;
        }

        if seq < entry.issued {
            debug!(?key, seq, latest = entry.issued, "discarding stale response");
            return;
        }

        match outcome {
            Ok(value) => {
                entry.data = Some(Arc::clone(value));
                entry.error = None;
            }
            Err(err) => {
                debug!(?key, seq, error = %err, "request failed");
                entry.error = Some(err.clone());
            }
        }
    }
}

/// One-shot action triggered explicitly, with a busy flag.
///
/// A second trigger while the first is outstanding fails with
/// [`DashboardError::Busy`] instead of issuing another request.
#[derive(Debug, Clone, Default)]
pub struct Mutation {
    busy: Arc<AtomicBool>,
}

struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Mutation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_mutating(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub async fn trigger<Fut, T>(&self, action: Fut) -> Result<T>
    where
        Fut: Future<Output = Result<T>>,
    {
        if self.busy.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire).is_err() {
            return Err(DashboardError::Busy);
        }
        let _guard = BusyGuard(&self.busy);
        action.await
    }
}
