//! Async query controller for list data, with a single-slot freshness cache.
//!
//! Inspired by TanStack Query: a `Query<T>` owns one async "fetch all"
//! operation and tracks `{data, loading, error}` for the UI. A successful
//! result is kept as a cached slot; while the slot is younger than
//! `cache_time`, `fetch(false)` serves it without touching the network.
//!
//! # Example
//!
//! ```ignore
//! let api = api.clone();
//! let mut query = Query::new(move || {
//!     let api = api.clone();
//!     async move { api.fetch_items().await.map_err(|e| e.to_string()) }
//! });
//!
//! // In the event loop tick
//! if query.poll() {
//!     // State changed, next draw picks it up
//! }
//! ```

use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// Default freshness window, in milliseconds.
pub const DEFAULT_CACHE_TIME_MS: u64 = 30_000;

/// A boxed future that resolves to a Result<T, String>
type BoxFuture<T> = Pin<Box<dyn Future<Output = Result<T, String>> + Send>>;

/// A factory function that creates futures for fetching data
type FetcherFn<T> = Box<dyn Fn() -> BoxFuture<T> + Send + Sync>;

/// Where the query currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryPhase {
  /// Nothing fetched, nothing in flight
  Idle,
  /// A fetch is in flight
  Loading,
  /// The last fetch succeeded and its value is cached
  Fresh,
  /// The last fetch failed; any earlier value is still served
  Failed,
}

/// Cached-fetch controller around one async operation.
///
/// Construction triggers the initial fetch automatically. Results arrive
/// through a channel and are applied by `poll()`, called from the view tick,
/// so all state transitions happen between renders.
///
/// Each started fetch carries a monotonically increasing generation token;
/// responses from superseded fetches are discarded, so overlapping calls
/// resolve latest-wins regardless of network ordering.
pub struct Query<T> {
  data: Option<T>,
  error: Option<String>,
  loading: bool,
  fetched_at: Option<Instant>,
  cache_time: Duration,
  generation: u64,
  fetcher: FetcherFn<T>,
  receiver: Option<mpsc::UnboundedReceiver<(u64, Result<T, String>)>>,
}

impl<T: Send + 'static> Query<T> {
  /// Create the query and start its initial fetch.
  pub fn new<F, Fut>(fetcher: F) -> Self
  where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, String>> + Send + 'static,
  {
    let mut query = Self {
      data: None,
      error: None,
      loading: false,
      fetched_at: None,
      cache_time: Duration::from_millis(DEFAULT_CACHE_TIME_MS),
      generation: 0,
      fetcher: Box::new(move || Box::pin(fetcher())),
      receiver: None,
    };
    query.start_fetch();
    query
  }

  /// Set the freshness window for the cached slot.
  pub fn with_cache_time(mut self, cache_time: Duration) -> Self {
    self.cache_time = cache_time;
    self
  }

  /// The last successfully fetched value, if any.
  pub fn data(&self) -> Option<&T> {
    self.data.as_ref()
  }

  /// The last fetch error, if the most recent attempt failed.
  pub fn error(&self) -> Option<&str> {
    self.error.as_deref()
  }

  pub fn is_loading(&self) -> bool {
    self.loading
  }

  pub fn phase(&self) -> QueryPhase {
    if self.loading {
      QueryPhase::Loading
    } else if self.error.is_some() {
      QueryPhase::Failed
    } else if self.data.is_some() {
      QueryPhase::Fresh
    } else {
      QueryPhase::Idle
    }
  }

  /// Whether the cached slot exists and is younger than `cache_time`.
  pub fn is_fresh(&self) -> bool {
    self.data.is_some()
      && self
        .fetched_at
        .is_some_and(|at| at.elapsed() < self.cache_time)
  }

  /// Fetch, honoring the cached slot.
  ///
  /// With `force == false` a fresh slot is served as-is (no network), and a
  /// fetch already in flight is joined rather than duplicated. Otherwise a
  /// new fetch starts, superseding any in-flight one.
  pub fn fetch(&mut self, force: bool) {
    if !force && (self.loading || self.is_fresh()) {
      return;
    }
    self.start_fetch();
  }

  /// Force a new fetch regardless of freshness.
  pub fn refresh(&mut self) {
    self.fetch(true);
  }

  /// Drop the slot's freshness stamp so the next `fetch` goes to the
  /// network. Does not refetch; the last value stays served until replaced.
  pub fn invalidate_cache(&mut self) {
    self.fetched_at = None;
  }

  /// Mutate the cached value in place, keeping its timestamp.
  ///
  /// Used to mirror a confirmed write without a full refetch.
  pub fn update_data<F: FnOnce(&mut T)>(&mut self, f: F) {
    if let Some(data) = &mut self.data {
      f(data);
    }
  }

  /// Apply a pending result, if one arrived.
  ///
  /// Returns `true` if the state changed. A failure records its message and
  /// leaves the cached value untouched.
  pub fn poll(&mut self) -> bool {
    let receiver = match &mut self.receiver {
      Some(rx) => rx,
      None => return false,
    };

    match receiver.try_recv() {
      Ok((generation, result)) => {
        if generation != self.generation {
          // Response from a superseded fetch
          return false;
        }
        self.receiver = None;
        self.loading = false;
        match result {
          Ok(data) => {
            self.data = Some(data);
            self.fetched_at = Some(Instant::now());
            self.error = None;
          }
          Err(error) => {
            self.error = Some(error);
          }
        }
        true
      }
      Err(mpsc::error::TryRecvError::Empty) => false,
      Err(mpsc::error::TryRecvError::Disconnected) => {
        // Sender dropped without a result - the fetch task died
        self.receiver = None;
        self.loading = false;
        self.error = Some("fetch ended without a result".to_string());
        true
      }
    }
  }

  fn start_fetch(&mut self) {
    self.generation += 1;
    let generation = self.generation;

    let (tx, rx) = mpsc::unbounded_channel();
    self.receiver = Some(rx);
    self.loading = true;
    self.error = None;

    let future = (self.fetcher)();
    tokio::spawn(async move {
      let result = future.await;
      // Ignore send errors - the receiver may have been superseded
      let _ = tx.send((generation, result));
    });
  }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Query<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Query")
      .field("data", &self.data)
      .field("error", &self.error)
      .field("loading", &self.loading)
      .field("fetched_at", &self.fetched_at)
      .field("cache_time", &self.cache_time)
      .finish_non_exhaustive()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::{AtomicU32, Ordering};
  use std::sync::Arc;

  fn counting_query(counter: Arc<AtomicU32>) -> Query<u32> {
    Query::new(move || {
      let counter = counter.clone();
      async move { Ok::<_, String>(counter.fetch_add(1, Ordering::SeqCst) + 1) }
    })
  }

  async fn settle<T: Send + 'static>(query: &mut Query<T>) {
    tokio::time::sleep(Duration::from_millis(10)).await;
    query.poll();
  }

  #[tokio::test]
  async fn test_initial_fetch_on_construction() {
    let counter = Arc::new(AtomicU32::new(0));
    let mut query = counting_query(counter.clone());

    assert_eq!(query.phase(), QueryPhase::Loading);
    settle(&mut query).await;

    assert_eq!(query.phase(), QueryPhase::Fresh);
    assert_eq!(query.data(), Some(&1));
    assert_eq!(counter.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_fetch_within_cache_time_is_served_from_slot() {
    let counter = Arc::new(AtomicU32::new(0));
    let mut query = counting_query(counter.clone());
    settle(&mut query).await;

    query.fetch(false);
    query.fetch(false);
    settle(&mut query).await;

    assert_eq!(counter.load(Ordering::SeqCst), 1);
    assert_eq!(query.data(), Some(&1));
  }

  #[tokio::test]
  async fn test_expired_slot_triggers_refetch() {
    let counter = Arc::new(AtomicU32::new(0));
    let mut query = counting_query(counter.clone()).with_cache_time(Duration::ZERO);
    settle(&mut query).await;

    query.fetch(false);
    settle(&mut query).await;

    assert_eq!(counter.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn test_refresh_ignores_freshness() {
    let counter = Arc::new(AtomicU32::new(0));
    let mut query = counting_query(counter.clone());
    settle(&mut query).await;

    query.refresh();
    settle(&mut query).await;

    assert_eq!(counter.load(Ordering::SeqCst), 2);
    assert_eq!(query.data(), Some(&2));
    assert!(query.is_fresh());
  }

  #[tokio::test]
  async fn test_invalidate_cache_forces_next_fetch() {
    let counter = Arc::new(AtomicU32::new(0));
    let mut query = counting_query(counter.clone());
    settle(&mut query).await;

    query.invalidate_cache();
    assert!(!query.is_fresh());
    // The last value keeps being served until the refetch lands
    assert_eq!(query.data(), Some(&1));

    query.fetch(false);
    settle(&mut query).await;

    assert_eq!(counter.load(Ordering::SeqCst), 2);
    assert_eq!(query.data(), Some(&2));
  }

  #[tokio::test]
  async fn test_failure_keeps_previous_data() {
    let attempts = Arc::new(AtomicU32::new(0));
    let attempts_clone = attempts.clone();

    let mut query = Query::new(move || {
      let attempts = attempts_clone.clone();
      async move {
        if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
          Ok(vec![1, 2, 3])
        } else {
          Err("backend unavailable".to_string())
        }
      }
    });
    settle(&mut query).await;
    assert_eq!(query.data(), Some(&vec![1, 2, 3]));

    query.refresh();
    settle(&mut query).await;

    assert_eq!(query.phase(), QueryPhase::Failed);
    assert_eq!(query.error(), Some("backend unavailable"));
    assert_eq!(query.data(), Some(&vec![1, 2, 3]));
  }

  #[tokio::test]
  async fn test_fetch_while_loading_coalesces() {
    let counter = Arc::new(AtomicU32::new(0));
    let counter_clone = counter.clone();

    let mut query = Query::new(move || {
      let counter = counter_clone.clone();
      async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        Ok::<_, String>(counter.fetch_add(1, Ordering::SeqCst))
      }
    });

    query.fetch(false);
    query.fetch(false);
    tokio::time::sleep(Duration::from_millis(100)).await;
    query.poll();

    assert_eq!(counter.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_superseded_response_is_discarded() {
    let counter = Arc::new(AtomicU32::new(0));
    let counter_clone = counter.clone();

    let mut query = Query::new(move || {
      let counter = counter_clone.clone();
      async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        Ok::<_, String>(counter.fetch_add(1, Ordering::SeqCst) + 1)
      }
    });

    tokio::time::sleep(Duration::from_millis(10)).await;
    // Supersede the in-flight fetch before it resolves
    query.refresh();
    tokio::time::sleep(Duration::from_millis(120)).await;
    query.poll();

    // Only the second fetch's value is ever applied
    assert_eq!(query.data(), Some(&2));
  }

  #[tokio::test]
  async fn test_update_data_mirrors_local_write() {
    let mut query = Query::new(|| async { Ok::<_, String>(vec![1, 2, 3]) });
    settle(&mut query).await;

    query.update_data(|v| v.retain(|&n| n != 2));
    assert_eq!(query.data(), Some(&vec![1, 3]));
    // Mirroring does not invalidate the slot
    assert!(query.is_fresh());
  }
}
