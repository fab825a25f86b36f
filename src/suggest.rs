//! Debounced search-suggestion fetching.
//!
//! As the user types, each keystroke (re)arms a quiet-period timer; only when
//! the timer elapses with no further input does a suggestion request go out.
//! Responses are tagged with a generation token so a reply from a superseded
//! query can never overwrite newer results.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

use crate::cache::TtlCache;

/// Quiet period after the last keystroke before a fetch fires.
pub const DEBOUNCE_MS: u64 = 150;

/// Queries shorter than this never trigger a fetch.
pub const MIN_QUERY_LEN: usize = 2;

/// Cancellable one-shot timer driven from the event-loop tick.
///
/// `schedule` replaces any pending deadline, so a burst of keystrokes
/// collapses into a single firing after the burst goes quiet.
#[derive(Debug)]
pub struct Debouncer {
  deadline: Option<Instant>,
  delay: Duration,
}

impl Debouncer {
  pub fn new(delay: Duration) -> Self {
    Self {
      deadline: None,
      delay,
    }
  }

  /// (Re)arm the timer.
  pub fn schedule(&mut self) {
    self.schedule_at(Instant::now());
  }

  /// Cancel the pending timer, if any.
  pub fn cancel(&mut self) {
    self.deadline = None;
  }

  pub fn has_pending(&self) -> bool {
    self.deadline.is_some()
  }

  /// True exactly once per armed cycle, when the deadline has passed.
  pub fn fire(&mut self) -> bool {
    self.fire_at(Instant::now())
  }

  fn schedule_at(&mut self, now: Instant) {
    self.deadline = Some(now + self.delay);
  }

  fn fire_at(&mut self, now: Instant) -> bool {
    match self.deadline {
      Some(deadline) if deadline <= now => {
        self.deadline = None;
        true
      }
      _ => false,
    }
  }
}

impl Default for Debouncer {
  fn default() -> Self {
    Self::new(Duration::from_millis(DEBOUNCE_MS))
  }
}

type BoxFuture<T> = Pin<Box<dyn Future<Output = Result<Vec<T>, String>> + Send>>;
type SuggestFn<T> = Box<dyn Fn(String) -> BoxFuture<T> + Send + Sync>;

/// Debounced autocomplete state for one search box.
///
/// Drive it with `input` on each query change, `tick` from the event loop,
/// and `poll` to apply arrived results. An optional shared [`TtlCache`] lets
/// repeated queries within the ttl skip the network entirely.
pub struct SuggestEngine<T> {
  fetcher: SuggestFn<T>,
  debouncer: Debouncer,
  pending: Option<String>,
  results: Vec<T>,
  visible: bool,
  generation: u64,
  receiver: Option<mpsc::UnboundedReceiver<(u64, Result<Vec<T>, String>)>>,
  cache: Option<(Arc<TtlCache<Vec<T>>>, Duration)>,
}

impl<T: Clone + Send + 'static> SuggestEngine<T> {
  pub fn new<F, Fut>(fetcher: F) -> Self
  where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Vec<T>, String>> + Send + 'static,
  {
    Self {
      fetcher: Box::new(move |q| Box::pin(fetcher(q))),
      debouncer: Debouncer::default(),
      pending: None,
      results: Vec::new(),
      visible: false,
      generation: 0,
      receiver: None,
      cache: None,
    }
  }

  /// Override the quiet period (tests use a short one).
  pub fn with_delay(mut self, delay: Duration) -> Self {
    self.debouncer = Debouncer::new(delay);
    self
  }

  /// Serve repeated queries from a shared cache for `ttl` before refetching.
  pub fn with_cache(mut self, cache: Arc<TtlCache<Vec<T>>>, ttl: Duration) -> Self {
    self.cache = Some((cache, ttl));
    self
  }

  /// The query text changed.
  ///
  /// Short queries clear and hide the list immediately and supersede any
  /// in-flight fetch; anything else (re)arms the debounce timer.
  pub fn input(&mut self, query: &str) {
    let query = query.trim();
    if query.chars().count() < MIN_QUERY_LEN {
      self.pending = None;
      self.debouncer.cancel();
      self.generation += 1;
      self.receiver = None;
      self.results.clear();
      self.visible = false;
      return;
    }
    self.pending = Some(query.to_string());
    self.debouncer.schedule();
  }

  /// Fire the pending query if its quiet period elapsed.
  pub fn tick(&mut self) {
    if self.debouncer.fire() {
      if let Some(query) = self.pending.take() {
        self.dispatch(query);
      }
    }
  }

  /// Apply an arrived result. Returns `true` if the state changed.
  ///
  /// Non-empty success shows the list; empty or failed hides it. Responses
  /// from superseded generations are dropped.
  pub fn poll(&mut self) -> bool {
    let receiver = match &mut self.receiver {
      Some(rx) => rx,
      None => return false,
    };

    match receiver.try_recv() {
      Ok((generation, result)) => {
        if generation != self.generation {
          return false;
        }
        self.receiver = None;
        match result {
          Ok(results) if !results.is_empty() => {
            self.results = results;
            self.visible = true;
          }
          Ok(_) | Err(_) => {
            self.results.clear();
            self.visible = false;
          }
        }
        true
      }
      Err(mpsc::error::TryRecvError::Empty) => false,
      Err(mpsc::error::TryRecvError::Disconnected) => {
        self.receiver = None;
        true
      }
    }
  }

  /// Hide the list. The in-flight fetch, if any, keeps running; its response
  /// still applies when it lands (only superseded generations are dropped).
  pub fn dismiss(&mut self) {
    self.visible = false;
  }

  pub fn is_visible(&self) -> bool {
    self.visible
  }

  /// A debounce timer is armed or a fetch is in flight.
  pub fn is_busy(&self) -> bool {
    self.debouncer.has_pending() || self.receiver.is_some()
  }

  pub fn results(&self) -> &[T] {
    &self.results
  }

  fn dispatch(&mut self, query: String) {
    let key = query.to_lowercase();

    if let Some((cache, _)) = &self.cache {
      if let Some(hit) = cache.get(&key) {
        // Supersede any in-flight fetch; the cached answer is newer intent.
        self.generation += 1;
        self.receiver = None;
        self.visible = !hit.is_empty();
        self.results = hit;
        return;
      }
    }

    self.generation += 1;
    let generation = self.generation;

    let (tx, rx) = mpsc::unbounded_channel();
    self.receiver = Some(rx);

    let cache = self.cache.clone();
    let future = (self.fetcher)(query);
    tokio::spawn(async move {
      let result = future.await;
      if let (Some((cache, ttl)), Ok(results)) = (&cache, &result) {
        cache.set(&key, results.clone(), *ttl);
      }
      let _ = tx.send((generation, result));
    });
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use proptest::prelude::*;
  use std::sync::atomic::{AtomicU32, Ordering};
  use std::sync::Mutex;

  const TICK: Duration = Duration::from_millis(20);

  /// Engine whose fetcher records every issued query and echoes it back.
  fn echo_engine(
    calls: Arc<AtomicU32>,
    last_query: Arc<Mutex<String>>,
  ) -> SuggestEngine<String> {
    SuggestEngine::new(move |query: String| {
      let calls = calls.clone();
      let last_query = last_query.clone();
      async move {
        calls.fetch_add(1, Ordering::SeqCst);
        *last_query.lock().unwrap() = query.clone();
        Ok(vec![query])
      }
    })
    .with_delay(TICK)
  }

  async fn settle(engine: &mut SuggestEngine<String>) {
    tokio::time::sleep(TICK + TICK).await;
    engine.tick();
    tokio::time::sleep(Duration::from_millis(10)).await;
    engine.poll();
  }

  #[tokio::test]
  async fn test_rapid_inputs_fetch_once_with_final_query() {
    let calls = Arc::new(AtomicU32::new(0));
    let last_query = Arc::new(Mutex::new(String::new()));
    let mut engine = echo_engine(calls.clone(), last_query.clone());

    engine.input("ca");
    engine.input("car");
    engine.input("car k");
    settle(&mut engine).await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(*last_query.lock().unwrap(), "car k");
    assert!(engine.is_visible());
    assert_eq!(engine.results(), ["car k"]);
  }

  #[tokio::test]
  async fn test_short_query_never_fetches_and_clears() {
    let calls = Arc::new(AtomicU32::new(0));
    let last_query = Arc::new(Mutex::new(String::new()));
    let mut engine = echo_engine(calls.clone(), last_query.clone());

    engine.input("ca");
    settle(&mut engine).await;
    assert!(engine.is_visible());

    // Deleting down to one char hides and clears immediately, no timer.
    engine.input("c");
    assert!(!engine.is_visible());
    assert!(engine.results().is_empty());

    settle(&mut engine).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_empty_result_hides_list() {
    let mut engine: SuggestEngine<String> =
      SuggestEngine::new(|_q: String| async { Ok(Vec::new()) }).with_delay(TICK);

    engine.input("nothing here");
    settle(&mut engine).await;

    assert!(!engine.is_visible());
  }

  #[tokio::test]
  async fn test_failure_hides_list() {
    let mut engine: SuggestEngine<String> =
      SuggestEngine::new(|_q: String| async { Err("boom".to_string()) }).with_delay(TICK);

    engine.input("query");
    settle(&mut engine).await;

    assert!(!engine.is_visible());
    assert!(engine.results().is_empty());
  }

  #[tokio::test]
  async fn test_superseded_response_is_dropped() {
    let mut engine = SuggestEngine::new(|query: String| async move {
      // First query is slow, the rest answer immediately
      if query == "first" {
        tokio::time::sleep(Duration::from_millis(80)).await;
      }
      Ok(vec![query])
    })
    .with_delay(Duration::from_millis(5));

    engine.input("first");
    tokio::time::sleep(Duration::from_millis(10)).await;
    engine.tick();

    engine.input("second");
    tokio::time::sleep(Duration::from_millis(10)).await;
    engine.tick();

    tokio::time::sleep(Duration::from_millis(120)).await;
    engine.poll();

    assert_eq!(engine.results(), ["second"]);
  }

  #[tokio::test]
  async fn test_repeated_query_is_served_from_cache() {
    let calls = Arc::new(AtomicU32::new(0));
    let last_query = Arc::new(Mutex::new(String::new()));
    let cache = Arc::new(TtlCache::new());
    let mut engine = echo_engine(calls.clone(), last_query)
      .with_cache(cache.clone(), Duration::from_secs(30));

    engine.input("spare keys");
    settle(&mut engine).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    engine.dismiss();
    engine.input("spare keys");
    settle(&mut engine).await;

    // Second round never reached the fetcher
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(engine.is_visible());
    assert_eq!(engine.results(), ["spare keys"]);
    assert_eq!(cache.len(), 1);
  }

  #[tokio::test]
  async fn test_dismiss_does_not_cancel_in_flight_fetch() {
    let mut engine = SuggestEngine::new(|query: String| async move {
      tokio::time::sleep(Duration::from_millis(40)).await;
      Ok(vec![query])
    })
    .with_delay(Duration::from_millis(5));

    engine.input("wallet");
    tokio::time::sleep(Duration::from_millis(10)).await;
    engine.tick();
    engine.dismiss();

    tokio::time::sleep(Duration::from_millis(80)).await;
    assert!(engine.poll());
    // The current generation's response still applies after a dismissal.
    assert!(engine.is_visible());
    assert_eq!(engine.results(), ["wallet"]);
  }

  proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // For any burst of keystrokes closer together than the quiet period,
    // the timer fires exactly once, after the burst ends.
    #[test]
    fn prop_keystroke_burst_fires_once(num_inputs in 2usize..=10) {
      let delay = Duration::from_millis(150);
      let mut debouncer = Debouncer::new(delay);
      let start = Instant::now();

      let mut now = start;
      for _ in 0..num_inputs {
        debouncer.schedule_at(now);
        now += Duration::from_millis(5);
      }

      prop_assert!(!debouncer.fire_at(now), "must stay quiet during the burst");
      prop_assert!(debouncer.has_pending());

      let after = now + delay + Duration::from_millis(10);
      prop_assert!(debouncer.fire_at(after), "must fire after the quiet period");
      prop_assert!(!debouncer.fire_at(after), "must fire only once per cycle");
    }
  }
}
