//! Generic key-value cache with per-entry expiry.
//!
//! Entries are evicted lazily: an expired entry is removed by the `get` that
//! discovers it, there is no background sweep. The store is shared by
//! reference (`Arc`) between consumers and lives as long as the app, not as
//! long as any single view.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

struct Entry<V> {
  value: V,
  expires_at: Instant,
}

/// String-keyed store whose entries stay readable until their ttl elapses.
pub struct TtlCache<V> {
  entries: Mutex<HashMap<String, Entry<V>>>,
}

impl<V: Clone> TtlCache<V> {
  pub fn new() -> Self {
    Self {
      entries: Mutex::new(HashMap::new()),
    }
  }

  /// Store `value` under `key`, overwriting any existing entry.
  pub fn set(&self, key: &str, value: V, ttl: Duration) {
    self.set_at(key, value, ttl, Instant::now());
  }

  /// Return the value for `key` while it is still fresh.
  ///
  /// An expired entry is removed during the read and `None` returned.
  pub fn get(&self, key: &str) -> Option<V> {
    self.get_at(key, Instant::now())
  }

  /// Remove the entry unconditionally. No-op when absent.
  #[allow(dead_code)]
  pub fn invalidate(&self, key: &str) {
    self.lock().remove(key);
  }

  /// Remove all entries.
  pub fn clear(&self) {
    self.lock().clear();
  }

  /// Number of resident entries. Expired entries count until a read evicts
  /// them.
  pub fn len(&self) -> usize {
    self.lock().len()
  }

  #[allow(dead_code)]
  pub fn is_empty(&self) -> bool {
    self.lock().is_empty()
  }

  fn set_at(&self, key: &str, value: V, ttl: Duration, now: Instant) {
    self.lock().insert(
      key.to_string(),
      Entry {
        value,
        expires_at: now + ttl,
      },
    );
  }

  fn get_at(&self, key: &str, now: Instant) -> Option<V> {
    let mut entries = self.lock();
    match entries.get(key) {
      Some(entry) if now < entry.expires_at => Some(entry.value.clone()),
      Some(_) => {
        entries.remove(key);
        None
      }
      None => None,
    }
  }

  fn lock(&self) -> MutexGuard<'_, HashMap<String, Entry<V>>> {
    // Keep the map usable even if a holder panicked mid-operation.
    self.entries.lock().unwrap_or_else(|e| e.into_inner())
  }
}

impl<V: Clone> Default for TtlCache<V> {
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_get_after_set_returns_value() {
    let cache = TtlCache::new();
    cache.set("k", 42, Duration::from_secs(30));
    assert_eq!(cache.get("k"), Some(42));
  }

  #[test]
  fn test_zero_ttl_is_immediately_expired() {
    let cache = TtlCache::new();
    let now = Instant::now();
    cache.set_at("k", 42, Duration::ZERO, now);
    assert_eq!(cache.get_at("k", now), None);
  }

  #[test]
  fn test_expired_entry_is_evicted_on_read() {
    let cache = TtlCache::new();
    let now = Instant::now();
    cache.set_at("k", "v".to_string(), Duration::from_secs(1), now);
    assert_eq!(cache.len(), 1);

    let later = now + Duration::from_secs(2);
    assert_eq!(cache.get_at("k", later), None);
    // Removed by the read, not merely hidden.
    assert_eq!(cache.len(), 0);
    assert_eq!(cache.get_at("k", later), None);
  }

  #[test]
  fn test_fresh_read_within_ttl() {
    let cache = TtlCache::new();
    let now = Instant::now();
    cache.set_at("k", 7, Duration::from_secs(10), now);
    assert_eq!(cache.get_at("k", now + Duration::from_secs(9)), Some(7));
  }

  #[test]
  fn test_set_overwrites_value_and_ttl() {
    let cache = TtlCache::new();
    let now = Instant::now();
    cache.set_at("k", 1, Duration::from_secs(1), now);
    cache.set_at("k", 2, Duration::from_secs(60), now);
    assert_eq!(cache.get_at("k", now + Duration::from_secs(30)), Some(2));
  }

  #[test]
  fn test_invalidate_removes_entry() {
    let cache = TtlCache::new();
    cache.set("k", 1, Duration::from_secs(60));
    cache.invalidate("k");
    assert_eq!(cache.get("k"), None);
    // No-op on a missing key.
    cache.invalidate("absent");
  }

  #[test]
  fn test_clear_removes_everything() {
    let cache = TtlCache::new();
    cache.set("a", 1, Duration::from_secs(60));
    cache.set("b", 2, Duration::from_secs(60));
    cache.clear();
    assert!(cache.is_empty());
  }
}
