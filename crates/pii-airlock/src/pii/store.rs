use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::task::JoinHandle;

use super::mapping::RequestMapping;

struct Entry {
	mapping: RequestMapping,
	expires_at: std::time::Instant,
}

/// Tenant-namespaced TTL store for in-flight request mappings.
///
/// Keys are `"{tenant}:{request_id}"` so mappings from different tenants
/// never collide even if they reuse the same request id. Expiry is lazy on
/// `get`/checked eagerly by a background reaper.
pub struct MappingStore {
	inner: RwLock<hashbrown::HashMap<String, Entry>>,
	default_ttl: Duration,
}

impl MappingStore {
	pub fn new(default_ttl: Duration) -> Arc<Self> {
		Arc::new(Self {
			inner: RwLock::new(hashbrown::HashMap::new()),
			default_ttl,
		})
	}

	fn key(tenant: &str, request_id: &str) -> String {
		format!("{tenant}:{request_id}")
	}

	pub fn save(&self, tenant: &str, request_id: &str, mapping: RequestMapping) {
		let key = Self::key(tenant, request_id);
		let expires_at = std::time::Instant::now() + self.default_ttl;
		self.inner.write().insert(key, Entry { mapping, expires_at });
	}

	pub fn get(&self, tenant: &str, request_id: &str) -> Option<RequestMapping> {
		let key = Self::key(tenant, request_id);
		let guard = self.inner.read();
		let entry = guard.get(&key)?;
		if entry.expires_at <= std::time::Instant::now() {
			return None;
		}
		Some(entry.mapping.clone())
	}

	pub fn delete(&self, tenant: &str, request_id: &str) {
		let key = Self::key(tenant, request_id);
		self.inner.write().remove(&key);
	}

	/// Pushes a mapping's expiry back to `now + ttl`, used while a streaming
	/// response is still in flight so the mapping survives the whole stream.
	pub fn extend_ttl(&self, tenant: &str, request_id: &str, ttl: Duration) {
		let key = Self::key(tenant, request_id);
		if let Some(entry) = self.inner.write().get_mut(&key) {
			entry.expires_at = std::time::Instant::now() + ttl;
		}
	}

	pub fn delete_tenant(&self, tenant: &str) {
		let prefix = format!("{tenant}:");
		self.inner.write().retain(|k, _| !k.starts_with(&prefix));
	}

	/// Drops all entries whose TTL has passed. Returns the number removed.
	pub fn cleanup_expired(&self) -> usize {
		let now = std::time::Instant::now();
		let mut guard = self.inner.write();
		let before = guard.len();
		guard.retain(|_, v| v.expires_at > now);
		before - guard.len()
	}

	pub fn len(&self) -> usize {
		self.inner.read().len()
	}
}

/// Spawns the background reaper task. The returned handle should be joined
/// (with a timeout) during shutdown.
pub fn spawn_reaper(
	store: Arc<MappingStore>,
	interval: Duration,
	mut shutdown: airlock_core::signal::Watcher,
) -> JoinHandle<()> {
	tokio::spawn(async move {
		let mut ticker = tokio::time::interval(interval);
		loop {
			tokio::select! {
				_ = ticker.tick() => {
					let removed = store.cleanup_expired();
					if removed > 0 {
						tracing::debug!(removed, "mapping store reaper evicted expired entries");
					}
				}
				_ = shutdown.signaled() => {
					tracing::debug!("mapping store reaper shutting down");
					break;
				}
			}
		}
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn save_and_get_round_trip() {
		let store = MappingStore::new(Duration::from_secs(60));
		let mapping = RequestMapping::new("s1", 0);
		store.save("tenant-a", "req-1", mapping);
		assert!(store.get("tenant-a", "req-1").is_some());
		assert!(store.get("tenant-b", "req-1").is_none());
	}

	#[test]
	fn expired_entries_are_not_returned() {
		let store = MappingStore::new(Duration::from_millis(1));
		store.save("tenant-a", "req-1", RequestMapping::new("s1", 0));
		std::thread::sleep(Duration::from_millis(20));
		assert!(store.get("tenant-a", "req-1").is_none());
	}

	#[test]
	fn delete_tenant_clears_only_that_tenant() {
		let store = MappingStore::new(Duration::from_secs(60));
		store.save("tenant-a", "req-1", RequestMapping::new("s1", 0));
		store.save("tenant-b", "req-1", RequestMapping::new("s1", 0));
		store.delete_tenant("tenant-a");
		assert!(store.get("tenant-a", "req-1").is_none());
		assert!(store.get("tenant-b", "req-1").is_some());
	}

	#[test]
	fn cleanup_expired_counts_removed() {
		let store = MappingStore::new(Duration::from_millis(1));
		store.save("tenant-a", "req-1", RequestMapping::new("s1", 0));
		store.save("tenant-a", "req-2", RequestMapping::new("s1", 0));
		std::thread::sleep(Duration::from_millis(20));
		assert_eq!(store.cleanup_expired(), 2);
		assert_eq!(store.len(), 0);
	}
}
