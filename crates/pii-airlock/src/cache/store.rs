use std::time::{Duration, Instant};

use indexmap::IndexMap;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};

use crate::types::ChatCompletionResponse;

/// The fields that determine cache-key equivalence. Built from the
/// *anonymized* request so two tenants that happen to send identical text
/// containing different PII still map to different originals but equal
/// cache entries (the placeholders, not the raw PII, are fingerprinted).
pub struct CacheKeyInput<'a> {
	pub tenant: &'a str,
	pub model: &'a str,
	pub anonymized_messages_json: &'a str,
	pub temperature: Option<f64>,
	pub top_p: Option<f64>,
	pub max_tokens: Option<u32>,
	pub presence_penalty: Option<f64>,
	pub frequency_penalty: Option<f64>,
}

impl CacheKeyInput<'_> {
	fn fingerprint(&self) -> String {
		let mut hasher = Sha256::new();
		hasher.update(self.tenant.as_bytes());
		hasher.update(b"|");
		hasher.update(self.model.as_bytes());
		hasher.update(b"|");
		hasher.update(self.anonymized_messages_json.as_bytes());
		hasher.update(b"|");
		for field in [self.temperature, self.top_p] {
			hasher.update(field.map(|f| f.to_bits().to_le_bytes()).unwrap_or_default());
			hasher.update(b"|");
		}
		hasher.update(self.max_tokens.unwrap_or(0).to_le_bytes());
		hasher.update(b"|");
		for field in [self.presence_penalty, self.frequency_penalty] {
			hasher.update(field.map(|f| f.to_bits().to_le_bytes()).unwrap_or_default());
			hasher.update(b"|");
		}
		hex::encode(hasher.finalize())
	}
}

struct CacheEntry {
	tenant: String,
	response: ChatCompletionResponse,
	expires_at: Instant,
}

#[derive(Debug, Clone, Default)]
pub struct CacheStats {
	pub hits: u64,
	pub misses: u64,
	pub entries: usize,
}

/// Tenant-isolated TTL+LRU response cache. Disabled by default; when
/// `enabled` is false every lookup is a miss and nothing is stored, so the
/// rest of the proxy pipeline can call through unconditionally.
pub struct ResponseCache {
	enabled: bool,
	ttl: Duration,
	max_size: usize,
	entries: Mutex<IndexMap<String, CacheEntry>>,
	hits: std::sync::atomic::AtomicU64,
	misses: std::sync::atomic::AtomicU64,
}

impl ResponseCache {
	pub fn new(enabled: bool, ttl: Duration, max_size: usize) -> Self {
		Self {
			enabled,
			ttl,
			max_size,
			entries: Mutex::new(IndexMap::new()),
			hits: std::sync::atomic::AtomicU64::new(0),
			misses: std::sync::atomic::AtomicU64::new(0),
		}
	}

	pub fn get(&self, key: &CacheKeyInput) -> Option<ChatCompletionResponse> {
		if !self.enabled {
			return None;
		}
		let fingerprint = key.fingerprint();
		let mut guard = self.entries.lock();
		let Some(entry) = guard.get(&fingerprint) else {
			self.misses.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
			return None;
		};
		if entry.expires_at <= Instant::now() {
			guard.shift_remove(&fingerprint);
			self.misses.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
			return None;
		}
		// Defense in depth on top of the tenant-namespaced fingerprint: a hit
		// is only ever returned to the tenant it was stored for.
		if entry.tenant != key.tenant {
			self.misses.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
			return None;
		}
		let response = entry.response.clone();
		let tenant = entry.tenant.clone();
		// Move to back to mark as most recently used.
		guard.shift_remove(&fingerprint);
		guard.insert(fingerprint, CacheEntry { tenant, response: response.clone(), expires_at: Instant::now() + self.ttl });
		self.hits.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
		Some(response)
	}

	pub fn put(&self, key: &CacheKeyInput, response: ChatCompletionResponse) {
		if !self.enabled {
			return;
		}
		let fingerprint = key.fingerprint();
		let mut guard = self.entries.lock();
		if guard.len() >= self.max_size && !guard.contains_key(&fingerprint) {
			guard.shift_remove_index(0);
		}
		guard.insert(
			fingerprint,
			CacheEntry { tenant: key.tenant.to_string(), response, expires_at: Instant::now() + self.ttl },
		);
	}

	pub fn invalidate_tenant(&self, tenant: &str) {
		let mut guard = self.entries.lock();
		guard.retain(|_, entry| entry.tenant != tenant);
	}

	pub fn cleanup_expired(&self) -> usize {
		let now = Instant::now();
		let mut guard = self.entries.lock();
		let before = guard.len();
		guard.retain(|_, entry| entry.expires_at > now);
		before - guard.len()
	}

	pub fn stats(&self) -> CacheStats {
		CacheStats {
			hits: self.hits.load(std::sync::atomic::Ordering::Relaxed),
			misses: self.misses.load(std::sync::atomic::Ordering::Relaxed),
			entries: self.entries.lock().len(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn response() -> ChatCompletionResponse {
		ChatCompletionResponse {
			id: "chatcmpl-1".into(),
			object: "chat.completion".into(),
			created: 0,
			model: "gpt-4".into(),
			choices: vec![],
			usage: Default::default(),
			extra: Default::default(),
		}
	}

	fn key<'a>(tenant: &'a str, messages: &'a str) -> CacheKeyInput<'a> {
		CacheKeyInput {
			tenant,
			model: "gpt-4",
			anonymized_messages_json: messages,
			temperature: None,
			top_p: None,
			max_tokens: None,
			presence_penalty: None,
			frequency_penalty: None,
		}
	}

	#[test]
	fn disabled_cache_never_hits() {
		let cache = ResponseCache::new(false, Duration::from_secs(60), 10);
		cache.put(&key("tenant-a", "[]"), response());
		assert!(cache.get(&key("tenant-a", "[]")).is_none());
	}

	#[test]
	fn hit_after_put() {
		let cache = ResponseCache::new(true, Duration::from_secs(60), 10);
		cache.put(&key("tenant-a", "[]"), response());
		assert!(cache.get(&key("tenant-a", "[]")).is_some());
	}

	#[test]
	fn tenants_are_isolated() {
		let cache = ResponseCache::new(true, Duration::from_secs(60), 10);
		cache.put(&key("tenant-a", "[]"), response());
		assert!(cache.get(&key("tenant-b", "[]")).is_none());
	}

	#[test]
	fn expired_entry_is_a_miss() {
		let cache = ResponseCache::new(true, Duration::from_millis(1), 10);
		cache.put(&key("tenant-a", "[]"), response());
		std::thread::sleep(Duration::from_millis(20));
		assert!(cache.get(&key("tenant-a", "[]")).is_none());
	}
}
