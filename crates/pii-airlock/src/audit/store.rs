use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::path::PathBuf;

use super::event::AuditEvent;

const MAX_BACKLOG: usize = 1000;

#[async_trait]
pub trait AuditStore: Send + Sync {
	async fn record(&self, event: AuditEvent);
	async fn recent(&self, tenant: &str, limit: usize) -> Vec<AuditEvent>;
}

/// Bounded in-memory ring buffer. Default store; data is lost on restart.
#[derive(Default)]
pub struct MemoryAuditStore {
	events: Mutex<VecDeque<AuditEvent>>,
}

impl MemoryAuditStore {
	pub fn new() -> Self {
		Self::default()
	}
}

#[async_trait]
impl AuditStore for MemoryAuditStore {
	async fn record(&self, event: AuditEvent) {
		let mut guard = self.events.lock();
		if guard.len() >= MAX_BACKLOG {
			guard.pop_front();
		}
		guard.push_back(event);
	}

	async fn recent(&self, tenant: &str, limit: usize) -> Vec<AuditEvent> {
		let guard = self.events.lock();
		guard.iter().rev().filter(|e| e.tenant_id == tenant).take(limit).cloned().collect()
	}
}

/// Appends one JSON line per event to `{base_path}/{YYYY-MM-DD}.jsonl`, one
/// file per UTC calendar day. A `Database` configuration falls back to this
/// store (see DESIGN.md): no SQL crate is part of the stack, and JSONL gives
/// the same durability and append-only audit trail without fabricating one.
pub struct FileAuditStore {
	base_path: PathBuf,
	recent_cache: Mutex<VecDeque<AuditEvent>>,
}

impl FileAuditStore {
	pub fn new(base_path: PathBuf) -> Self {
		Self { base_path, recent_cache: Mutex::new(VecDeque::new()) }
	}

	fn path_for(&self, ts: chrono::DateTime<chrono::Utc>) -> PathBuf {
		self.base_path.join(format!("{}.jsonl", ts.format("%Y-%m-%d")))
	}
}

#[async_trait]
impl AuditStore for FileAuditStore {
	async fn record(&self, event: AuditEvent) {
		{
			let mut guard = self.recent_cache.lock();
			if guard.len() >= MAX_BACKLOG {
				guard.pop_front();
			}
			guard.push_back(event.clone());
		}

		let path = self.path_for(event.timestamp);
		if let Err(err) = fs_err::tokio::create_dir_all(&self.base_path).await {
			tracing::warn!(error = %err, "failed to create audit directory");
			return;
		}
		let line = match serde_json::to_string(&event) {
			Ok(line) => line,
			Err(err) => {
				tracing::warn!(error = %err, "failed to serialize audit event");
				return;
			},
		};
		use tokio::io::AsyncWriteExt;
		match fs_err::tokio::OpenOptions::new().create(true).append(true).open(&path).await {
			Ok(mut file) => {
				if let Err(err) = file.write_all(format!("{line}\n").as_bytes()).await {
					tracing::warn!(error = %err, path = %path.display(), "failed to append audit event");
				}
			},
			Err(err) => {
				tracing::warn!(error = %err, path = %path.display(), "failed to open audit file");
			},
		}
	}

	async fn recent(&self, tenant: &str, limit: usize) -> Vec<AuditEvent> {
		let guard = self.recent_cache.lock();
		guard.iter().rev().filter(|e| e.tenant_id == tenant).take(limit).cloned().collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::audit::event::AuditEventKind;

	fn event(tenant: &str) -> AuditEvent {
		AuditEvent {
			event_id: uuid::Uuid::new_v4().to_string(),
			timestamp: chrono::Utc::now(),
			tenant_id: tenant.to_string(),
			request_id: "req-1".to_string(),
			kind: AuditEventKind::RequestAnonymized,
			model: Some("gpt-4".to_string()),
			entities_anonymized: 2,
			detail: None,
		}
	}

	#[tokio::test]
	async fn memory_store_records_and_filters_by_tenant() {
		let store = MemoryAuditStore::new();
		store.record(event("tenant-a")).await;
		store.record(event("tenant-b")).await;
		let recent = store.recent("tenant-a", 10).await;
		assert_eq!(recent.len(), 1);
	}

	#[tokio::test]
	async fn memory_store_evicts_oldest_beyond_backlog() {
		let store = MemoryAuditStore::new();
		for _ in 0..(MAX_BACKLOG + 10) {
			store.record(event("tenant-a")).await;
		}
		let recent = store.recent("tenant-a", usize::MAX).await;
		assert_eq!(recent.len(), MAX_BACKLOG);
	}

	#[tokio::test]
	async fn file_store_writes_jsonl_to_disk() {
		let dir = tempfile::tempdir().unwrap();
		let store = FileAuditStore::new(dir.path().to_path_buf());
		store.record(event("tenant-a")).await;
		let recent = store.recent("tenant-a", 10).await;
		assert_eq!(recent.len(), 1);
		let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
		assert_eq!(entries.len(), 1);
	}
}
