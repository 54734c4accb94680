use std::sync::Arc;
use std::time::Duration;

use airlock_core::signal::Watcher;

use crate::audit::{AuditStore, FileAuditStore, MemoryAuditStore};
use crate::cache::ResponseCache;
use crate::compliance::ComplianceRegistry;
use crate::config::{AuditStoreKind, Config};
use crate::pii::allowlist::Allowlist;
use crate::pii::store::MappingStore;
use crate::quota::QuotaStore;
use crate::telemetry::metrics::Metrics;
use crate::tenant::TenantRegistry;

/// Every shared dependency the HTTP handlers need, constructed once at
/// startup and cheaply `Clone`d into axum's `State` for each request.
#[derive(Clone)]
pub struct ServerState {
	pub config: Arc<Config>,
	pub mapping_store: Arc<MappingStore>,
	pub allowlist: Arc<Allowlist>,
	pub cache: Arc<ResponseCache>,
	pub quota: Arc<QuotaStore>,
	pub tenants: Arc<TenantRegistry>,
	pub audit: Arc<dyn AuditStore>,
	pub metrics: Arc<Metrics>,
	pub upstream: reqwest::Client,
	pub compliance: Arc<ComplianceRegistry>,
}

impl ServerState {
	pub fn new(config: Config) -> anyhow::Result<Self> {
		let config = Arc::new(config);

		let compliance = ComplianceRegistry::new(config.compliance_presets_dir.clone())?;

		let tenants = TenantRegistry::new();
		for tenant in crate::config_files::load_tenants(config.tenant_config_path.as_deref())? {
			if let Some(preset) = &tenant.compliance_preset
				&& !compliance.activate(&tenant.id, preset)
			{
				tracing::warn!(tenant = %tenant.id, preset, "tenant names an unknown compliance preset");
			}
			tenants.upsert_tenant(tenant);
		}
		let quota_limits = crate::config_files::load_quota_limits(config.quota_config_path.as_deref())?;

		let audit: Arc<dyn AuditStore> = match config.audit_store {
			AuditStoreKind::Memory => Arc::new(MemoryAuditStore::new()),
			AuditStoreKind::File => Arc::new(FileAuditStore::new(config.audit_path.clone())),
			AuditStoreKind::Database => {
				tracing::warn!("audit store 'database' is not implemented; falling back to the file store");
				Arc::new(FileAuditStore::new(config.audit_path.clone()))
			},
		};

		let upstream = reqwest::Client::builder()
			.timeout(config.upstream_timeout)
			.pool_max_idle_per_host(config.upstream_pool_max_idle)
			.build()?;

		Ok(Self {
			mapping_store: MappingStore::new(config.mapping_ttl),
			allowlist: Arc::new(Allowlist::new()),
			cache: Arc::new(ResponseCache::new(config.cache_enabled, config.cache_ttl, config.cache_max_size)),
			quota: Arc::new(QuotaStore::new(quota_limits)),
			tenants: Arc::new(tenants),
			audit,
			metrics: Arc::new(Metrics::new()),
			upstream,
			compliance: Arc::new(compliance),
			config,
		})
	}

	/// Spawns the background reaper tasks (mapping TTL eviction, cache TTL
	/// eviction), returning their join handles for cooperative shutdown.
	pub fn spawn_background_tasks(&self, shutdown: Watcher) -> Vec<(&'static str, tokio::task::JoinHandle<()>)> {
		let mut handles = Vec::new();

		handles.push((
			"mapping-reaper",
			crate::pii::store::spawn_reaper(self.mapping_store.clone(), self.config.mapping_cleanup_interval, shutdown.clone()),
		));

		let cache = self.cache.clone();
		let interval = self.config.cache_cleanup_interval;
		let mut cache_shutdown = shutdown;
		handles.push((
			"cache-reaper",
			tokio::spawn(async move {
				let mut ticker = tokio::time::interval(interval);
				loop {
					tokio::select! {
						_ = ticker.tick() => {
							let removed = cache.cleanup_expired();
							if removed > 0 {
								tracing::debug!(removed, "response cache reaper evicted expired entries");
							}
						}
						_ = cache_shutdown.signaled() => {
							tracing::debug!("response cache reaper shutting down");
							break;
						}
					}
				}
			}),
		));

		handles
	}
}
