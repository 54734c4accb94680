use prometheus_client::encoding::text::encode;
use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::registry::Registry;

#[derive(Debug, Clone, PartialEq, Eq, Hash, EncodeLabelSet)]
pub struct TenantLabel {
	pub tenant: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, EncodeLabelSet)]
pub struct OutcomeLabel {
	pub tenant: String,
	pub outcome: String,
}

/// Process-wide metrics registry. Held behind an `Arc` on `Server` and
/// exposed at `/metrics` in Prometheus text format.
pub struct Metrics {
	registry: Registry,
	pub requests_total: Family<OutcomeLabel, Counter>,
	pub quota_denied_total: Family<TenantLabel, Counter>,
	pub secrets_blocked_total: Family<TenantLabel, Counter>,
	pub cache_hits_total: Family<TenantLabel, Counter>,
	pub cache_misses_total: Family<TenantLabel, Counter>,
	pub upstream_errors_total: Family<TenantLabel, Counter>,
	pub mapping_store_size: Gauge,
}

impl Metrics {
	pub fn new() -> Self {
		let mut registry = Registry::default();

		let requests_total = Family::<OutcomeLabel, Counter>::default();
		registry.register("pii_airlock_requests", "Total proxied requests by outcome", requests_total.clone());

		let quota_denied_total = Family::<TenantLabel, Counter>::default();
		registry.register("pii_airlock_quota_denied", "Requests denied by quota enforcement", quota_denied_total.clone());

		let secrets_blocked_total = Family::<TenantLabel, Counter>::default();
		registry.register("pii_airlock_secrets_blocked", "Requests blocked by the secret scanner", secrets_blocked_total.clone());

		let cache_hits_total = Family::<TenantLabel, Counter>::default();
		registry.register("pii_airlock_cache_hits", "Response cache hits", cache_hits_total.clone());

		let cache_misses_total = Family::<TenantLabel, Counter>::default();
		registry.register("pii_airlock_cache_misses", "Response cache misses", cache_misses_total.clone());

		let upstream_errors_total = Family::<TenantLabel, Counter>::default();
		registry.register("pii_airlock_upstream_errors", "Upstream request failures", upstream_errors_total.clone());

		let mapping_store_size = Gauge::default();
		registry.register("pii_airlock_mapping_store_size", "Entries currently held in the mapping store", mapping_store_size.clone());

		Self {
			registry,
			requests_total,
			quota_denied_total,
			secrets_blocked_total,
			cache_hits_total,
			cache_misses_total,
			upstream_errors_total,
			mapping_store_size,
		}
	}

	pub fn encode(&self) -> String {
		let mut buffer = String::new();
		encode(&mut buffer, &self.registry).unwrap_or_default();
		buffer
	}
}

impl Default for Metrics {
	fn default() -> Self {
		Self::new()
	}
}
