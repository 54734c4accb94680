use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::pii::strategy::StrategyKind;

fn env_bool(key: &str, default: bool) -> bool {
	std::env::var(key)
		.ok()
		.and_then(|v| v.parse::<bool>().ok())
		.unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
	std::env::var(key)
		.ok()
		.and_then(|v| v.parse::<u64>().ok())
		.unwrap_or(default)
}

fn env_string(key: &str, default: &str) -> String {
	std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Which audit backend to use. `Database` is accepted for forward
/// compatibility with `PII_AIRLOCK_AUDIT_STORE=database` but currently falls
/// back to the file backend (see DESIGN.md).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditStoreKind {
	Memory,
	File,
	Database,
}

/// Process-wide configuration, built once from the environment at startup
/// and held behind an `Arc` on `Server`. Mirrors every `PII_AIRLOCK_*`
/// variable named in the specification.
#[derive(Debug, Clone)]
pub struct Config {
	pub secure_endpoints: bool,
	pub multi_tenant_enabled: bool,
	pub allow_header_tenant: bool,
	pub default_tenant: String,

	pub cache_enabled: bool,
	pub cache_ttl: Duration,
	pub cache_max_size: usize,

	/// YAML file of per-tenant quota limits, loaded by `config_files::load_quota_limits`.
	pub quota_config_path: Option<PathBuf>,
	/// YAML file seeding the tenant registry, loaded by `config_files::load_tenants`.
	pub tenant_config_path: Option<PathBuf>,
	/// Directory of compliance preset YAML files, scanned by
	/// `ComplianceRegistry::reload`.
	pub compliance_presets_dir: Option<PathBuf>,

	pub strategy_overrides: HashMap<String, StrategyKind>,

	pub audit_enabled: bool,
	pub audit_batch_size: usize,
	pub audit_flush_interval: Duration,
	pub audit_store: AuditStoreKind,
	pub audit_path: PathBuf,

	pub question_favoring_types: Vec<String>,
	pub intent_context_window: usize,

	pub mapping_ttl: Duration,
	pub mapping_cleanup_interval: Duration,
	pub cache_cleanup_interval: Duration,

	pub upstream_base_url: String,
	pub upstream_timeout: Duration,
	pub upstream_pool_max_idle: usize,
	pub upstream_pool_max_total: usize,

	pub secret_block_threshold: RiskLevel,
	pub fuzzy_deanonymize: bool,
	pub fuzzy_confidence_threshold: f64,

	pub anti_hallucination_notice: bool,

	pub listen_addr: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
	Low,
	Medium,
	High,
	Critical,
}

impl Config {
	/// Load configuration from environment variables, applying the defaults
	/// documented in the specification's external-interfaces section.
	pub fn from_env() -> Self {
		let default_strategy_types = [
			"PERSON",
			"PHONE",
			"EMAIL",
			"CREDIT_CARD",
			"ID_CARD",
			"IP",
		];
		let mut strategy_overrides = HashMap::new();
		for ty in default_strategy_types {
			if let Ok(raw) = std::env::var(format!("PII_AIRLOCK_STRATEGY_{ty}"))
				&& let Some(kind) = StrategyKind::parse(&raw)
			{
				strategy_overrides.insert(ty.to_string(), kind);
			}
		}

		let question_favoring_types = std::env::var("PII_AIRLOCK_QUESTION_FAVORING_TYPES")
			.ok()
			.map(|s| {
				s.split(',')
					.map(|t| t.trim().to_uppercase())
					.filter(|t| !t.is_empty())
					.collect()
			})
			.unwrap_or_else(|| {
				vec![
					"PERSON".to_string(),
					"ORGANIZATION".to_string(),
					"LOCATION".to_string(),
				]
			});

		let audit_store = match env_string("PII_AIRLOCK_AUDIT_STORE", "memory").as_str() {
			"file" => AuditStoreKind::File,
			"database" => AuditStoreKind::Database,
			_ => AuditStoreKind::Memory,
		};

		Config {
			secure_endpoints: env_bool("PII_AIRLOCK_SECURE_ENDPOINTS", false),
			multi_tenant_enabled: env_bool("PII_AIRLOCK_MULTI_TENANT_ENABLED", false),
			allow_header_tenant: env_bool("PII_AIRLOCK_ALLOW_HEADER_TENANT", false),
			default_tenant: env_string("PII_AIRLOCK_DEFAULT_TENANT", "default"),

			cache_enabled: env_bool("PII_AIRLOCK_CACHE_ENABLED", false),
			cache_ttl: Duration::from_secs(env_u64("PII_AIRLOCK_CACHE_TTL", 300)),
			cache_max_size: env_u64("PII_AIRLOCK_CACHE_MAX_SIZE", 1000) as usize,

			quota_config_path: std::env::var("PII_AIRLOCK_QUOTA_CONFIG_PATH").ok().map(PathBuf::from),
			tenant_config_path: std::env::var("PII_AIRLOCK_TENANT_CONFIG_PATH").ok().map(PathBuf::from),
			compliance_presets_dir: std::env::var("PII_AIRLOCK_COMPLIANCE_PRESETS_DIR").ok().map(PathBuf::from),

			strategy_overrides,

			audit_enabled: env_bool("PII_AIRLOCK_AUDIT_ENABLED", true),
			audit_batch_size: env_u64("PII_AIRLOCK_AUDIT_BATCH_SIZE", 100) as usize,
			audit_flush_interval: Duration::from_millis(env_u64(
				"PII_AIRLOCK_AUDIT_FLUSH_INTERVAL_MS",
				5000,
			)),
			audit_store,
			audit_path: PathBuf::from(env_string("PII_AIRLOCK_AUDIT_PATH", "./audit")),

			question_favoring_types,
			intent_context_window: env_u64("PII_AIRLOCK_INTENT_CONTEXT_WINDOW", 50) as usize,

			mapping_ttl: Duration::from_secs(600),
			mapping_cleanup_interval: Duration::from_secs(60),
			cache_cleanup_interval: Duration::from_secs(60),

			upstream_base_url: env_string("PII_AIRLOCK_UPSTREAM_BASE_URL", "https://api.openai.com"),
			upstream_timeout: Duration::from_secs(env_u64("PII_AIRLOCK_UPSTREAM_TIMEOUT_SECS", 120)),
			upstream_pool_max_idle: env_u64("PII_AIRLOCK_UPSTREAM_POOL_IDLE", 20) as usize,
			upstream_pool_max_total: env_u64("PII_AIRLOCK_UPSTREAM_POOL_TOTAL", 100) as usize,

			secret_block_threshold: RiskLevel::High,
			fuzzy_deanonymize: env_bool("PII_AIRLOCK_FUZZY_DEANONYMIZE", true),
			fuzzy_confidence_threshold: 0.75,

			anti_hallucination_notice: env_bool("PII_AIRLOCK_ANTI_HALLUCINATION_NOTICE", true),

			listen_addr: env_string("PII_AIRLOCK_LISTEN_ADDR", "0.0.0.0:8080"),
		}
	}

	/// Defaults matching `from_env()` with no environment variables set;
	/// tests override individual fields as needed.
	pub fn for_tests() -> Self {
		Config::from_env()
	}
}
