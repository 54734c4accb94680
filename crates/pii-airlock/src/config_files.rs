//! YAML-backed tenant and quota configuration, loaded once at startup
//! alongside the environment-driven [`crate::config::Config`].

use std::path::Path;

use serde::Deserialize;

use crate::quota::QuotaLimit;
use crate::tenant::Tenant;

#[derive(Debug, Deserialize)]
struct TenantFile {
	#[serde(default)]
	tenants: Vec<Tenant>,
}

/// One tenant's quota limits as written in `PII_AIRLOCK_QUOTA_CONFIG_PATH`.
#[derive(Debug, Deserialize)]
struct TenantQuotaFile {
	tenant: String,
	#[serde(default)]
	limits: Vec<QuotaLimit>,
}

#[derive(Debug, Deserialize)]
struct QuotaFile {
	#[serde(default)]
	tenants: Vec<TenantQuotaFile>,
}

/// Loads the tenant registry seed file, if configured. A missing path is not
/// an error; a present path that fails to parse is, since a broken tenant
/// file silently disabling auth would be worse than refusing to start.
pub fn load_tenants(path: Option<&Path>) -> anyhow::Result<Vec<Tenant>> {
	let Some(path) = path else {
		return Ok(Vec::new());
	};
	let raw = fs_err::read_to_string(path)?;
	let file: TenantFile = serde_yaml::from_str(&raw)?;
	Ok(file.tenants)
}

/// Loads per-tenant quota limits, if configured, flattened into the
/// `(tenant, limit)` pairs `QuotaStore::new` expects.
pub fn load_quota_limits(path: Option<&Path>) -> anyhow::Result<Vec<(String, QuotaLimit)>> {
	let Some(path) = path else {
		return Ok(Vec::new());
	};
	let raw = fs_err::read_to_string(path)?;
	let file: QuotaFile = serde_yaml::from_str(&raw)?;
	Ok(file
		.tenants
		.into_iter()
		.flat_map(|t| t.limits.into_iter().map(move |limit| (t.tenant.clone(), limit)))
		.collect())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::quota::{QuotaPeriod, QuotaType};

	#[test]
	fn missing_path_yields_empty_tenants() {
		assert!(load_tenants(None).unwrap().is_empty());
	}

	#[test]
	fn missing_path_yields_empty_quota_limits() {
		assert!(load_quota_limits(None).unwrap().is_empty());
	}

	#[test]
	fn parses_tenant_file() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("tenants.yaml");
		fs_err::write(&path, "tenants:\n  - id: acme\n    name: Acme Corp\n").unwrap();
		let tenants = load_tenants(Some(&path)).unwrap();
		assert_eq!(tenants.len(), 1);
		assert_eq!(tenants[0].id, "acme");
	}

	#[test]
	fn parses_quota_file() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("quota.yaml");
		fs_err::write(
			&path,
			"tenants:\n  - tenant: acme\n    limits:\n      - quota_type: requests\n        period: daily\n        hard_limit: 1000\n        soft_limit_percent: 80\n",
		)
		.unwrap();
		let limits = load_quota_limits(Some(&path)).unwrap();
		assert_eq!(limits.len(), 1);
		assert_eq!(limits[0].0, "acme");
		assert_eq!(limits[0].1.quota_type, QuotaType::Requests);
		assert_eq!(limits[0].1.period, QuotaPeriod::Daily);
	}
}
