use std::collections::HashMap;

use parking_lot::RwLock;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A registered tenant. `name` is a display label; `id` is the namespace
/// used everywhere else in the system (mapping store keys, quota keys,
/// cache keys, audit records).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
	pub id: String,
	pub name: String,
	#[serde(default)]
	pub compliance_preset: Option<String>,
}

/// A tenant's API key, stored as a salted SHA-256 hash. The raw key is
/// never retained after issuance; `prefix` keeps enough of the key visible
/// in the management API for operators to identify which key is which.
pub struct ApiKeyRecord {
	pub tenant_id: String,
	pub key_id: String,
	pub prefix: String,
	key_hash: SecretString,
}

impl ApiKeyRecord {
	fn hash(raw_key: &str) -> String {
		let mut hasher = Sha256::new();
		hasher.update(raw_key.as_bytes());
		hex::encode(hasher.finalize())
	}

	pub fn verify(&self, raw_key: &str) -> bool {
		constant_time_eq(self.key_hash.expose_secret(), &Self::hash(raw_key))
	}
}

fn constant_time_eq(a: &str, b: &str) -> bool {
	if a.len() != b.len() {
		return false;
	}
	a.bytes().zip(b.bytes()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Generates a new `piiak_{tenant}_{random}` style API key, returning both
/// the raw key (shown to the caller exactly once) and the record to persist.
pub fn issue_key(tenant_id: &str) -> (String, ApiKeyRecord) {
	let random: String = uuid::Uuid::new_v4().simple().to_string();
	let raw_key = format!("piiak_{tenant_id}_{random}");
	let key_id = uuid::Uuid::new_v4().to_string();
	let prefix = raw_key.chars().take(12).collect::<String>();
	let record = ApiKeyRecord {
		tenant_id: tenant_id.to_string(),
		key_id,
		prefix,
		key_hash: SecretString::from(ApiKeyRecord::hash(&raw_key)),
	};
	(raw_key, record)
}

/// Parses a bearer token of the form `piiak_{tenant}_{random}` and returns
/// the tenant id it claims to belong to, without validating the key itself.
pub fn parse_claimed_tenant(raw_key: &str) -> Option<&str> {
	let rest = raw_key.strip_prefix("piiak_")?;
	let (tenant, _) = rest.rsplit_once('_')?;
	if tenant.is_empty() { None } else { Some(tenant) }
}

#[derive(Default)]
pub struct TenantRegistry {
	tenants: RwLock<HashMap<String, Tenant>>,
	keys: RwLock<HashMap<String, ApiKeyRecord>>, // key_id -> record
}

impl TenantRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn upsert_tenant(&self, tenant: Tenant) {
		self.tenants.write().insert(tenant.id.clone(), tenant);
	}

	pub fn get_tenant(&self, id: &str) -> Option<Tenant> {
		self.tenants.read().get(id).cloned()
	}

	pub fn list_tenants(&self) -> Vec<Tenant> {
		self.tenants.read().values().cloned().collect()
	}

	pub fn remove_tenant(&self, id: &str) {
		self.tenants.write().remove(id);
		self.keys.write().retain(|_, record| record.tenant_id != id);
	}

	pub fn add_key(&self, record: ApiKeyRecord) {
		self.keys.write().insert(record.key_id.clone(), record);
	}

	pub fn revoke_key(&self, key_id: &str) {
		self.keys.write().remove(key_id);
	}

	/// Authenticates a raw bearer key, returning the tenant id on success.
	pub fn authenticate(&self, raw_key: &str) -> Option<String> {
		let claimed_tenant = parse_claimed_tenant(raw_key)?;
		let guard = self.keys.read();
		guard
			.values()
			.find(|record| record.tenant_id == claimed_tenant && record.verify(raw_key))
			.map(|record| record.tenant_id.clone())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn issued_key_authenticates() {
		let registry = TenantRegistry::new();
		registry.upsert_tenant(Tenant { id: "acme".into(), name: "Acme".into(), compliance_preset: None });
		let (raw_key, record) = issue_key("acme");
		registry.add_key(record);
		assert_eq!(registry.authenticate(&raw_key), Some("acme".to_string()));
	}

	#[test]
	fn tampered_key_is_rejected() {
		let registry = TenantRegistry::new();
		let (raw_key, record) = issue_key("acme");
		registry.add_key(record);
		let tampered = format!("{raw_key}x");
		assert_eq!(registry.authenticate(&tampered), None);
	}

	#[test]
	fn revoked_key_no_longer_authenticates() {
		let registry = TenantRegistry::new();
		let (raw_key, record) = issue_key("acme");
		let key_id = record.key_id.clone();
		registry.add_key(record);
		registry.revoke_key(&key_id);
		assert_eq!(registry.authenticate(&raw_key), None);
	}
}
