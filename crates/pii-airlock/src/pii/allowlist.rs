use std::collections::HashMap;

use parking_lot::RwLock;

/// Per-tenant registry of values exempt from anonymization, e.g. a
/// company's own public support phone number. Matching is case-insensitive
/// exact match, plus a `*` wildcard entry that exempts an entire entity
/// type for a tenant.
#[derive(Default)]
pub struct Allowlist {
	// tenant -> entity_type -> lowercased exempt values (or "*" for all).
	entries: RwLock<HashMap<String, HashMap<String, Vec<String>>>>,
}

impl Allowlist {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn add(&self, tenant: &str, entity_type: &str, value: &str) {
		let mut guard = self.entries.write();
		let per_tenant = guard.entry(tenant.to_string()).or_default();
		let values = per_tenant.entry(entity_type.to_string()).or_default();
		let lowered = value.to_lowercase();
		if !values.contains(&lowered) {
			values.push(lowered);
		}
	}

	pub fn remove(&self, tenant: &str, entity_type: &str, value: &str) {
		let mut guard = self.entries.write();
		if let Some(per_tenant) = guard.get_mut(tenant)
			&& let Some(values) = per_tenant.get_mut(entity_type)
		{
			values.retain(|v| v != &value.to_lowercase());
		}
	}

	pub fn is_exempt(&self, tenant: &str, entity_type: &str, value: &str) -> bool {
		let guard = self.entries.read();
		let Some(per_tenant) = guard.get(tenant) else {
			return false;
		};
		let lowered = value.to_lowercase();
		if let Some(values) = per_tenant.get(entity_type)
			&& values.iter().any(|v| v == "*" || v == &lowered)
		{
			return true;
		}
		if let Some(values) = per_tenant.get("*")
			&& values.iter().any(|v| v == &lowered)
		{
			return true;
		}
		false
	}

	pub fn list(&self, tenant: &str) -> Vec<(String, String)> {
		let guard = self.entries.read();
		let Some(per_tenant) = guard.get(tenant) else {
			return Vec::new();
		};
		per_tenant
			.iter()
			.flat_map(|(ty, values)| values.iter().map(move |v| (ty.clone(), v.clone())))
			.collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn exact_case_insensitive_match() {
		let list = Allowlist::new();
		list.add("tenant-a", "PHONE", "400-000-0000");
		assert!(list.is_exempt("tenant-a", "PHONE", "400-000-0000"));
		assert!(!list.is_exempt("tenant-b", "PHONE", "400-000-0000"));
	}

	#[test]
	fn wildcard_exempts_entity_type() {
		let list = Allowlist::new();
		list.add("tenant-a", "ORGANIZATION", "*");
		assert!(list.is_exempt("tenant-a", "ORGANIZATION", "Acme Corp"));
	}

	#[test]
	fn remove_clears_entry() {
		let list = Allowlist::new();
		list.add("tenant-a", "PHONE", "123");
		list.remove("tenant-a", "PHONE", "123");
		assert!(!list.is_exempt("tenant-a", "PHONE", "123"));
	}
}
