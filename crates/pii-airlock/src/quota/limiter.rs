use parking_lot::Mutex;
use std::collections::HashMap;

use super::types::{QuotaCheck, QuotaLimit, QuotaPeriod, QuotaType, QuotaUsage};

/// Tenant quota tracker. Usage is keyed `"{tenant}:{type:?}:{period:?}"` and
/// protected by a single mutex, mirroring the coarse-grained locking the
/// reference implementation uses for its quota store.
pub struct QuotaStore {
	usage: Mutex<HashMap<String, QuotaUsage>>,
	limits: HashMap<String, QuotaLimit>,
}

impl QuotaStore {
	pub fn new(tenant_limits: Vec<(String, QuotaLimit)>) -> Self {
		let mut limits = HashMap::new();
		for (tenant, limit) in tenant_limits {
			limits.insert(Self::limit_key(&tenant, limit.quota_type, limit.period), limit);
		}
		Self { usage: Mutex::new(HashMap::new()), limits }
	}

	fn limit_key(tenant: &str, quota_type: QuotaType, period: QuotaPeriod) -> String {
		format!("{tenant}:{quota_type:?}:{period:?}")
	}

	fn limit_for(&self, tenant: &str, quota_type: QuotaType, period: QuotaPeriod) -> Option<&QuotaLimit> {
		self.limits.get(&Self::limit_key(tenant, quota_type, period))
	}

	/// Reads current usage for `(tenant, type, period)`, auto-resetting the
	/// window if it has expired since the last check.
	fn usage_for(&self, tenant: &str, quota_type: QuotaType, period: QuotaPeriod, now: chrono::DateTime<chrono::Utc>) -> QuotaUsage {
		let key = Self::limit_key(tenant, quota_type, period);
		let mut guard = self.usage.lock();
		let entry = guard.entry(key).or_insert_with(|| QuotaUsage::new(period, now));
		if entry.is_expired(now) {
			entry.reset(period, now);
		}
		entry.clone()
	}

	/// Checks whether `amount` more usage would stay within limits, without
	/// recording it. Tenants with no configured limit for this
	/// `(type, period)` pair are always allowed.
	pub fn check(&self, tenant: &str, quota_type: QuotaType, period: QuotaPeriod, amount: u64) -> QuotaCheck {
		let Some(limit) = self.limit_for(tenant, quota_type, period) else {
			return QuotaCheck::Allowed;
		};
		let now = chrono::Utc::now();
		let usage = self.usage_for(tenant, quota_type, period, now);
		let projected = usage.count + amount;
		if projected > limit.hard_limit {
			QuotaCheck::HardLimitExceeded
		} else if projected > limit.soft_limit() {
			QuotaCheck::SoftLimitExceeded
		} else {
			QuotaCheck::Allowed
		}
	}

	/// Atomically checks and records `amount` units of usage in one critical
	/// section, so two concurrent callers can never both pass the check
	/// before either one's usage is recorded. Usage is only recorded when
	/// the result is not [`QuotaCheck::HardLimitExceeded`].
	pub fn check_and_reserve(&self, tenant: &str, quota_type: QuotaType, period: QuotaPeriod, amount: u64) -> QuotaCheck {
		let Some(limit) = self.limit_for(tenant, quota_type, period) else {
			return QuotaCheck::Allowed;
		};
		let now = chrono::Utc::now();
		let key = Self::limit_key(tenant, quota_type, period);
		let mut guard = self.usage.lock();
		let entry = guard.entry(key).or_insert_with(|| QuotaUsage::new(period, now));
		if entry.is_expired(now) {
			entry.reset(period, now);
		}
		let projected = entry.count + amount;
		if projected > limit.hard_limit {
			return QuotaCheck::HardLimitExceeded;
		}
		entry.count = projected;
		if projected > limit.soft_limit() {
			QuotaCheck::SoftLimitExceeded
		} else {
			QuotaCheck::Allowed
		}
	}

	/// Records `amount` units of usage against the current window.
	pub fn record(&self, tenant: &str, quota_type: QuotaType, period: QuotaPeriod, amount: u64) {
		let now = chrono::Utc::now();
		let key = Self::limit_key(tenant, quota_type, period);
		let mut guard = self.usage.lock();
		let entry = guard.entry(key).or_insert_with(|| QuotaUsage::new(period, now));
		if entry.is_expired(now) {
			entry.reset(period, now);
		}
		entry.count += amount;
	}

	pub fn usage_snapshot(&self, tenant: &str) -> Vec<((QuotaType, QuotaPeriod), QuotaUsage)> {
		let guard = self.usage.lock();
		let prefix = format!("{tenant}:");
		guard
			.iter()
			.filter(|(k, _)| k.starts_with(&prefix))
			.filter_map(|(k, v)| {
				let rest = k.strip_prefix(&prefix)?;
				let mut parts = rest.splitn(2, ':');
				let ty = match parts.next()? {
					"Requests" => QuotaType::Requests,
					"Tokens" => QuotaType::Tokens,
					_ => return None,
				};
				let period = match parts.next()? {
					"Hourly" => QuotaPeriod::Hourly,
					"Daily" => QuotaPeriod::Daily,
					"Monthly" => QuotaPeriod::Monthly,
					_ => return None,
				};
				Some(((ty, period), v.clone()))
			})
			.collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn store_with_limit(hard: u64, soft_pct: u8) -> QuotaStore {
		QuotaStore::new(vec![(
			"tenant-a".to_string(),
			QuotaLimit { quota_type: QuotaType::Requests, period: QuotaPeriod::Daily, hard_limit: hard, soft_limit_percent: soft_pct },
		)])
	}

	#[test]
	fn unlimited_tenant_always_allowed() {
		let store = store_with_limit(10, 80);
		assert_eq!(store.check("tenant-z", QuotaType::Requests, QuotaPeriod::Daily, 1), QuotaCheck::Allowed);
	}

	#[test]
	fn within_soft_limit_is_allowed() {
		let store = store_with_limit(10, 80);
		assert_eq!(store.check("tenant-a", QuotaType::Requests, QuotaPeriod::Daily, 5), QuotaCheck::Allowed);
	}

	#[test]
	fn crossing_soft_limit_warns() {
		let store = store_with_limit(10, 80);
		store.record("tenant-a", QuotaType::Requests, QuotaPeriod::Daily, 8);
		assert_eq!(store.check("tenant-a", QuotaType::Requests, QuotaPeriod::Daily, 1), QuotaCheck::SoftLimitExceeded);
	}

	#[test]
	fn crossing_hard_limit_denies() {
		let store = store_with_limit(10, 80);
		store.record("tenant-a", QuotaType::Requests, QuotaPeriod::Daily, 10);
		assert_eq!(store.check("tenant-a", QuotaType::Requests, QuotaPeriod::Daily, 1), QuotaCheck::HardLimitExceeded);
	}

	#[test]
	fn check_and_reserve_records_usage_when_allowed() {
		let store = store_with_limit(10, 80);
		assert_eq!(store.check_and_reserve("tenant-a", QuotaType::Requests, QuotaPeriod::Daily, 1), QuotaCheck::Allowed);
		assert_eq!(store.check("tenant-a", QuotaType::Requests, QuotaPeriod::Daily, 0), QuotaCheck::Allowed);
		let (_, usage) = store
			.usage_snapshot("tenant-a")
			.into_iter()
			.find(|((ty, period), _)| *ty == QuotaType::Requests && *period == QuotaPeriod::Daily)
			.unwrap();
		assert_eq!(usage.count, 1);
	}

	#[test]
	fn check_and_reserve_does_not_record_past_hard_limit() {
		let store = store_with_limit(10, 80);
		store.record("tenant-a", QuotaType::Requests, QuotaPeriod::Daily, 10);
		assert_eq!(store.check_and_reserve("tenant-a", QuotaType::Requests, QuotaPeriod::Daily, 1), QuotaCheck::HardLimitExceeded);
		let (_, usage) = store
			.usage_snapshot("tenant-a")
			.into_iter()
			.find(|((ty, period), _)| *ty == QuotaType::Requests && *period == QuotaPeriod::Daily)
			.unwrap();
		assert_eq!(usage.count, 10);
	}

	#[test]
	fn check_and_reserve_is_atomic_under_concurrent_admission() {
		let store = std::sync::Arc::new(store_with_limit(5, 100));
		let results: Vec<QuotaCheck> = std::thread::scope(|scope| {
			let handles: Vec<_> = (0..10)
				.map(|_| {
					let store = store.clone();
					scope.spawn(move || store.check_and_reserve("tenant-a", QuotaType::Requests, QuotaPeriod::Daily, 1))
				})
				.collect();
			handles.into_iter().map(|h| h.join().unwrap()).collect()
		});
		let allowed = results.iter().filter(|r| **r == QuotaCheck::Allowed).count();
		assert_eq!(allowed, 5);
		let (_, usage) = store
			.usage_snapshot("tenant-a")
			.into_iter()
			.find(|((ty, period), _)| *ty == QuotaType::Requests && *period == QuotaPeriod::Daily)
			.unwrap();
		assert_eq!(usage.count, 5);
	}
}
