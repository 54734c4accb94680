use chrono::{DateTime, Datelike, Utc};
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuotaPeriod {
	Hourly,
	Daily,
	Monthly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuotaType {
	Requests,
	Tokens,
}

/// A configured hard limit for one `(type, period)` pair, with a soft
/// warning threshold derived as a percentage of the hard limit.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct QuotaLimit {
	pub quota_type: QuotaType,
	pub period: QuotaPeriod,
	pub hard_limit: u64,
	pub soft_limit_percent: u8,
}

impl QuotaLimit {
	pub fn soft_limit(&self) -> u64 {
		(self.hard_limit as f64 * self.soft_limit_percent as f64 / 100.0).floor() as u64
	}
}

#[derive(Debug, Clone)]
pub struct QuotaConfig {
	pub limits: Vec<QuotaLimit>,
}

/// Rolling/calendar-window usage counter for one tenant/type/period.
#[derive(Debug, Clone)]
pub struct QuotaUsage {
	pub count: u64,
	pub window_start: DateTime<Utc>,
	pub window_end: DateTime<Utc>,
}

impl QuotaUsage {
	pub fn new(period: QuotaPeriod, now: DateTime<Utc>) -> Self {
		Self {
			count: 0,
			window_start: now,
			window_end: Self::calculate_window_end(period, now),
		}
	}

	pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
		now >= self.window_end
	}

	pub fn reset(&mut self, period: QuotaPeriod, now: DateTime<Utc>) {
		self.count = 0;
		self.window_start = now;
		self.window_end = Self::calculate_window_end(period, now);
	}

	/// Hourly windows roll forward from the moment usage starts. Daily and
	/// monthly windows are calendar-aligned to UTC midnight / UTC month end,
	/// so two tenants starting at different times of day still reset
	/// together at the same wall-clock boundary.
	fn calculate_window_end(period: QuotaPeriod, now: DateTime<Utc>) -> DateTime<Utc> {
		match period {
			QuotaPeriod::Hourly => now + chrono::Duration::seconds(3600),
			QuotaPeriod::Daily => {
				let next_midnight = (now.date_naive() + chrono::Duration::days(1))
					.and_hms_opt(0, 0, 0)
					.expect("valid midnight");
				DateTime::from_naive_utc_and_offset(next_midnight, Utc)
			},
			QuotaPeriod::Monthly => {
				let (year, month) = if now.month() == 12 { (now.year() + 1, 1) } else { (now.year(), now.month() + 1) };
				let next_month_start = chrono::NaiveDate::from_ymd_opt(year, month, 1)
					.expect("valid date")
					.and_hms_opt(0, 0, 0)
					.expect("valid midnight");
				DateTime::from_naive_utc_and_offset(next_month_start, Utc)
			},
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaCheck {
	Allowed,
	SoftLimitExceeded,
	HardLimitExceeded,
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::TimeZone;

	#[test]
	fn daily_window_ends_at_next_utc_midnight() {
		let now = Utc.with_ymd_and_hms(2026, 7, 27, 15, 30, 0).unwrap();
		let usage = QuotaUsage::new(QuotaPeriod::Daily, now);
		assert_eq!(usage.window_end, Utc.with_ymd_and_hms(2026, 7, 28, 0, 0, 0).unwrap());
	}

	#[test]
	fn monthly_window_ends_at_next_month_start() {
		let now = Utc.with_ymd_and_hms(2026, 7, 27, 15, 30, 0).unwrap();
		let usage = QuotaUsage::new(QuotaPeriod::Monthly, now);
		assert_eq!(usage.window_end, Utc.with_ymd_and_hms(2026, 8, 1, 0, 0, 0).unwrap());
	}

	#[test]
	fn monthly_window_wraps_year_at_december() {
		let now = Utc.with_ymd_and_hms(2026, 12, 15, 0, 0, 0).unwrap();
		let usage = QuotaUsage::new(QuotaPeriod::Monthly, now);
		assert_eq!(usage.window_end, Utc.with_ymd_and_hms(2027, 1, 1, 0, 0, 0).unwrap());
	}

	#[test]
	fn soft_limit_is_percentage_of_hard_limit() {
		let limit = QuotaLimit { quota_type: QuotaType::Requests, period: QuotaPeriod::Daily, hard_limit: 1000, soft_limit_percent: 80 };
		assert_eq!(limit.soft_limit(), 800);
	}
}
