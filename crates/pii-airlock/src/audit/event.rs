use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventKind {
	RequestAnonymized,
	ResponseDeanonymized,
	SecretBlocked,
	QuotaDenied,
	QuotaWarning,
	CacheHit,
	AuthFailure,
}

/// One append-only audit record. Never carries raw PII or secret values,
/// only counts and classifications, so the audit log itself cannot become a
/// new leak vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
	pub event_id: String,
	pub timestamp: chrono::DateTime<chrono::Utc>,
	pub tenant_id: String,
	pub request_id: String,
	pub kind: AuditEventKind,
	pub model: Option<String>,
	pub entities_anonymized: u32,
	pub detail: Option<String>,
}
