pub mod streaming;
pub mod unary;

use crate::types::ChatCompletionRequest;

/// Per-request context threaded through the anonymize -> upstream ->
/// de-anonymize pipeline.
pub struct RequestContext {
	pub request_id: String,
	pub tenant_id: String,
	pub session_id: String,
	pub session_salt: String,
}

impl RequestContext {
	pub fn new(tenant_id: String) -> Self {
		let request_id = uuid::Uuid::new_v4().to_string();
		let session_id = request_id.clone();
		let session_salt = uuid::Uuid::new_v4().to_string();
		Self { request_id, tenant_id, session_id, session_salt }
	}
}

pub(crate) fn request_fingerprint_messages(request: &ChatCompletionRequest) -> String {
	serde_json::to_string(&request.messages).unwrap_or_default()
}
