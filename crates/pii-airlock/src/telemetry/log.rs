use tracing::Span;

/// Opens the per-request span carrying the fields every downstream log line
/// in the pipeline should inherit: request id, tenant, and model. Call once
/// at the top of the request handler and `.enter()`/`.in_scope()` it around
/// the rest of the pipeline.
pub fn request_span(request_id: &str, tenant_id: &str, model: &str) -> Span {
	tracing::info_span!(
		"pii_airlock_request",
		request_id = %request_id,
		tenant_id = %tenant_id,
		model = %model,
	)
}
