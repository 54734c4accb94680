use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;

use crate::error::AirlockError;
use crate::server::ServerState;

const TENANT_HEADER: &str = "x-tenant-id";

/// Paths that always require authentication even when `secure_endpoints` is
/// disabled for the public proxy surface — operational/debug surfaces must
/// never be reachable anonymously.
const SENSITIVE_PREFIXES: &[&str] = &["/ui", "/debug", "/admin", "/metrics", "/api/test"];

fn is_sensitive_path(path: &str) -> bool {
	SENSITIVE_PREFIXES.iter().any(|prefix| path.starts_with(prefix))
}

/// Resolves the tenant for an inbound request: parses the `Authorization:
/// Bearer piiak_{tenant}_{random}` header and verifies it against the
/// tenant registry, optionally falling back to an `X-Tenant-Id` header when
/// multi-tenancy is enabled but header-based tenant selection is explicitly
/// allowed (e.g. for trusted internal callers behind another auth layer).
/// The resolved tenant id is stashed in request extensions for downstream
/// extractors.
pub async fn require_tenant(State(state): State<ServerState>, mut request: Request, next: Next) -> Result<Response, AirlockError> {
	let path = request.uri().path().to_string();
	let sensitive = is_sensitive_path(&path);
	let tenant = authenticate(&state, request.headers(), sensitive)?;
	request.extensions_mut().insert(TenantId(tenant));
	Ok(next.run(request).await)
}

/// The tenant id resolved by [`require_tenant`], retrievable downstream via
/// `Extension<TenantId>`.
#[derive(Debug, Clone)]
pub struct TenantId(pub String);

fn authenticate(state: &ServerState, headers: &HeaderMap, sensitive: bool) -> Result<String, AirlockError> {
	if !state.config.secure_endpoints && !sensitive {
		if state.config.multi_tenant_enabled
			&& state.config.allow_header_tenant
			&& let Some(header_tenant) = headers.get(TENANT_HEADER).and_then(|v| v.to_str().ok())
		{
			return Ok(header_tenant.to_string());
		}
		return Ok(state.config.default_tenant.clone());
	}

	let Some(auth_header) = headers.get(axum::http::header::AUTHORIZATION).and_then(|v| v.to_str().ok()) else {
		return Err(AirlockError::Auth);
	};
	let Some(raw_key) = auth_header.strip_prefix("Bearer ") else {
		return Err(AirlockError::Auth);
	};

	match state.tenants.authenticate(raw_key) {
		Some(tenant_id) => Ok(tenant_id),
		None => Err(AirlockError::Auth),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn sensitive_paths_require_auth_regardless_of_secure_endpoints() {
		assert!(is_sensitive_path("/admin/tenants"));
		assert!(is_sensitive_path("/metrics"));
		assert!(!is_sensitive_path("/v1/chat/completions"));
	}
}
