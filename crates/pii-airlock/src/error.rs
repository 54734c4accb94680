use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Errors surfaced to HTTP clients. Every variant maps to exactly one status
/// code; the client body is always `{error: {message, type, code}}`. Internal
/// detail (the raw secret match, the upstream body) never reaches `message`.
#[derive(thiserror::Error, Debug)]
pub enum AirlockError {
	#[error("missing or invalid API key")]
	Auth,

	#[error("this endpoint requires authentication")]
	Authorization,

	#[error("quota exceeded")]
	QuotaExceeded,

	#[error("request blocked: sensitive content detected")]
	SecretDetected,

	#[error("upstream returned {0}")]
	UpstreamHttp(StatusCode),

	#[error("upstream request failed: {0}")]
	UpstreamTransport(String),

	#[error("request mapping expired")]
	MappingExpired,

	#[error("invalid request: {0}")]
	Validation(String),

	#[error("internal error")]
	Internal(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorBody {
	error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
	message: String,
	#[serde(rename = "type")]
	kind: &'static str,
	code: u16,
}

impl AirlockError {
	fn kind(&self) -> &'static str {
		match self {
			AirlockError::Auth => "auth_error",
			AirlockError::Authorization => "authorization_error",
			AirlockError::QuotaExceeded => "quota_exceeded",
			AirlockError::SecretDetected => "secret_detected",
			AirlockError::UpstreamHttp(_) => "upstream_http_error",
			AirlockError::UpstreamTransport(_) => "upstream_transport_error",
			AirlockError::MappingExpired => "mapping_expired",
			AirlockError::Validation(_) => "validation_error",
			AirlockError::Internal(_) => "internal_error",
		}
	}

	fn status(&self) -> StatusCode {
		match self {
			AirlockError::Auth | AirlockError::Authorization => StatusCode::UNAUTHORIZED,
			AirlockError::QuotaExceeded => StatusCode::TOO_MANY_REQUESTS,
			AirlockError::SecretDetected => StatusCode::BAD_REQUEST,
			AirlockError::UpstreamHttp(s) => *s,
			AirlockError::UpstreamTransport(_) => StatusCode::BAD_GATEWAY,
			AirlockError::MappingExpired => StatusCode::INTERNAL_SERVER_ERROR,
			AirlockError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
			AirlockError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}

	/// Client-safe message. `SecretDetected` and `Internal` never echo
	/// caller-controlled or sensitive detail.
	fn message(&self) -> String {
		match self {
			AirlockError::SecretDetected => "request blocked: sensitive content detected".to_string(),
			AirlockError::Internal(_) => "internal error".to_string(),
			other => other.to_string(),
		}
	}
}

impl IntoResponse for AirlockError {
	fn into_response(self) -> Response {
		let status = self.status();
		let body = ErrorBody {
			error: ErrorDetail {
				message: self.message(),
				kind: self.kind(),
				code: status.as_u16(),
			},
		};
		(status, Json(body)).into_response()
	}
}

pub type Result<T> = std::result::Result<T, AirlockError>;
