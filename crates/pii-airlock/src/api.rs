use axum::extract::{Extension, State};
use axum::middleware;
use axum::response::sse::{Event, Sse};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use futures_util::StreamExt;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::Result;
use crate::http::auth::{require_tenant, TenantId};
use crate::management;
use crate::proxy::{streaming, unary, RequestContext};
use crate::server::ServerState;
use crate::types::{ChatCompletionRequest, ModelInfo, ModelList};

/// Builds the full HTTP surface: public proxy endpoints, the management
/// API, and operational endpoints (health/metrics), wired with the tenant
/// auth middleware and standard CORS/tracing layers.
pub fn router(state: ServerState) -> Router {
	let public = Router::new()
		.route("/v1/chat/completions", post(chat_completions))
		.route("/v1/models", get(list_models))
		.merge(management::router())
		.route_layer(middleware::from_fn_with_state(state.clone(), require_tenant));

	let operational = Router::new()
		.route("/healthz", get(healthz))
		.route("/livez", get(livez))
		.route("/readyz", get(readyz))
		.route("/metrics", get(metrics));

	Router::new()
		.merge(public)
		.merge(operational)
		.layer(TraceLayer::new_for_http())
		.layer(CorsLayer::permissive())
		.with_state(state)
}

async fn chat_completions(
	State(state): State<ServerState>,
	Extension(tenant): Extension<TenantId>,
	Json(request): Json<ChatCompletionRequest>,
) -> Result<axum::response::Response> {
	let ctx = RequestContext::new(tenant.0);

	if request.is_streaming() {
		let stream = streaming::handle(state, ctx, request).await?;
		let sse_stream = stream.map(|chunk| match chunk {
			Ok(text) => Ok::<_, std::convert::Infallible>(Event::default().data(text)),
			Err(err) => Ok(Event::default().event("error").data(err.to_string())),
		});
		Ok(Sse::new(sse_stream).into_response())
	} else {
		let response = unary::handle(&state, &ctx, request).await?;
		Ok(Json(response).into_response())
	}
}

async fn list_models(State(_state): State<ServerState>) -> Json<ModelList> {
	Json(ModelList {
		object: "list",
		data: vec![ModelInfo { id: "gpt-4".to_string(), object: "model", owned_by: "pii-airlock".to_string() }],
	})
}

async fn healthz() -> &'static str {
	"ok"
}

async fn livez() -> &'static str {
	"ok"
}

async fn readyz(State(_state): State<ServerState>) -> &'static str {
	"ok"
}

async fn metrics(State(state): State<ServerState>) -> String {
	state.metrics.encode()
}
