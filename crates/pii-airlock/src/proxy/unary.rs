use crate::cache::CacheKeyInput;
use crate::error::{AirlockError, Result};
use crate::pii::anonymizer::Anonymizer;
use crate::pii::deanonymizer;
use crate::pii::fuzzy;
use crate::quota::{QuotaCheck, QuotaPeriod, QuotaType};
use crate::secrets::scanner;
use crate::server::ServerState;
use crate::types::ChatCompletionRequest;

use super::{request_fingerprint_messages, RequestContext};

/// Runs one non-streaming chat completion through the full pipeline:
/// quota reserve -> secret scan -> anonymize -> cache lookup -> upstream call
/// -> de-anonymize -> cache store -> token quota record -> audit.
pub async fn handle(state: &ServerState, ctx: &RequestContext, mut request: ChatCompletionRequest) -> Result<crate::types::ChatCompletionResponse> {
	// Request quota is reserved atomically here, before any cache lookup or
	// upstream call, so a cache hit still counts against it and concurrent
	// requests can't all pass a separate check before any of them records.
	reserve_quota(state, &ctx.tenant_id, QuotaType::Requests, 1)?;

	for message in &request.messages {
		if let Some(text) = message.content_str() {
			let scan = scanner::scan(text);
			if scan.exceeds(state.config.secret_block_threshold) {
				record_audit(
					state,
					ctx,
					crate::audit::AuditEventKind::SecretBlocked,
					Some(&request.model),
					0,
				)
				.await;
				return Err(AirlockError::SecretDetected);
			}
		}
	}

	let allowlist = state.allowlist.clone();
	let anonymizer = Anonymizer::for_tenant(&state.config, allowlist, &state.compliance, &ctx.tenant_id);
	let outcome = anonymizer.anonymize(&ctx.tenant_id, &ctx.session_id, &ctx.session_salt, 0, &request.messages);
	request.messages = outcome.messages;
	let mapping = outcome.mapping;

	let cache_key = CacheKeyInput {
		tenant: &ctx.tenant_id,
		model: &request.model,
		anonymized_messages_json: &request_fingerprint_messages(&request),
		temperature: request.temperature,
		top_p: request.top_p,
		max_tokens: request.max_tokens,
		presence_penalty: request.presence_penalty,
		frequency_penalty: request.frequency_penalty,
	};

	if let Some(mut cached) = state.cache.get(&cache_key) {
		restore_response(state, &mapping, &mut cached);
		record_audit(state, ctx, crate::audit::AuditEventKind::CacheHit, Some(&request.model), mapping.len() as u32).await;
		return Ok(cached);
	}

	let mut response = call_upstream(state, &request).await?;

	state.cache.put(&cache_key, response.clone());
	restore_response(state, &mapping, &mut response);

	enforce_quota(state, &ctx.tenant_id, QuotaType::Tokens, response.usage.total_tokens)?;
	state.quota.record(&ctx.tenant_id, QuotaType::Tokens, QuotaPeriod::Daily, response.usage.total_tokens);

	record_audit(
		state,
		ctx,
		crate::audit::AuditEventKind::ResponseDeanonymized,
		Some(&request.model),
		mapping.len() as u32,
	)
	.await;

	Ok(response)
}

fn restore_response(state: &ServerState, mapping: &crate::pii::mapping::RequestMapping, response: &mut crate::types::ChatCompletionResponse) {
	for choice in &mut response.choices {
		if let Some(content) = choice.message.content_str() {
			let restored = if state.config.fuzzy_deanonymize {
				fuzzy::fuzzy_deanonymize(content, mapping, state.config.fuzzy_confidence_threshold)
			} else {
				deanonymizer::deanonymize(content, mapping)
			};
			choice.message.content = serde_json::Value::String(restored);
		}
	}
}

fn enforce_quota(state: &ServerState, tenant: &str, quota_type: QuotaType, amount: u64) -> Result<()> {
	match state.quota.check(tenant, quota_type, QuotaPeriod::Daily, amount) {
		QuotaCheck::HardLimitExceeded => Err(AirlockError::QuotaExceeded),
		QuotaCheck::SoftLimitExceeded | QuotaCheck::Allowed => Ok(()),
	}
}

/// Atomically checks and records quota usage at admission, so the
/// reservation is in effect before any cache lookup or upstream call.
fn reserve_quota(state: &ServerState, tenant: &str, quota_type: QuotaType, amount: u64) -> Result<()> {
	match state.quota.check_and_reserve(tenant, quota_type, QuotaPeriod::Daily, amount) {
		QuotaCheck::HardLimitExceeded => Err(AirlockError::QuotaExceeded),
		QuotaCheck::SoftLimitExceeded | QuotaCheck::Allowed => Ok(()),
	}
}

async fn call_upstream(state: &ServerState, request: &ChatCompletionRequest) -> Result<crate::types::ChatCompletionResponse> {
	let url = format!("{}/v1/chat/completions", state.config.upstream_base_url.trim_end_matches('/'));
	let response = state
		.upstream
		.post(url)
		.json(request)
		.send()
		.await
		.map_err(|e| AirlockError::UpstreamTransport(e.to_string()))?;

	if !response.status().is_success() {
		return Err(AirlockError::UpstreamHttp(response.status()));
	}

	response
		.json::<crate::types::ChatCompletionResponse>()
		.await
		.map_err(|e| AirlockError::UpstreamTransport(e.to_string()))
}

async fn record_audit(state: &ServerState, ctx: &RequestContext, kind: crate::audit::AuditEventKind, model: Option<&str>, entities: u32) {
	state
		.audit
		.record(crate::audit::AuditEvent {
			event_id: uuid::Uuid::new_v4().to_string(),
			timestamp: chrono::Utc::now(),
			tenant_id: ctx.tenant_id.clone(),
			request_id: ctx.request_id.clone(),
			kind,
			model: model.map(str::to_string),
			entities_anonymized: entities,
			detail: None,
		})
		.await;
}
