use futures::Stream;
use futures_util::StreamExt;

use crate::error::{AirlockError, Result};
use crate::pii::anonymizer::Anonymizer;
use crate::pii::deanonymizer;
use crate::pii::fuzzy;
use crate::pii::mapping::RequestMapping;
use crate::quota::{QuotaCheck, QuotaPeriod, QuotaType};
use crate::secrets::scanner;
use crate::server::ServerState;
use crate::stream::buffer::StreamBuffer;
use crate::types::{ChatCompletionChunk, ChatCompletionRequest};

use super::RequestContext;

/// Open Question resolved: streaming responses bypass the response cache
/// entirely. The cache fingerprints a full response body; reconstructing
/// that from a partial SSE stream mid-flight would require buffering the
/// whole stream anyway, defeating the purpose of streaming. A future
/// revision could cache the fully-assembled text after the stream
/// completes, but that is out of scope here.
pub async fn handle(
	state: ServerState,
	ctx: RequestContext,
	mut request: ChatCompletionRequest,
) -> Result<impl Stream<Item = Result<String>> + Send + use<>> {
	// Reserved atomically at admission, before the upstream stream opens, so
	// concurrent requests can't all pass a separate check before either
	// records its usage.
	match state.quota.check_and_reserve(&ctx.tenant_id, QuotaType::Requests, QuotaPeriod::Daily, 1) {
		QuotaCheck::HardLimitExceeded => return Err(AirlockError::QuotaExceeded),
		_ => {},
	}

	for message in &request.messages {
		if let Some(text) = message.content_str() {
			let scan = scanner::scan(text);
			if scan.exceeds(state.config.secret_block_threshold) {
				return Err(AirlockError::SecretDetected);
			}
		}
	}

	let anonymizer = Anonymizer::for_tenant(&state.config, state.allowlist.clone(), &state.compliance, &ctx.tenant_id);
	let outcome = anonymizer.anonymize(&ctx.tenant_id, &ctx.session_id, &ctx.session_salt, 0, &request.messages);
	request.messages = outcome.messages;
	let mapping = outcome.mapping;

	// The mapping has to outlive the whole stream, not just this request's
	// initial TTL window, so extend it before the first byte is sent.
	state.mapping_store.save(&ctx.tenant_id, &ctx.request_id, mapping.clone());

	let upstream_stream = open_upstream_stream(&state, &request).await?;

	Ok(deanonymize_stream(state, ctx, mapping, upstream_stream))
}

async fn open_upstream_stream(
	state: &ServerState,
	request: &ChatCompletionRequest,
) -> Result<impl Stream<Item = Result<String>> + Send + use<>> {
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

	let byte_stream = response.bytes_stream();
	Ok(byte_stream.map(|chunk| {
		chunk
			.map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
			.map_err(|e| AirlockError::UpstreamTransport(e.to_string()))
	}))
}

/// Wraps the raw upstream SSE byte stream with the placeholder-safe
/// [`StreamBuffer`] and de-anonymization, chunk by chunk.
fn deanonymize_stream(
	state: ServerState,
	ctx: RequestContext,
	mapping: RequestMapping,
	upstream: impl Stream<Item = Result<String>> + Send,
) -> impl Stream<Item = Result<String>> + Send {
	async_stream::stream! {
		let mut buffer = StreamBuffer::new();
		tokio::pin!(upstream);

		while let Some(chunk) = upstream.next().await {
			let chunk = match chunk {
				Ok(c) => c,
				Err(e) => {
					yield Err(e);
					continue;
				}
			};
			let safe = buffer.process_chunk(&chunk);
			if !safe.is_empty() {
				yield Ok(restore_text(&state, &mapping, &safe));
			}
		}

		let remainder = buffer.flush();
		if !remainder.is_empty() {
			yield Ok(restore_text(&state, &mapping, &remainder));
		}

		state.mapping_store.delete(&ctx.tenant_id, &ctx.request_id);
	}
}

fn restore_text(state: &ServerState, mapping: &RequestMapping, text: &str) -> String {
	if state.config.fuzzy_deanonymize {
		fuzzy::fuzzy_deanonymize(text, mapping, state.config.fuzzy_confidence_threshold)
	} else {
		deanonymizer::deanonymize(text, mapping)
	}
}

/// Parses one SSE `data:` line into a [`ChatCompletionChunk`], used by
/// callers that need structured access rather than the raw safe-text
/// stream above (e.g. to detect `finish_reason` for audit bookkeeping).
pub fn parse_chunk(data_line: &str) -> Option<ChatCompletionChunk> {
	let payload = data_line.strip_prefix("data: ").unwrap_or(data_line).trim();
	if payload == "[DONE]" || payload.is_empty() {
		return None;
	}
	serde_json::from_str(payload).ok()
}
