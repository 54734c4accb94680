mod common;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// The upstream model is free to mangle a placeholder's punctuation; as long
/// as the entity type and index survive, the original value is still
/// restored on the way back to the client.
#[tokio::test]
async fn restores_placeholder_corrupted_by_upstream() {
	let upstream = MockServer::start().await;
	Mock::given(method("POST"))
		.and(path("/v1/chat/completions"))
		.respond_with(move |req: &wiremock::Request| {
			let body: serde_json::Value = req.body_json().unwrap();
			let sent = body["messages"][0]["content"].as_str().unwrap().to_string();
			// Pull the placeholder the anonymizer generated for the phone
			// number back out, then mangle it the way an LLM sometimes does:
			// square brackets instead of angle brackets.
			let mangled = sent.replace('<', "[").replace('>', "]");
			ResponseTemplate::new(200).set_body_json(json!({
				"id": "cmpl-1", "object": "chat.completion", "created": 0, "model": "gpt-4",
				"choices": [{"index": 0, "message": {"role": "assistant", "content": format!("Noted: {mangled}")}, "finish_reason": "stop"}],
				"usage": {"prompt_tokens": 1, "completion_tokens": 1, "total_tokens": 2},
			}))
		})
		.mount(&upstream)
		.await;

	let mut config = common::test_config();
	config.upstream_base_url = upstream.uri();
	config.fuzzy_deanonymize = true;
	let base_url = common::spawn_app(config).await;

	let client = reqwest::Client::new();
	let response = client
		.post(format!("{base_url}/v1/chat/completions"))
		.json(&json!({"model": "gpt-4", "messages": [{"role": "user", "content": "call 13812345678 please"}]}))
		.send()
		.await
		.expect("request should succeed");

	assert_eq!(response.status(), 200);
	let body: serde_json::Value = response.json().await.unwrap();
	let content = body["choices"][0]["message"]["content"].as_str().unwrap();
	assert!(content.contains("13812345678"), "expected restored phone number, got: {content}");
}

/// With `secure_endpoints` on, both proxy and management routes require a
/// valid tenant bearer key; unauthenticated calls are rejected, and the
/// operational health endpoint stays open regardless.
#[tokio::test]
async fn secure_mode_requires_a_valid_tenant_key() {
	let mut config = common::test_config();
	config.secure_endpoints = true;
	let (base_url, state) = common::spawn_app_with_state(config).await;

	state.tenants.upsert_tenant(pii_airlock::tenant::Tenant {
		id: "acme".to_string(),
		name: "Acme".to_string(),
		compliance_preset: None,
	});
	let (raw_key, record) = pii_airlock::tenant::issue_key("acme");
	state.tenants.add_key(record);

	let client = reqwest::Client::new();

	let unauthenticated = client.get(format!("{base_url}/api/v1/tenants")).send().await.unwrap();
	assert_eq!(unauthenticated.status(), 401);

	let healthz = client.get(format!("{base_url}/healthz")).send().await.unwrap();
	assert_eq!(healthz.status(), 200);

	let authenticated = client
		.get(format!("{base_url}/api/v1/tenants"))
		.bearer_auth(&raw_key)
		.send()
		.await
		.unwrap();
	assert_eq!(authenticated.status(), 200);
}
