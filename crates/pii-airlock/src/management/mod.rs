use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::Router;
use serde::{Deserialize, Serialize};

use crate::compliance::CompliancePreset;
use crate::error::{AirlockError, Result};
use crate::server::ServerState;
use crate::tenant::Tenant;

pub fn router() -> Router<ServerState> {
	Router::new()
		.route("/api/v1/tenants", get(list_tenants).post(create_tenant))
		.route("/api/v1/tenants/{id}", delete(remove_tenant))
		.route("/api/v1/tenants/{id}/keys", post(issue_key))
		.route("/api/v1/keys/{key_id}", delete(revoke_key))
		.route("/api/v1/quota/usage/{tenant}", get(quota_usage))
		.route("/api/v1/cache/stats", get(cache_stats))
		.route("/api/v1/allowlist/{tenant}", get(list_allowlist).post(add_allowlist))
		.route("/api/v1/audit/{tenant}", get(recent_audit))
		.route("/api/v1/compliance/presets", get(list_compliance_presets))
		.route("/api/v1/compliance/status/{tenant}", get(compliance_status))
		.route("/api/v1/compliance/activate/{tenant}", post(activate_compliance_preset))
		.route("/api/v1/compliance/deactivate/{tenant}", post(deactivate_compliance_preset))
		.route("/api/v1/compliance/reload", post(reload_compliance_presets))
}

#[derive(Deserialize)]
struct CreateTenantRequest {
	id: String,
	name: String,
	#[serde(default)]
	compliance_preset: Option<String>,
}

async fn list_tenants(State(state): State<ServerState>) -> Json<Vec<Tenant>> {
	Json(state.tenants.list_tenants())
}

async fn create_tenant(State(state): State<ServerState>, Json(body): Json<CreateTenantRequest>) -> Result<Json<Tenant>> {
	if let Some(preset) = &body.compliance_preset
		&& !state.compliance.activate(&body.id, preset)
	{
		return Err(AirlockError::Validation(format!("unknown compliance preset '{preset}'")));
	}
	let tenant = Tenant { id: body.id, name: body.name, compliance_preset: body.compliance_preset };
	state.tenants.upsert_tenant(tenant.clone());
	Ok(Json(tenant))
}

async fn remove_tenant(State(state): State<ServerState>, Path(id): Path<String>) -> StatusCode {
	state.tenants.remove_tenant(&id);
	state.mapping_store.delete_tenant(&id);
	state.cache.invalidate_tenant(&id);
	StatusCode::NO_CONTENT
}

#[derive(Serialize)]
struct IssuedKey {
	raw_key: String,
	key_id: String,
	prefix: String,
}

async fn issue_key(State(state): State<ServerState>, Path(tenant_id): Path<String>) -> Result<Json<IssuedKey>> {
	if state.tenants.get_tenant(&tenant_id).is_none() {
		return Err(AirlockError::Validation(format!("unknown tenant '{tenant_id}'")));
	}
	let (raw_key, record) = crate::tenant::issue_key(&tenant_id);
	let response = IssuedKey { raw_key, key_id: record.key_id.clone(), prefix: record.prefix.clone() };
	state.tenants.add_key(record);
	Ok(Json(response))
}

async fn revoke_key(State(state): State<ServerState>, Path(key_id): Path<String>) -> StatusCode {
	state.tenants.revoke_key(&key_id);
	StatusCode::NO_CONTENT
}

#[derive(Serialize)]
struct QuotaUsageEntry {
	quota_type: String,
	period: String,
	count: u64,
	window_end: chrono::DateTime<chrono::Utc>,
}

async fn quota_usage(State(state): State<ServerState>, Path(tenant): Path<String>) -> Json<Vec<QuotaUsageEntry>> {
	let entries = state
		.quota
		.usage_snapshot(&tenant)
		.into_iter()
		.map(|((ty, period), usage)| QuotaUsageEntry {
			quota_type: format!("{ty:?}"),
			period: format!("{period:?}"),
			count: usage.count,
			window_end: usage.window_end,
		})
		.collect();
	Json(entries)
}

async fn cache_stats(State(state): State<ServerState>) -> Json<crate::cache::CacheStats> {
	Json(state.cache.stats())
}

#[derive(Serialize)]
struct AllowlistEntry {
	entity_type: String,
	value: String,
}

async fn list_allowlist(State(state): State<ServerState>, Path(tenant): Path<String>) -> Json<Vec<AllowlistEntry>> {
	let entries = state
		.allowlist
		.list(&tenant)
		.into_iter()
		.map(|(entity_type, value)| AllowlistEntry { entity_type, value })
		.collect();
	Json(entries)
}

#[derive(Deserialize)]
struct AddAllowlistRequest {
	entity_type: String,
	value: String,
}

async fn add_allowlist(State(state): State<ServerState>, Path(tenant): Path<String>, Json(body): Json<AddAllowlistRequest>) -> StatusCode {
	state.allowlist.add(&tenant, &body.entity_type, &body.value);
	StatusCode::NO_CONTENT
}

async fn recent_audit(State(state): State<ServerState>, Path(tenant): Path<String>) -> Json<Vec<crate::audit::AuditEvent>> {
	Json(state.audit.recent(&tenant, 100).await)
}

async fn list_compliance_presets(State(state): State<ServerState>) -> Json<Vec<CompliancePreset>> {
	Json(state.compliance.list_presets())
}

#[derive(Serialize)]
struct ComplianceStatus {
	tenant: String,
	active_preset: Option<String>,
}

async fn compliance_status(State(state): State<ServerState>, Path(tenant): Path<String>) -> Json<ComplianceStatus> {
	Json(ComplianceStatus { active_preset: state.compliance.status(&tenant), tenant })
}

#[derive(Deserialize)]
struct ActivatePresetRequest {
	preset: String,
}

async fn activate_compliance_preset(
	State(state): State<ServerState>,
	Path(tenant): Path<String>,
	Json(body): Json<ActivatePresetRequest>,
) -> Result<StatusCode> {
	if state.compliance.activate(&tenant, &body.preset) {
		Ok(StatusCode::NO_CONTENT)
	} else {
		Err(AirlockError::Validation(format!("unknown compliance preset '{}'", body.preset)))
	}
}

async fn deactivate_compliance_preset(State(state): State<ServerState>, Path(tenant): Path<String>) -> StatusCode {
	state.compliance.deactivate(&tenant);
	StatusCode::NO_CONTENT
}

async fn reload_compliance_presets(State(state): State<ServerState>) -> Result<StatusCode> {
	state.compliance.reload()?;
	Ok(StatusCode::NO_CONTENT)
}
