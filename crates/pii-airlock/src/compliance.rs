//! Compliance preset loading and per-tenant activation, backing the
//! `/api/v1/compliance/*` management surface.

use std::collections::HashMap;
use std::path::PathBuf;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::pii::strategy::StrategyKind;

/// A named bundle of strategy overrides and question-favoring-type
/// configuration, loaded from a YAML file in the presets directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompliancePreset {
	pub name: String,
	#[serde(default)]
	pub description: String,
	#[serde(default)]
	pub strategies: HashMap<String, StrategyKind>,
	#[serde(default)]
	pub question_favoring_types: Vec<String>,
}

/// Holds every preset discovered under the configured presets directory,
/// plus which preset (if any) is active for each tenant. Presets are
/// re-read from disk on `reload`.
#[derive(Default)]
pub struct ComplianceRegistry {
	dir: Option<PathBuf>,
	presets: RwLock<HashMap<String, CompliancePreset>>,
	active: RwLock<HashMap<String, String>>,
}

impl ComplianceRegistry {
	pub fn new(dir: Option<PathBuf>) -> anyhow::Result<Self> {
		let registry = Self { dir, presets: RwLock::new(HashMap::new()), active: RwLock::new(HashMap::new()) };
		registry.reload()?;
		Ok(registry)
	}

	/// Re-scans the presets directory for `.yaml`/`.yml` files. A registry
	/// with no configured directory is a permanent no-op, not an error.
	pub fn reload(&self) -> anyhow::Result<()> {
		let Some(dir) = &self.dir else {
			return Ok(());
		};
		if !dir.is_dir() {
			return Ok(());
		}
		let mut loaded = HashMap::new();
		for entry in fs_err::read_dir(dir)? {
			let path = entry?.path();
			let is_yaml = matches!(path.extension().and_then(|e| e.to_str()), Some("yaml") | Some("yml"));
			if !is_yaml {
				continue;
			}
			let raw = fs_err::read_to_string(&path)?;
			let preset: CompliancePreset = serde_yaml::from_str(&raw)?;
			loaded.insert(preset.name.clone(), preset);
		}
		*self.presets.write() = loaded;
		Ok(())
	}

	pub fn list_presets(&self) -> Vec<CompliancePreset> {
		self.presets.read().values().cloned().collect()
	}

	/// Activates `preset_name` for `tenant`. Returns `false` if no such
	/// preset is loaded.
	pub fn activate(&self, tenant: &str, preset_name: &str) -> bool {
		if !self.presets.read().contains_key(preset_name) {
			return false;
		}
		self.active.write().insert(tenant.to_string(), preset_name.to_string());
		true
	}

	pub fn deactivate(&self, tenant: &str) {
		self.active.write().remove(tenant);
	}

	pub fn status(&self, tenant: &str) -> Option<String> {
		self.active.read().get(tenant).cloned()
	}

	pub fn active_preset(&self, tenant: &str) -> Option<CompliancePreset> {
		let name = self.active.read().get(tenant).cloned()?;
		self.presets.read().get(&name).cloned()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn write_preset(dir: &std::path::Path, filename: &str, yaml: &str) {
		fs_err::write(dir.join(filename), yaml).unwrap();
	}

	#[test]
	fn no_directory_configured_yields_no_presets() {
		let registry = ComplianceRegistry::new(None).unwrap();
		assert!(registry.list_presets().is_empty());
	}

	#[test]
	fn loads_presets_and_activates_per_tenant() {
		let dir = tempfile::tempdir().unwrap();
		write_preset(
			dir.path(),
			"strict.yaml",
			"name: strict\ndescription: strict preset\nstrategies:\n  PERSON: redact\nquestion_favoring_types: []\n",
		);
		let registry = ComplianceRegistry::new(Some(dir.path().to_path_buf())).unwrap();
		assert_eq!(registry.list_presets().len(), 1);

		assert!(registry.activate("tenant-a", "strict"));
		let active = registry.active_preset("tenant-a").unwrap();
		assert_eq!(active.strategies.get("PERSON"), Some(&StrategyKind::Redact));

		registry.deactivate("tenant-a");
		assert!(registry.active_preset("tenant-a").is_none());
	}

	#[test]
	fn activating_unknown_preset_fails() {
		let registry = ComplianceRegistry::new(None).unwrap();
		assert!(!registry.activate("tenant-a", "nonexistent"));
	}
}
