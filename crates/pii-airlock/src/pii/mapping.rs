use indexmap::IndexMap;

/// One reversible substitution made by the anonymization engine.
#[derive(Debug, Clone)]
pub struct MappingEntry {
	pub entity_type: String,
	pub original: String,
	pub placeholder: String,
	pub strategy_tag: crate::pii::strategy::StrategyKind,
}

/// `(entity_type, original) -> synthetic` — deterministic within the
/// session, reused whenever the same original recurs in the same request.
#[derive(Debug, Clone)]
pub struct SyntheticMapping {
	pub entity_type: String,
	pub original: String,
	pub synthetic: String,
}

/// The per-request bidirectional dictionary of originals, placeholders, and
/// synthetic replacements. Insertion-order stable; all lookups are O(1).
#[derive(Debug, Clone, Default)]
pub struct RequestMapping {
	pub session_id: String,
	pub created_ts: i64,
	entries: IndexMap<String, MappingEntry>,
	reverse: IndexMap<String, String>,
	synthetics: Vec<SyntheticMapping>,
	synthetic_reverse: IndexMap<String, String>,
}

impl RequestMapping {
	pub fn new(session_id: impl Into<String>, created_ts: i64) -> Self {
		Self {
			session_id: session_id.into(),
			created_ts,
			..Default::default()
		}
	}

	/// Looks up an existing placeholder for `original` of type `entity_type`,
	/// so equal original values within a request share one placeholder.
	pub fn existing_placeholder(&self, entity_type: &str, original: &str) -> Option<&str> {
		self
			.entries
			.get(&Self::forward_key(entity_type, original))
			.map(|e| e.placeholder.as_str())
	}

	pub fn existing_synthetic(&self, entity_type: &str, original: &str) -> Option<&str> {
		self
			.synthetics
			.iter()
			.find(|m| m.entity_type == entity_type && m.original == original)
			.map(|m| m.synthetic.as_str())
	}

	/// Records a new reversible mapping entry. No-op if this exact
	/// `(entity_type, original)` pair is already present.
	pub fn insert(&mut self, entry: MappingEntry) {
		let key = Self::forward_key(&entry.entity_type, &entry.original);
		self.reverse.insert(entry.placeholder.clone(), entry.original.clone());
		self.entries.insert(key, entry);
	}

	pub fn insert_synthetic(&mut self, mapping: SyntheticMapping) {
		self
			.synthetic_reverse
			.insert(mapping.synthetic.clone(), mapping.original.clone());
		self.synthetics.push(mapping);
	}

	/// Reverse lookup: placeholder or literal synthetic substring -> original.
	pub fn get_original(&self, placeholder_or_synthetic: &str) -> Option<&str> {
		self
			.reverse
			.get(placeholder_or_synthetic)
			.or_else(|| self.synthetic_reverse.get(placeholder_or_synthetic))
			.map(|s| s.as_str())
	}

	/// All synthetic values currently mapped, longest-first, for
	/// longest-first substring replacement during de-anonymization.
	pub fn synthetic_values_longest_first(&self) -> Vec<&str> {
		let mut values: Vec<&str> = self.synthetic_reverse.keys().map(|s| s.as_str()).collect();
		values.sort_by_key(|b| std::cmp::Reverse(b.len()));
		values
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty() && self.synthetics.is_empty()
	}

	pub fn len(&self) -> usize {
		self.entries.len() + self.synthetics.len()
	}

	fn forward_key(entity_type: &str, original: &str) -> String {
		format!("{entity_type}\u{0}{original}")
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::pii::strategy::StrategyKind;

	#[test]
	fn equal_originals_share_one_placeholder() {
		let mut m = RequestMapping::new("s1", 0);
		m.insert(MappingEntry {
			entity_type: "PERSON".into(),
			original: "张三".into(),
			placeholder: "<PERSON_1>".into(),
			strategy_tag: StrategyKind::Placeholder,
		});
		assert_eq!(m.existing_placeholder("PERSON", "张三"), Some("<PERSON_1>"));
		assert_eq!(m.get_original("<PERSON_1>"), Some("张三"));
	}

	#[test]
	fn synthetic_reverse_lookup() {
		let mut m = RequestMapping::new("s1", 0);
		m.insert_synthetic(SyntheticMapping {
			entity_type: "PERSON".into(),
			original: "张三".into(),
			synthetic: "李伟".into(),
		});
		assert_eq!(m.get_original("李伟"), Some("张三"));
	}
}
