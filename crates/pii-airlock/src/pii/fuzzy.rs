use once_cell::sync::Lazy;
use regex::Regex;

use super::mapping::RequestMapping;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FuzzyMatchType {
	Exact,
	CaseInsensitive,
	WhitespaceVariant,
	SpaceSeparator,
	BracketVariant,
	HyphenSeparator,
	ColonSeparator,
}

#[derive(Debug, Clone)]
pub struct FuzzyMatch {
	pub match_type: FuzzyMatchType,
	pub start: usize,
	pub end: usize,
	pub confidence: f64,
	pub original: String,
}

static STANDARD_PLACEHOLDER: Lazy<Regex> =
	Lazy::new(|| Regex::new(r"<([A-Z_]+)_(\d+)>").expect("standard placeholder pattern"));

// Each entry: (pattern matching a corrupted placeholder, match type, confidence).
// Patterns capture entity type in group 1 and index in group 2.
static FUZZY_PATTERNS: Lazy<Vec<(Regex, FuzzyMatchType, f64)>> = Lazy::new(|| {
	vec![
		(Regex::new(r"<([A-Za-z_]+)_(\d+)>").unwrap(), FuzzyMatchType::CaseInsensitive, 0.95),
		(Regex::new(r"<\s*([A-Za-z_]+)\s*_\s*(\d+)\s*>").unwrap(), FuzzyMatchType::WhitespaceVariant, 0.95),
		(Regex::new(r"<([A-Za-z_]+)\s+(\d+)>").unwrap(), FuzzyMatchType::SpaceSeparator, 0.90),
		(Regex::new(r"\[([A-Za-z_]+)_(\d+)\]").unwrap(), FuzzyMatchType::BracketVariant, 0.90),
		(Regex::new(r"\{([A-Za-z_]+)_(\d+)\}").unwrap(), FuzzyMatchType::BracketVariant, 0.85),
		(Regex::new(r"\(([A-Za-z_]+)_(\d+)\)").unwrap(), FuzzyMatchType::BracketVariant, 0.85),
		(Regex::new(r"<([A-Za-z_]+)-(\d+)>").unwrap(), FuzzyMatchType::HyphenSeparator, 0.85),
		(Regex::new(r"<([A-Za-z_]+):(\d+)>").unwrap(), FuzzyMatchType::ColonSeparator, 0.90),
	]
});

fn normalize_placeholder(entity_type: &str, index: &str) -> String {
	format!("<{}_{}>", entity_type.to_ascii_uppercase(), index)
}

fn is_valid_entity_type(mapping: &RequestMapping, entity_type: &str, index: &str) -> bool {
	let normalized = normalize_placeholder(entity_type, index);
	mapping.get_original(&normalized).is_some()
}

/// Finds both exact and fuzzy (LLM-corrupted) placeholder occurrences in
/// `text`. Exact matches are located first and excluded from the fuzzy scan
/// so a well-formed placeholder never gets re-scored by a looser pattern.
pub fn find_matches(text: &str, mapping: &RequestMapping) -> Vec<FuzzyMatch> {
	let mut matches = Vec::new();
	let mut seen_offsets: Vec<(usize, usize)> = Vec::new();

	for caps in STANDARD_PLACEHOLDER.captures_iter(text) {
		let whole = caps.get(0).unwrap();
		let entity_type = &caps[1];
		let index = &caps[2];
		if !is_valid_entity_type(mapping, entity_type, index) {
			continue;
		}
		seen_offsets.push((whole.start(), whole.end()));
		matches.push(FuzzyMatch {
			match_type: FuzzyMatchType::Exact,
			start: whole.start(),
			end: whole.end(),
			confidence: 1.0,
			original: normalize_placeholder(entity_type, index),
		});
	}

	for (pattern, match_type, confidence) in FUZZY_PATTERNS.iter() {
		for caps in pattern.captures_iter(text) {
			let whole = caps.get(0).unwrap();
			if seen_offsets.iter().any(|&(s, e)| whole.start() < e && s < whole.end()) {
				continue;
			}
			let entity_type = &caps[1];
			let index = &caps[2];
			if !is_valid_entity_type(mapping, entity_type, index) {
				continue;
			}
			seen_offsets.push((whole.start(), whole.end()));
			matches.push(FuzzyMatch {
				match_type: *match_type,
				start: whole.start(),
				end: whole.end(),
				confidence: *confidence,
				original: normalize_placeholder(entity_type, index),
			});
		}
	}

	matches.sort_by_key(|m| m.start);
	matches
}

/// Restores fuzzy-recognized placeholders whose confidence meets
/// `min_confidence`, then falls through to exact/synthetic restoration for
/// anything remaining.
pub fn fuzzy_deanonymize(text: &str, mapping: &RequestMapping, min_confidence: f64) -> String {
	let matches = find_matches(text, mapping);
	let mut result = String::new();
	let mut cursor = 0;
	for m in matches.iter().filter(|m| m.confidence >= min_confidence) {
		if m.start < cursor {
			continue;
		}
		result.push_str(&text[cursor..m.start]);
		let replacement = mapping.get_original(&m.original).unwrap_or(&m.original);
		result.push_str(replacement);
		cursor = m.end;
	}
	result.push_str(&text[cursor..]);
	super::deanonymizer::deanonymize(&result, mapping)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::pii::mapping::MappingEntry;
	use crate::pii::strategy::StrategyKind;

	fn mapping_with_phone() -> RequestMapping {
		let mut mapping = RequestMapping::new("s1", 0);
		mapping.insert(MappingEntry {
			entity_type: "PHONE".into(),
			original: "13812345678".into(),
			placeholder: "<PHONE_1>".into(),
			strategy_tag: StrategyKind::Placeholder,
		});
		mapping
	}

	#[test]
	fn restores_bracket_variant() {
		let mapping = mapping_with_phone();
		let restored = fuzzy_deanonymize("Call [PHONE_1] now", &mapping, 0.75);
		assert_eq!(restored, "Call 13812345678 now");
	}

	#[test]
	fn restores_whitespace_variant() {
		let mapping = mapping_with_phone();
		let restored = fuzzy_deanonymize("Call < PHONE _ 1 > now", &mapping, 0.75);
		assert_eq!(restored, "Call 13812345678 now");
	}

	#[test]
	fn low_confidence_variant_below_threshold_is_skipped() {
		let mapping = mapping_with_phone();
		let restored = fuzzy_deanonymize("Call {PHONE_1} now", &mapping, 0.90);
		assert_eq!(restored, "Call {PHONE_1} now");
	}

	#[test]
	fn unrecognized_index_is_not_substituted() {
		let mapping = mapping_with_phone();
		let restored = fuzzy_deanonymize("Call [PHONE_9] now", &mapping, 0.75);
		assert_eq!(restored, "Call [PHONE_9] now");
	}

	#[test]
	fn mixed_case_placeholder_restores_via_case_insensitive_tier() {
		let mapping = mapping_with_phone();
		let restored = fuzzy_deanonymize("Call <Phone_1> now", &mapping, 0.95);
		assert_eq!(restored, "Call 13812345678 now");
	}
}
