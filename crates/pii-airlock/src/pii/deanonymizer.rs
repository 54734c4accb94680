use once_cell::sync::Lazy;
use regex::Regex;

use super::mapping::RequestMapping;

static PLACEHOLDER: Lazy<Regex> =
	Lazy::new(|| Regex::new(r"<([A-Z_]+)_(\d+)>").expect("placeholder pattern"));

/// Restores exact placeholders (`<TYPE_N>`) and literal synthetic values
/// back to their originals. Synthetic substitution is longest-value-first so
/// that a shorter synthetic value that happens to be a substring of a longer
/// one never shadows it.
pub fn deanonymize(text: &str, mapping: &RequestMapping) -> String {
	let mut result = PLACEHOLDER
		.replace_all(text, |caps: &regex::Captures| {
			let whole = &caps[0];
			mapping.get_original(whole).map(str::to_string).unwrap_or_else(|| whole.to_string())
		})
		.into_owned();

	for synthetic in mapping.synthetic_values_longest_first() {
		if let Some(original) = mapping.get_original(synthetic) {
			result = result.replace(synthetic, original);
		}
	}
	result
}
