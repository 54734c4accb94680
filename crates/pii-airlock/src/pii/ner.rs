use once_cell::sync::Lazy;
use regex::Regex;

/// A detected span of text that looks like a PII entity.
#[derive(Debug, Clone, PartialEq)]
pub struct EntitySpan {
	pub entity_type: String,
	pub start: usize,
	pub end: usize,
	pub score: f64,
}

static PHONE: Lazy<Regex> =
	Lazy::new(|| Regex::new(r"(?:(?:\+?86)[-\s]?)?1[3-9]\d{9}\b").expect("phone pattern"));
static EMAIL: Lazy<Regex> = Lazy::new(|| {
	Regex::new(r"[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}").expect("email pattern")
});
static ID_CARD: Lazy<Regex> =
	Lazy::new(|| Regex::new(r"\b[1-9]\d{5}(?:19|20)\d{2}(?:0[1-9]|1[0-2])(?:[0-2]\d|3[01])\d{3}[0-9Xx]\b").expect("id card pattern"));
static CREDIT_CARD: Lazy<Regex> =
	Lazy::new(|| Regex::new(r"\b(?:\d[ -]?){13,16}\b").expect("credit card pattern"));
static IPV4: Lazy<Regex> = Lazy::new(|| {
	Regex::new(r"\b(?:(?:25[0-5]|2[0-4]\d|1?\d?\d)\.){3}(?:25[0-5]|2[0-4]\d|1?\d?\d)\b")
		.expect("ipv4 pattern")
});
// Chinese given/family names: a short curated surname list followed by 1-2 CJK chars.
static CHINESE_NAME: Lazy<Regex> = Lazy::new(|| {
	Regex::new(r"(?:张|王|李|赵|刘|陈|杨|黄|周|吴)[一-龥]{1,2}").expect("chinese name pattern")
});

/// Minimal regex-based stand-in for a trained named-entity recognizer,
/// sufficient to exercise the anonymization pipeline end to end against
/// common PII shapes.
pub struct Recognizer;

impl Recognizer {
	pub fn new() -> Self {
		Self
	}

	pub fn recognize(&self, text: &str) -> Vec<EntitySpan> {
		let mut spans = Vec::new();
		for m in ID_CARD.find_iter(text) {
			spans.push(EntitySpan { entity_type: "ID_CARD".into(), start: m.start(), end: m.end(), score: 0.97 });
		}
		for m in EMAIL.find_iter(text) {
			spans.push(EntitySpan { entity_type: "EMAIL".into(), start: m.start(), end: m.end(), score: 0.96 });
		}
		for m in PHONE.find_iter(text) {
			spans.push(EntitySpan { entity_type: "PHONE".into(), start: m.start(), end: m.end(), score: 0.93 });
		}
		for m in CREDIT_CARD.find_iter(text) {
			let digits: String = m.as_str().chars().filter(|c| c.is_ascii_digit()).collect();
			if digits.len() >= 13 && digits.len() <= 16 {
				spans.push(EntitySpan { entity_type: "CREDIT_CARD".into(), start: m.start(), end: m.end(), score: 0.85 });
			}
		}
		for m in IPV4.find_iter(text) {
			spans.push(EntitySpan { entity_type: "IP_ADDRESS".into(), start: m.start(), end: m.end(), score: 0.8 });
		}
		for m in CHINESE_NAME.find_iter(text) {
			spans.push(EntitySpan { entity_type: "PERSON".into(), start: m.start(), end: m.end(), score: 0.7 });
		}
		spans
	}
}

impl Default for Recognizer {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn recognizes_phone_and_email() {
		let spans = Recognizer::new().recognize("Call me at 13812345678 or alice@example.com");
		let types: Vec<&str> = spans.iter().map(|s| s.entity_type.as_str()).collect();
		assert!(types.contains(&"PHONE"));
		assert!(types.contains(&"EMAIL"));
	}

	#[test]
	fn recognizes_id_card() {
		let spans = Recognizer::new().recognize("身份证号 110101199003072316");
		assert!(spans.iter().any(|s| s.entity_type == "ID_CARD"));
	}

	#[test]
	fn recognizes_chinese_name() {
		let spans = Recognizer::new().recognize("我叫张三，很高兴认识你");
		assert!(spans.iter().any(|s| s.entity_type == "PERSON"));
	}
}
