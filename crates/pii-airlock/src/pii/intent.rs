use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

/// Entity types that default to being treated as a question reference
/// (e.g. "who is Alice?") rather than a disclosed fact when context is
/// ambiguous, mirroring the question-favoring bias used upstream.
pub fn default_question_favoring_types() -> HashSet<&'static str> {
	["PERSON", "ORGANIZATION", "LOCATION"].into_iter().collect()
}

static QUESTION_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
	[
		r"(?i)who\s+is\s*$",
		r"(?i)what\s+is\s*$",
		r"(?i)where\s+is\s*$",
		r"(?i)do\s+you\s+know\s*$",
		r"(?i)have\s+you\s+heard\s+of\s*$",
		r"(?i)tell\s+me\s+about\s*$",
		r"谁是\s*$",
		r"什么是\s*$",
		r"哪里是\s*$",
		r"你知道\s*$",
		r"你听说过\s*$",
		r"介绍一下\s*$",
	]
	.into_iter()
	.map(|p| Regex::new(p).expect("static question pattern"))
	.collect()
});

static QUESTION_CONTEXT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
	[r"(?i)\?\s*$", r"？\s*$", r"(?i)^\s*(who|what|where|when|why|how)\b"]
		.into_iter()
		.map(|p| Regex::new(p).expect("static question context pattern"))
		.collect()
});

static STATEMENT_CONTEXT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
	[
		r"(?i)\bmy\s+name\s+is\s*$",
		r"(?i)\bi\s+am\s*$",
		r"(?i)\bi'?m\s*$",
		r"(?i)\bcall\s+me\s*$",
		r"我叫\s*$",
		r"我是\s*$",
		r"我的名字是\s*$",
	]
	.into_iter()
	.map(|p| Regex::new(p).expect("static statement context pattern"))
	.collect()
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
	Question,
	Statement,
	Unknown,
}

#[derive(Debug, Clone)]
pub struct IntentResult {
	pub intent: Intent,
	pub matched_pattern: Option<String>,
}

/// Classifies whether the span `[start, end)` of `text` is referenced in a
/// question context or asserted as a statement, by inspecting a window of
/// `context_window` characters immediately preceding the span.
pub struct IntentDetector {
	context_window: usize,
	question_favoring: HashSet<String>,
}

impl IntentDetector {
	pub fn new(context_window: usize) -> Self {
		Self {
			context_window,
			question_favoring: default_question_favoring_types()
				.into_iter()
				.map(String::from)
				.collect(),
		}
	}

	pub fn with_question_favoring_types(mut self, types: HashSet<String>) -> Self {
		self.question_favoring = types;
		self
	}

	pub fn detect(&self, text: &str, start: usize, _end: usize) -> IntentResult {
		let preceding_start = start.saturating_sub(self.context_window);
		let window = text.get(preceding_start..start).unwrap_or("");

		for re in STATEMENT_CONTEXT_PATTERNS.iter() {
			if let Some(m) = re.find(window) {
				return IntentResult {
					intent: Intent::Statement,
					matched_pattern: Some(m.as_str().to_string()),
				};
			}
		}
		for re in QUESTION_PATTERNS.iter().chain(QUESTION_CONTEXT_PATTERNS.iter()) {
			if let Some(m) = re.find(window) {
				return IntentResult {
					intent: Intent::Question,
					matched_pattern: Some(m.as_str().to_string()),
				};
			}
		}
		IntentResult { intent: Intent::Unknown, matched_pattern: None }
	}

	/// Whether the given entity type should be treated as exempt when intent
	/// is unknown and the tenant's policy favors skipping questions.
	pub fn favors_question(&self, entity_type: &str) -> bool {
		self.question_favoring.contains(entity_type)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn detects_statement_context() {
		let detector = IntentDetector::new(50);
		let text = "My name is Alice and I live in Boston.";
		let start = text.find("Alice").unwrap();
		let result = detector.detect(text, start, start + 5);
		assert_eq!(result.intent, Intent::Statement);
	}

	#[test]
	fn detects_question_context() {
		let detector = IntentDetector::new(50);
		let text = "Who is Alice?";
		let start = text.find("Alice").unwrap();
		let result = detector.detect(text, start, start + 5);
		assert_eq!(result.intent, Intent::Question);
	}

	#[test]
	fn detects_chinese_statement_context() {
		let detector = IntentDetector::new(50);
		let text = "我叫张三";
		let start = text.find('张').unwrap();
		let result = detector.detect(text, start, start + 6);
		assert_eq!(result.intent, Intent::Statement);
	}

	#[test]
	fn unknown_when_no_marker_present() {
		let detector = IntentDetector::new(50);
		let text = "Alice went to the store.";
		let result = detector.detect(text, 0, 5);
		assert_eq!(result.intent, Intent::Unknown);
	}
}
