use crate::compliance::ComplianceRegistry;
use crate::config::Config;
use crate::pii::allowlist::Allowlist;
use crate::pii::counter::PlaceholderCounter;
use crate::pii::intent::{Intent, IntentDetector};
use crate::pii::mapping::{MappingEntry, RequestMapping, SyntheticMapping};
use crate::pii::ner::{EntitySpan, Recognizer};
use crate::pii::strategy::{self, StrategyContext, StrategyKind};
use crate::types::ChatMessage;

/// Resolves overlapping entity spans into a non-overlapping accepted set.
///
/// Spans are sorted by `(start asc, score desc, length desc)` and accepted
/// greedily: a candidate is kept only if it does not overlap any
/// already-accepted span. This favors earlier, higher-confidence, longer
/// matches over later or weaker ones covering the same text.
fn resolve_overlaps(mut spans: Vec<EntitySpan>) -> Vec<EntitySpan> {
	spans.sort_by(|a, b| {
		a.start
			.cmp(&b.start)
			.then(b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal))
			.then((b.end - b.start).cmp(&(a.end - a.start)))
	});
	let mut accepted: Vec<EntitySpan> = Vec::new();
	for span in spans {
		let overlaps = accepted.iter().any(|a| span.start < a.end && a.start < span.end);
		if !overlaps {
			accepted.push(span);
		}
	}
	accepted
}

pub struct Anonymizer {
	recognizer: Recognizer,
	intent: IntentDetector,
	allowlist: std::sync::Arc<Allowlist>,
	strategy_overrides: std::collections::HashMap<String, StrategyKind>,
	default_strategy: StrategyKind,
}

pub struct AnonymizeOutcome {
	pub messages: Vec<ChatMessage>,
	pub mapping: RequestMapping,
}

impl Anonymizer {
	pub fn new(config: &Config, allowlist: std::sync::Arc<Allowlist>) -> Self {
		Self {
			recognizer: Recognizer::new(),
			intent: IntentDetector::new(config.intent_context_window),
			allowlist,
			strategy_overrides: config.strategy_overrides.clone(),
			default_strategy: StrategyKind::default(),
		}
	}

	/// Like [`Anonymizer::new`], but applies `tenant`'s active compliance
	/// preset (if any) on top of the config-level defaults: the preset's
	/// strategy overrides win over `config.strategy_overrides`, and a
	/// preset that names any question-favoring types replaces the
	/// config-level list wholesale rather than merging with it.
	pub fn for_tenant(config: &Config, allowlist: std::sync::Arc<Allowlist>, compliance: &ComplianceRegistry, tenant: &str) -> Self {
		let Some(preset) = compliance.active_preset(tenant) else {
			return Self::new(config, allowlist);
		};

		let mut strategy_overrides = config.strategy_overrides.clone();
		strategy_overrides.extend(preset.strategies.clone());

		let mut intent = IntentDetector::new(config.intent_context_window);
		if !preset.question_favoring_types.is_empty() {
			intent = intent.with_question_favoring_types(preset.question_favoring_types.iter().cloned().collect());
		}

		Self {
			recognizer: Recognizer::new(),
			intent,
			allowlist,
			strategy_overrides,
			default_strategy: StrategyKind::default(),
		}
	}

	fn strategy_for(&self, entity_type: &str) -> StrategyKind {
		self.strategy_overrides.get(entity_type).copied().unwrap_or(self.default_strategy)
	}

	/// Anonymizes every non-system message in `messages`, building a single
	/// shared [`RequestMapping`] across the whole conversation so repeated
	/// entities reuse one placeholder/synthetic value. Each entity type uses
	/// its configured strategy, defaulting to [`StrategyKind::Placeholder`].
	pub fn anonymize(
		&self,
		tenant: &str,
		session_id: &str,
		session_salt: &str,
		now_ts: i64,
		messages: &[ChatMessage],
	) -> AnonymizeOutcome {
		let mut mapping = RequestMapping::new(session_id, now_ts);
		let mut counter = PlaceholderCounter::default();
		let strategy_ctx = StrategyContext { session_salt };

		let anonymized = messages
			.iter()
			.map(|message| {
				if message.is_system() {
					return message.clone();
				}
				let Some(content) = message.content_str() else {
					return message.clone();
				};
				let new_content = self.anonymize_text(tenant, &strategy_ctx, &mut counter, &mut mapping, content);
				let mut out = message.clone();
				out.content = serde_json::Value::String(new_content);
				out
			})
			.collect();

		AnonymizeOutcome { messages: anonymized, mapping }
	}

	fn anonymize_text(
		&self,
		tenant: &str,
		strategy_ctx: &StrategyContext,
		counter: &mut PlaceholderCounter,
		mapping: &mut RequestMapping,
		text: &str,
	) -> String {
		let spans = resolve_overlaps(self.recognizer.recognize(text));
		let mut accepted = Vec::new();
		for span in spans {
			let value = &text[span.start..span.end];
			let intent_result = self.intent.detect(text, span.start, span.end);

			// A statement-context match ("my name is ...") overrides the
			// allowlist: the value is being actively disclosed here, so it is
			// anonymized even if the same value is exempt elsewhere.
			if intent_result.intent != Intent::Statement && self.allowlist.is_exempt(tenant, &span.entity_type, value) {
				continue;
			}
			if intent_result.intent == Intent::Question && self.intent.favors_question(&span.entity_type) {
				continue;
			}
			accepted.push(span);
		}

		// Splice from the end so earlier byte offsets stay valid.
		accepted.sort_by(|a, b| b.start.cmp(&a.start));
		let mut result = text.to_string();
		for span in accepted {
			let original = text[span.start..span.end].to_string();
			let strategy = self.strategy_for(&span.entity_type);

			if let Some(existing) = mapping.existing_placeholder(&span.entity_type, &original) {
				result.replace_range(span.start..span.end, existing);
				continue;
			}
			if let Some(existing) = mapping.existing_synthetic(&span.entity_type, &original) {
				result.replace_range(span.start..span.end, existing);
				continue;
			}

			let index = counter.next(&span.entity_type);
			let output = strategy::apply(strategy, &original, &span.entity_type, index, strategy_ctx);
			result.replace_range(span.start..span.end, &output.text);

			if strategy == StrategyKind::Synthetic {
				mapping.insert_synthetic(SyntheticMapping {
					entity_type: span.entity_type.clone(),
					original,
					synthetic: output.text,
				});
			} else if output.reversible {
				mapping.insert(MappingEntry {
					entity_type: span.entity_type.clone(),
					original,
					placeholder: output.text,
					strategy_tag: strategy,
				});
			}
		}
		result
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn anonymizer() -> Anonymizer {
		let config = Config::for_tests();
		Anonymizer::new(&config, std::sync::Arc::new(Allowlist::new()))
	}

	fn message(role: &str, content: &str) -> ChatMessage {
		ChatMessage {
			role: role.to_string(),
			content: serde_json::Value::String(content.to_string()),
			extra: serde_json::Map::new(),
		}
	}

	#[test]
	fn system_messages_pass_through_unmodified() {
		let anonymizer = anonymizer();
		let messages = vec![message("system", "Contact 张三 at 13812345678")];
		let outcome =
			anonymizer.anonymize("tenant-a", "s1", "salt", 0, &messages);
		assert_eq!(outcome.messages[0].content_str(), Some("Contact 张三 at 13812345678"));
		assert!(outcome.mapping.is_empty());
	}

	#[test]
	fn user_message_phone_is_placeholdered_and_reversible() {
		let anonymizer = anonymizer();
		let messages = vec![message("user", "My number is 13812345678")];
		let outcome =
			anonymizer.anonymize("tenant-a", "s1", "salt", 0, &messages);
		let content = outcome.messages[0].content_str().unwrap();
		assert!(content.contains("<PHONE_1>"));
		assert_eq!(outcome.mapping.get_original("<PHONE_1>"), Some("13812345678"));
	}

	#[test]
	fn repeated_entity_reuses_same_placeholder() {
		let anonymizer = anonymizer();
		let messages = vec![message("user", "13812345678 called 13812345678 again")];
		let outcome =
			anonymizer.anonymize("tenant-a", "s1", "salt", 0, &messages);
		let content = outcome.messages[0].content_str().unwrap();
		assert_eq!(content.matches("<PHONE_1>").count(), 2);
	}

	#[test]
	fn for_tenant_without_active_preset_behaves_like_new() {
		let config = Config::for_tests();
		let compliance = ComplianceRegistry::new(None).unwrap();
		let anonymizer = Anonymizer::for_tenant(&config, std::sync::Arc::new(Allowlist::new()), &compliance, "tenant-a");
		let messages = vec![message("user", "My number is 13812345678")];
		let outcome = anonymizer.anonymize("tenant-a", "s1", "salt", 0, &messages);
		assert!(outcome.messages[0].content_str().unwrap().contains("<PHONE_1>"));
	}

	#[test]
	fn for_tenant_applies_active_preset_strategy_override() {
		let dir = tempfile::tempdir().unwrap();
		fs_err::write(
			dir.path().join("strict.yaml"),
			"name: strict\nstrategies:\n  PHONE: redact\n",
		)
		.unwrap();
		let compliance = ComplianceRegistry::new(Some(dir.path().to_path_buf())).unwrap();
		assert!(compliance.activate("tenant-a", "strict"));

		let config = Config::for_tests();
		let anonymizer = Anonymizer::for_tenant(&config, std::sync::Arc::new(Allowlist::new()), &compliance, "tenant-a");
		let messages = vec![message("user", "My number is 13812345678")];
		let outcome = anonymizer.anonymize("tenant-a", "s1", "salt", 0, &messages);
		assert_eq!(outcome.messages[0].content_str(), Some("My number is [REDACTED]"));
	}

	#[test]
	fn allowlisted_value_is_left_untouched() {
		let allowlist = std::sync::Arc::new(Allowlist::new());
		allowlist.add("tenant-a", "PHONE", "13812345678");
		let config = Config::for_tests();
		let anonymizer = Anonymizer::new(&config, allowlist);
		let messages = vec![message("user", "Call 13812345678")];
		let outcome =
			anonymizer.anonymize("tenant-a", "s1", "salt", 0, &messages);
		assert_eq!(outcome.messages[0].content_str(), Some("Call 13812345678"));
	}

	#[test]
	fn statement_context_overrides_allowlist_exemption() {
		let allowlist = std::sync::Arc::new(Allowlist::new());
		allowlist.add("tenant-a", "PHONE", "13812345678");
		let config = Config::for_tests();
		let anonymizer = Anonymizer::new(&config, allowlist);
		let messages = vec![message("user", "My name is 13812345678")];
		let outcome =
			anonymizer.anonymize("tenant-a", "s1", "salt", 0, &messages);
		let content = outcome.messages[0].content_str().unwrap();
		assert!(content.contains("<PHONE_1>"));
		assert!(!content.contains("13812345678"));
	}
}
