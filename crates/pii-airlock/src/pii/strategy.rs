use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::pii::synthetic;

/// The five reshape-closed anonymization strategies. Duck-typed strategy
/// lookup in the original implementation becomes this tagged variant with a
/// single `apply` operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
	Placeholder,
	Hash,
	Mask,
	Redact,
	Synthetic,
}

impl StrategyKind {
	pub fn parse(s: &str) -> Option<Self> {
		match s.to_ascii_lowercase().as_str() {
			"placeholder" => Some(StrategyKind::Placeholder),
			"hash" => Some(StrategyKind::Hash),
			"mask" => Some(StrategyKind::Mask),
			"redact" => Some(StrategyKind::Redact),
			"synthetic" => Some(StrategyKind::Synthetic),
			_ => None,
		}
	}

	/// Whether this strategy's output can be restored to the original value
	/// via the per-request mapping.
	pub fn reversible(self) -> bool {
		!matches!(self, StrategyKind::Mask | StrategyKind::Redact)
	}
}

impl Default for StrategyKind {
	fn default() -> Self {
		StrategyKind::Placeholder
	}
}

pub struct StrategyContext<'a> {
	pub session_salt: &'a str,
}

#[derive(Debug, Clone)]
pub struct StrategyOutput {
	pub text: String,
	pub reversible: bool,
}

/// Applies `kind` to `value`. `index` is the pre-assigned placeholder index
/// for `entity_type` within the current request (see [`super::counter`]).
pub fn apply(
	kind: StrategyKind,
	value: &str,
	entity_type: &str,
	index: u32,
	ctx: &StrategyContext,
) -> StrategyOutput {
	match kind {
		StrategyKind::Placeholder => StrategyOutput {
			text: format!("<{entity_type}_{index}>"),
			reversible: true,
		},
		StrategyKind::Hash => {
			let mut hasher = Sha256::new();
			hasher.update(entity_type.as_bytes());
			hasher.update(b":");
			hasher.update(value.as_bytes());
			StrategyOutput {
				text: hex::encode(hasher.finalize()),
				reversible: true,
			}
		},
		StrategyKind::Mask => StrategyOutput {
			text: mask(value, entity_type),
			reversible: false,
		},
		StrategyKind::Redact => StrategyOutput {
			text: "[REDACTED]".to_string(),
			reversible: false,
		},
		StrategyKind::Synthetic => StrategyOutput {
			text: synthetic::generate(ctx.session_salt, entity_type, value),
			reversible: true,
		},
	}
}

fn mask(value: &str, entity_type: &str) -> String {
	let ty = entity_type.to_ascii_uppercase();
	if ty.contains("PHONE") {
		mask_digits(value, 3, 4)
	} else if ty.contains("EMAIL") {
		mask_email(value)
	} else if ty.contains("ID_CARD") || ty.contains("IDCARD") {
		mask_keep_prefix_suffix(value, 6, 4)
	} else if ty.contains("CREDIT_CARD") || ty.contains("CREDITCARD") {
		mask_keep_prefix_suffix(value, 4, 4)
	} else {
		let len = value.chars().count();
		let keep = (len as f64 * 0.25).round() as usize;
		mask_keep_prefix_suffix(value, keep, keep)
	}
}

/// Keeps the first `head` and last `tail` *digits* of the digit-extracted
/// form, filling the middle with `*`; non-digit characters are dropped.
fn mask_digits(value: &str, head: usize, tail: usize) -> String {
	let digits: Vec<char> = value.chars().filter(|c| c.is_ascii_digit()).collect();
	mask_chars(&digits, head, tail)
}

fn mask_keep_prefix_suffix(value: &str, head: usize, tail: usize) -> String {
	let chars: Vec<char> = value.chars().collect();
	mask_chars(&chars, head, tail)
}

fn mask_chars(chars: &[char], head: usize, tail: usize) -> String {
	let len = chars.len();
	if len <= head + tail {
		return chars.iter().collect::<String>();
	}
	let prefix: String = chars[..head].iter().collect();
	let suffix: String = chars[len - tail..].iter().collect();
	let middle = "*".repeat(len - head - tail);
	format!("{prefix}{middle}{suffix}")
}

fn mask_email(value: &str) -> String {
	let Some((local, domain)) = value.split_once('@') else {
		return mask_keep_prefix_suffix(value, 1, 1);
	};
	let local_chars: Vec<char> = local.chars().collect();
	let masked_local = if local_chars.len() <= 2 {
		local.to_string()
	} else {
		let first = local_chars[0];
		let last = local_chars[local_chars.len() - 1];
		format!("{first}{}{last}", "*".repeat(local_chars.len() - 2))
	};
	format!("{masked_local}@{domain}")
}

#[cfg(test)]
mod tests {
	use super::*;

	fn ctx() -> StrategyContext<'static> {
		StrategyContext { session_salt: "salt" }
	}

	#[test]
	fn placeholder_format() {
		let out = apply(StrategyKind::Placeholder, "张三", "PERSON", 1, &ctx());
		assert_eq!(out.text, "<PERSON_1>");
		assert!(out.reversible);
	}

	#[test]
	fn hash_is_deterministic() {
		let a = apply(StrategyKind::Hash, "secret", "GENERIC", 1, &ctx());
		let b = apply(StrategyKind::Hash, "secret", "GENERIC", 1, &ctx());
		assert_eq!(a.text, b.text);
		assert_eq!(a.text.len(), 64);
	}

	#[test]
	fn mask_phone_keeps_first_three_last_four() {
		let out = apply(StrategyKind::Mask, "13800138000", "PHONE_NUMBER", 1, &ctx());
		assert_eq!(out.text, "138****8000");
		assert!(!out.reversible);
	}

	#[test]
	fn mask_email_keeps_edges_of_local_part() {
		let out = apply(StrategyKind::Mask, "johnsmith@example.com", "EMAIL", 1, &ctx());
		assert_eq!(out.text, "j*******h@example.com");
	}

	#[test]
	fn mask_credit_card_keeps_first_and_last_four() {
		let out = apply(StrategyKind::Mask, "4111111111111111", "CREDIT_CARD", 1, &ctx());
		assert_eq!(out.text, "4111********1111");
	}

	#[test]
	fn redact_is_fixed_marker() {
		let out = apply(StrategyKind::Redact, "anything", "PERSON", 1, &ctx());
		assert_eq!(out.text, "[REDACTED]");
	}
}
