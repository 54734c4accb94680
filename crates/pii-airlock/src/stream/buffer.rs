use once_cell::sync::Lazy;
use regex::Regex;

/// Longest placeholder we ever emit (`<CREDIT_CARD_123>` style), used to
/// bound how much trailing text must be held back in case it is the start of
/// a placeholder split across two upstream chunks.
pub const MAX_PLACEHOLDER_LEN: usize = 25;

static COMPLETE_PLACEHOLDER: Lazy<Regex> =
	Lazy::new(|| Regex::new(r"<[A-Za-z_]+_\d+>").expect("complete placeholder pattern"));
static POTENTIAL_START: Lazy<Regex> =
	Lazy::new(|| Regex::new(r"<[A-Za-z_]*\d*$").expect("potential placeholder start pattern"));

/// Accumulates streamed text and releases only the portion that is safe to
/// emit immediately: anything up to and including the last complete
/// placeholder, plus any trailing text that cannot possibly be the prefix
/// of a placeholder. Text that could still grow into a placeholder on the
/// next chunk is held back.
#[derive(Debug, Default)]
pub struct StreamBuffer {
	pending: String,
}

impl StreamBuffer {
	pub fn new() -> Self {
		Self::default()
	}

	/// Feeds one chunk of upstream text and returns the portion now safe to
	/// release to the client.
	pub fn process_chunk(&mut self, chunk: &str) -> String {
		self.pending.push_str(chunk);
		let (safe, remainder) = Self::extract_safe_portion(&self.pending);
		self.pending = remainder;
		safe
	}

	/// Releases whatever text remains buffered. Call once at the end of the
	/// stream (or on error) so no text is silently dropped.
	pub fn flush(&mut self) -> String {
		std::mem::take(&mut self.pending)
	}

	pub fn has_pending(&self) -> bool {
		!self.pending.is_empty()
	}

	pub fn pending_length(&self) -> usize {
		self.pending.chars().count()
	}

	pub fn clear(&mut self) {
		self.pending.clear();
	}

	/// Splits `text` into `(safe_to_emit, held_back)`.
	///
	/// 1. If there is no `<` at all, or the last `<` is followed by a
	///    complete placeholder, everything is safe.
	/// 2. Otherwise find the last `<` in the text.
	/// 3. If the held-back tail would exceed [`MAX_PLACEHOLDER_LEN`], it can
	///    never complete into a valid placeholder, so release it anyway.
	/// 4. If the tail starting at that `<` matches a potential (unterminated)
	///    placeholder start, hold back from that `<` onward.
	/// 5. Otherwise the tail doesn't look like a placeholder start at all
	///    (e.g. a lone `<` used as a literal character) — but it's still
	///    short enough that the next chunk could turn it into one, so hold
	///    it back the same way rather than releasing it early.
	/// 6. Re-check: only the single last `<` matters, since any earlier `<`
	///    is necessarily followed by either a complete placeholder (handled
	///    by step 1's regex scan) or ordinary text.
	fn extract_safe_portion(text: &str) -> (String, String) {
		let Some(last_lt) = text.rfind('<') else {
			return (text.to_string(), String::new());
		};

		// Is the text from the last '<' onward already a complete placeholder
		// (or followed by ordinary text after one)? Check if any complete
		// placeholder's match ends at or after `last_lt`.
		if let Some(m) = COMPLETE_PLACEHOLDER.find_iter(text).last()
			&& m.start() >= last_lt
		{
			return (text.to_string(), String::new());
		}

		let tail = &text[last_lt..];
		let tail_len = tail.chars().count();

		if tail_len > MAX_PLACEHOLDER_LEN {
			return (text.to_string(), String::new());
		}

		if POTENTIAL_START.is_match(tail) {
			let safe = text[..last_lt].to_string();
			let held = tail.to_string();
			return (safe, held);
		}

		// `tail` doesn't look like a placeholder start at all (e.g. a lone
		// `<` used as a literal character), but it's still short enough that
		// the next chunk could turn it into one, so hold it back rather than
		// releasing it early.
		let safe = text[..last_lt].to_string();
		let held = tail.to_string();
		(safe, held)
	}
}
