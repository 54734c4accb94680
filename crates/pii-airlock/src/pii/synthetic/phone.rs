use rand::Rng;
use rand::rngs::StdRng;

/// Common Chinese mobile carrier prefixes (3 digits after the leading `1`).
const PREFIXES: &[&str] = &["138", "139", "150", "151", "158", "159", "186", "187"];

/// Generates a synthetic phone number, preserving the original's
/// carrier/area prefix length (first 3 digits) when the original looks like
/// an 11-digit mobile number.
pub fn generate(rng: &mut StdRng, original: &str) -> String {
	let digits: String = original.chars().filter(|c| c.is_ascii_digit()).collect();
	let prefix = if digits.len() == 11 && digits.starts_with('1') {
		digits[..3].to_string()
	} else {
		PREFIXES[rng.random_range(0..PREFIXES.len())].to_string()
	};
	let rest: String = (0..8)
		.map(|_| std::char::from_digit(rng.random_range(0..10), 10).unwrap())
		.collect();
	format!("{prefix}{rest}")
}
