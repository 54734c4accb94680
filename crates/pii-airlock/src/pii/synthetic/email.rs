use rand::Rng;
use rand::rngs::StdRng;

const DOMAINS: &[&str] = &["example.com", "mail.com", "workmail.net"];
const WORDS: &[&str] = &["river", "cedar", "harbor", "meadow", "quartz", "willow"];

/// Generates a plausible email address, preserving the original's domain
/// when one is present.
pub fn generate(rng: &mut StdRng, original: &str) -> String {
	let domain = original
		.split_once('@')
		.map(|(_, d)| d.to_string())
		.unwrap_or_else(|| DOMAINS[rng.random_range(0..DOMAINS.len())].to_string());
	let word = WORDS[rng.random_range(0..WORDS.len())];
	let suffix: u32 = rng.random_range(10..999);
	format!("{word}{suffix}@{domain}")
}
