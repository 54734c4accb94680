use rand::Rng;
use rand::rngs::StdRng;

/// ISO-7064 MOD 11-2 weight vector for the 17 significant digits of a
/// Chinese resident ID card.
const WEIGHTS: [u32; 17] = [7, 9, 10, 5, 8, 4, 2, 1, 6, 3, 7, 9, 10, 5, 8, 4, 2];
/// Checksum code table indexed by `weighted_sum % 11`.
const CHECK_CODE_TABLE: [char; 11] = ['1', '0', 'X', '9', '8', '7', '6', '5', '4', '3', '2'];

/// A representative sample of real province/city region-code prefixes used
/// when the original value doesn't supply one to preserve.
const REGION_CODES: [&str; 8] = [
	"110101", "310101", "440103", "440303", "330102", "510104", "420102", "320102",
];

/// Computes the ISO-7064 MOD 11-2 checksum character for the first 17 digits
/// of an ID card number.
pub fn checksum(first_17: &[u8; 17]) -> char {
	let sum: u32 = first_17
		.iter()
		.zip(WEIGHTS.iter())
		.map(|(d, w)| (*d as u32) * w)
		.sum();
	CHECK_CODE_TABLE[(sum % 11) as usize]
}

/// Validates an 18-character ID card's embedded checksum.
pub fn is_valid(id: &str) -> bool {
	let chars: Vec<char> = id.chars().collect();
	if chars.len() != 18 {
		return false;
	}
	let mut digits = [0u8; 17];
	for (i, c) in chars[..17].iter().enumerate() {
		match c.to_digit(10) {
			Some(d) => digits[i] = d as u8,
			None => return false,
		}
	}
	checksum(&digits) == chars[17].to_ascii_uppercase()
}

/// Generates a synthetic but checksum-valid 18-digit ID card. Preserves the
/// original's region prefix and birth date when they parse as plausible
/// values, so the synthetic replacement stays demographically consistent.
pub fn generate(rng: &mut StdRng, original: &str) -> String {
	let digits: String = original.chars().filter(|c| c.is_ascii_digit()).collect();

	let region = if digits.len() >= 6 {
		digits[..6].to_string()
	} else {
		REGION_CODES[rng.random_range(0..REGION_CODES.len())].to_string()
	};

	let birth_date = if digits.len() >= 14 && parses_as_date(&digits[6..14]) {
		digits[6..14].to_string()
	} else {
		random_birth_date(rng)
	};

	let gender_parity_odd = if digits.len() >= 17 {
		digits.as_bytes()[16].is_ascii_digit() && (digits.as_bytes()[16] - b'0') % 2 == 1
	} else {
		rng.random_bool(0.5)
	};

	let seq_prefix: u32 = rng.random_range(0..100);
	let last_digit = {
		let candidates: Vec<u32> = (0..10)
			.filter(|d| (d % 2 == 1) == gender_parity_odd)
			.collect();
		candidates[rng.random_range(0..candidates.len())]
	};
	let sequence = format!("{seq_prefix:02}{last_digit}");

	let first_17 = format!("{region}{birth_date}{sequence}");
	let mut digits17 = [0u8; 17];
	for (i, c) in first_17.chars().enumerate() {
		digits17[i] = c.to_digit(10).unwrap_or(0) as u8;
	}
	let check = checksum(&digits17);

	format!("{first_17}{check}")
}

fn parses_as_date(s: &str) -> bool {
	if s.len() != 8 {
		return false;
	}
	let year: i32 = match s[..4].parse() {
		Ok(y) => y,
		Err(_) => return false,
	};
	let month: u32 = match s[4..6].parse() {
		Ok(m) => m,
		Err(_) => return false,
	};
	let day: u32 = match s[6..8].parse() {
		Ok(d) => d,
		Err(_) => return false,
	};
	(1900..=2100).contains(&year) && (1..=12).contains(&month) && (1..=31).contains(&day)
}

fn random_birth_date(rng: &mut StdRng) -> String {
	let year = rng.random_range(1950..=2005);
	let month = rng.random_range(1..=12);
	let day = rng.random_range(1..=28);
	format!("{year:04}{month:02}{day:02}")
}

#[cfg(test)]
mod tests {
	use rand::SeedableRng;

	use super::*;

	#[test]
	fn generated_card_passes_own_validator() {
		let mut rng = StdRng::seed_from_u64(42);
		for _ in 0..50 {
			let card = generate(&mut rng, "110101199003072316");
			assert!(is_valid(&card), "invalid card generated: {card}");
		}
	}

	#[test]
	fn known_checksum_matches_reference() {
		assert!(is_valid("110101199003072316"));
		assert!(!is_valid("110101199003072317"));
	}

	#[test]
	fn preserves_region_and_birth_date_when_present() {
		let mut rng = StdRng::seed_from_u64(7);
		let card = generate(&mut rng, "440303198501015678");
		assert_eq!(&card[..6], "440303");
		assert_eq!(&card[6..14], "19850101");
	}
}
