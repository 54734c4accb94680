use rand::Rng;
use rand::rngs::StdRng;

const FAMILY_NAMES: &[&str] = &[
	"王", "李", "张", "刘", "陈", "杨", "赵", "黄", "周", "吴",
];

const GIVEN_NAMES: &[&str] = &[
	"伟", "芳", "娜", "敏", "静", "强", "磊", "洋", "艳", "勇",
];

/// Generates a plausible Chinese given/family name pair. Deterministic given
/// the caller's seeded `rng`.
pub fn generate(rng: &mut StdRng) -> String {
	let family = FAMILY_NAMES[rng.random_range(0..FAMILY_NAMES.len())];
	let given = GIVEN_NAMES[rng.random_range(0..GIVEN_NAMES.len())];
	format!("{family}{given}")
}
