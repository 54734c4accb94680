use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;

use arcstr::ArcStr;
use serde::{Deserialize, Serialize};

/// A cheaply-cloneable, immutable string. Used for identifiers (tenant ids,
/// request ids, entity types) that get copied into many small structs and
/// log lines per request.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Strng(ArcStr);

impl Strng {
	pub fn new(s: impl AsRef<str>) -> Self {
		Strng(ArcStr::from(s.as_ref()))
	}

	pub fn as_str(&self) -> &str {
		self.0.as_str()
	}
}

impl Deref for Strng {
	type Target = str;
	fn deref(&self) -> &str {
		self.0.as_str()
	}
}

impl Borrow<str> for Strng {
	fn borrow(&self) -> &str {
		self.0.as_str()
	}
}

impl fmt::Display for Strng {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Display::fmt(&self.0, f)
	}
}

impl fmt::Debug for Strng {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Debug::fmt(&self.0, f)
	}
}

impl From<&str> for Strng {
	fn from(s: &str) -> Self {
		Strng::new(s)
	}
}

impl From<String> for Strng {
	fn from(s: String) -> Self {
		Strng(ArcStr::from(s))
	}
}

impl From<&String> for Strng {
	fn from(s: &String) -> Self {
		Strng::new(s)
	}
}

pub fn strng(s: impl AsRef<str>) -> Strng {
	Strng::new(s)
}
