//! HTTP method filters and their canonical form for ban keys.

// self
use crate::_prelude::*;

/// Non-idempotent verbs covered by [`MethodFilter::Unsafe`], sorted.
pub const UNSAFE_METHODS: [&str; 4] = ["DELETE", "PATCH", "POST", "PUT"];

/// Which HTTP methods a rule counts.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MethodFilter {
	/// Every method.
	#[default]
	All,
	/// DELETE, PATCH, POST, and PUT.
	Unsafe,
	/// One method.
	One(String),
	/// Any of several methods.
	Set(Vec<String>),
}
impl MethodFilter {
	/// Whether `method` is counted by this filter; comparison ignores case.
	pub fn matches(&self, method: &str) -> bool {
		match self {
			Self::All => true,
			Self::Unsafe => UNSAFE_METHODS.iter().any(|m| m.eq_ignore_ascii_case(method)),
			Self::One(m) => m.eq_ignore_ascii_case(method),
			Self::Set(ms) => ms.iter().any(|m| m.eq_ignore_ascii_case(method)),
		}
	}

	/// Canonical string: empty for all methods, otherwise uppercased names sorted and
	/// concatenated. Invariant under input order and case.
	pub fn canonical(&self) -> String {
		match self {
			Self::All => String::new(),
			Self::Unsafe => UNSAFE_METHODS.concat(),
			Self::One(m) => m.to_ascii_uppercase(),
			Self::Set(ms) => {
				let mut upper = ms.iter().map(|m| m.to_ascii_uppercase()).collect::<Vec<_>>();

				upper.sort();
				upper.concat()
			},
		}
	}
}
impl From<&str> for MethodFilter {
	fn from(value: &str) -> Self {
		Self::One(value.to_owned())
	}
}
impl<const N: usize> From<[&str; N]> for MethodFilter {
	fn from(value: [&str; N]) -> Self {
		Self::Set(value.iter().map(|m| (*m).to_owned()).collect())
	}
}
impl From<Vec<String>> for MethodFilter {
	fn from(value: Vec<String>) -> Self {
		Self::Set(value)
	}
}
