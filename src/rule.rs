//! Rule configuration: which caller key to track, how fast it may go, how long a ban lasts, and
//! which HTTP methods count.

pub mod ban;
pub mod method;
pub mod rate;

pub use ban::*;
pub use method::*;
pub use rate::*;

// self
use crate::{_prelude::*, request::Request};

/// Dynamic key function; receives the resolved group and the request.
pub type KeyFn = Arc<dyn Fn(&str, &Request) -> String + Send + Sync>;

/// How a rule identifies the calling entity.
#[derive(Clone)]
pub enum KeySpec {
	/// Declarative key: a simple key (`ip`), an accessor (`header:x-real-ip`), or a dotted path
	/// into the [`KeyRegistry`](crate::key::KeyRegistry).
	Named(String),
	/// Direct key function.
	Func(KeyFn),
}
impl KeySpec {
	/// Wraps a closure as a key function.
	pub fn func<F>(f: F) -> Self
	where
		F: 'static + Fn(&str, &Request) -> String + Send + Sync,
	{
		Self::Func(Arc::new(f))
	}

	/// Label used in diagnostics and block payloads.
	pub fn label(&self) -> &str {
		match self {
			Self::Named(name) => name,
			Self::Func(_) => "<fn>",
		}
	}
}
impl Debug for KeySpec {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("KeySpec").field(&self.label()).finish()
	}
}
impl From<&str> for KeySpec {
	fn from(value: &str) -> Self {
		Self::Named(value.to_owned())
	}
}
impl From<String> for KeySpec {
	fn from(value: String) -> Self {
		Self::Named(value)
	}
}

/// Throttle-and-ban rule attached to one protected operation.
#[derive(Clone, Debug)]
pub struct Rule {
	/// Explicit group; derived from the operation name when absent.
	pub group: Option<String>,
	/// Caller identity selector.
	pub key: KeySpec,
	/// Allowed rate; may be resolved per request.
	pub rate: RateSpec,
	/// Ban duration; may be resolved per request.
	pub ban: BanSpec,
	/// HTTP methods the rule applies to.
	pub method: MethodFilter,
	/// Deny with [`Error::Blocked`] instead of only annotating the request.
	pub block: bool,
}
impl Rule {
	/// Creates a blocking rule that applies to every method.
	pub fn new(
		key: impl Into<KeySpec>,
		rate: impl Into<RateSpec>,
		ban: impl Into<BanSpec>,
	) -> Self {
		Self {
			group: None,
			key: key.into(),
			rate: rate.into(),
			ban: ban.into(),
			method: MethodFilter::All,
			block: true,
		}
	}

	/// Sets an explicit group.
	pub fn with_group(mut self, group: impl Into<String>) -> Self {
		self.group = Some(group.into());

		self
	}

	/// Restricts the rule to some HTTP methods.
	pub fn with_method(mut self, method: impl Into<MethodFilter>) -> Self {
		self.method = method.into();

		self
	}

	/// Chooses between blocking and annotate-only mode.
	pub fn with_block(mut self, block: bool) -> Self {
		self.block = block;

		self
	}

	/// Group for this rule when guarding the operation named `operation_name`.
	pub fn group_for(&self, operation_name: &str) -> String {
		match &self.group {
			Some(group) => group.clone(),
			None => derive_group(operation_name),
		}
	}
}

/// Turns a Rust item path into a dotted group name.
pub fn derive_group(operation_name: &str) -> String {
	operation_name.replace("::", ".")
}

/// Seconds per unit for the shared `s`/`m`/`h`/`d` period letters.
pub(crate) fn unit_seconds(unit: char) -> Option<u64> {
	match unit {
		's' => Some(1),
		'm' => Some(60),
		'h' => Some(60 * 60),
		'd' => Some(24 * 60 * 60),
		_ => None,
	}
}

/// Splits the leading ASCII digits off `raw`.
pub(crate) fn split_digits(raw: &str) -> (&str, &str) {
	let end = raw.find(|c: char| !c.is_ascii_digit()).unwrap_or(raw.len());

	raw.split_at(end)
}
