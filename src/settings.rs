//! Process-wide guard settings, loaded once and handed to [`Banlimiter`](crate::guard::Banlimiter).

// self
use crate::{_prelude::*, error::ConfigError};

/// Immutable settings consumed by every guard built from one limiter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
	/// Master switch; when false every guard marks the request as not limited and passes through.
	pub enable: bool,
	/// Name of the cache (in the [`CacheRegistry`](crate::store::CacheRegistry)) that stores bans.
	pub use_cache: String,
	/// Seconds added to each ban record's TTL beyond the logical ban duration.
	pub expiration_fudge: u64,
}
impl Settings {
	/// Default cache name.
	pub const DEFAULT_CACHE: &'static str = "default";
	/// Default TTL padding in seconds.
	pub const DEFAULT_EXPIRATION_FUDGE: u64 = 5;

	/// Parses settings from a JSON document; missing fields take their defaults.
	pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
		let mut de = serde_json::Deserializer::from_str(raw);

		Ok(serde_path_to_error::deserialize(&mut de)?)
	}

	/// Overrides the master switch.
	pub fn with_enable(mut self, enable: bool) -> Self {
		self.enable = enable;

		self
	}

	/// Selects the cache that backs the ban store.
	pub fn with_cache(mut self, name: impl Into<String>) -> Self {
		self.use_cache = name.into();

		self
	}

	/// Overrides the TTL padding.
	pub fn with_expiration_fudge(mut self, seconds: u64) -> Self {
		self.expiration_fudge = seconds;

		self
	}
}
impl Default for Settings {
	fn default() -> Self {
		Self {
			enable: true,
			use_cache: Self::DEFAULT_CACHE.into(),
			expiration_fudge: Self::DEFAULT_EXPIRATION_FUDGE,
		}
	}
}
