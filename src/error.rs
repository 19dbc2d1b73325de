//! Guard-level error types shared by key resolution, rule parsing, and ban storage.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Canonical error surfaced by guards.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Rule or settings problem; fatal for the call and never retried.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// The caller is banned or has just been banned.
	#[error(transparent)]
	Blocked(#[from] BlockedError),
	/// The shared cache backing the ban store is missing or failing.
	#[error("{0}")]
	BackendUnavailable(
		#[from]
		#[source]
		crate::store::StoreError,
	),
}
impl Error {
	/// Returns the block payload when this error denies access.
	pub fn as_blocked(&self) -> Option<&BlockedError> {
		match self {
			Self::Blocked(blocked) => Some(blocked),
			_ => None,
		}
	}

	/// Returns true when this error denies access rather than signalling a fault.
	pub fn is_blocked(&self) -> bool {
		matches!(self, Self::Blocked(_))
	}
}

/// Configuration and validation failures raised while resolving a rule.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// Key spec is empty.
	#[error("Ratelimit key must be specified.")]
	MissingKey,
	/// Key spec matches none of the known forms.
	#[error("Could not understand ratelimit key: {key}.")]
	UnrecognizedKey {
		/// Offending key spec.
		key: String,
	},
	/// `accessor:field` key uses an accessor outside the registry.
	#[error("Unknown ratelimit key accessor `{accessor}` in {key}.")]
	UnknownAccessor {
		/// Accessor name.
		accessor: String,
		/// Full key spec.
		key: String,
	},
	/// Dotted key path is not registered.
	#[error("No key function is registered under `{path}`.")]
	UnknownKeyFunction {
		/// Dotted path that missed the registry.
		path: String,
	},
	/// The `ip` family of keys needs a remote address on the request.
	#[error("Request carries no remote address for key `{key}`.")]
	MissingRemoteAddr {
		/// Key spec that required the address.
		key: String,
	},
	/// Rate literal cannot be parsed.
	#[error("Rate `{value}` is invalid; expected `<count>/<period>`.")]
	InvalidRate {
		/// Offending literal.
		value: String,
	},
	/// Ban literal cannot be parsed.
	#[error("Ban duration `{value}` is invalid; expected `<amount><unit>`.")]
	InvalidBanDuration {
		/// Offending literal.
		value: String,
	},
	/// Ban literal uses a unit other than s, m, h, or d.
	#[error("Ban duration unit `{unit}` is not one of s, m, h, d.")]
	UnknownBanUnit {
		/// Offending unit.
		unit: char,
	},
	/// Settings document failed to deserialize.
	#[error("Settings are invalid at `{path}`.")]
	Settings {
		/// Path of the failing field.
		path: String,
		/// Underlying parser failure.
		#[source]
		source: serde_json::Error,
	},
}
impl From<serde_path_to_error::Error<serde_json::Error>> for ConfigError {
	fn from(e: serde_path_to_error::Error<serde_json::Error>) -> Self {
		let path = e.path().to_string();

		Self::Settings { path, source: e.into_inner() }
	}
}

/// Denial payload carried by [`Error::Blocked`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
#[error("Request blocked for {ban_seconds}s ({key}={identity}).")]
pub struct BlockedError {
	/// Label of the key spec that identified the caller.
	pub key: String,
	/// Resolved identity of the caller.
	pub identity: String,
	/// Ban duration in seconds.
	pub ban_seconds: u64,
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::store::StoreError;

	#[test]
	fn store_error_converts_into_backend_unavailable_with_source() {
		let store_error = StoreError::UnknownCache { name: "fake-cache".into() };
		let error: Error = store_error.clone().into();

		assert!(matches!(error, Error::BackendUnavailable(_)));
		assert!(error.to_string().contains("fake-cache"));

		let source = StdError::source(&error)
			.expect("Guard error should expose the original store error as its source.");

		assert_eq!(source.to_string(), store_error.to_string());
	}

	#[test]
	fn blocked_error_exposes_payload() {
		let error: Error =
			BlockedError { key: "ip".into(), identity: "1.2.3.4".into(), ban_seconds: 60 }.into();

		assert!(error.is_blocked());
		assert_eq!(error.as_blocked().map(|b| b.ban_seconds), Some(60));
		assert_eq!(error.to_string(), "Request blocked for 60s (ip=1.2.3.4).");
	}

	#[test]
	fn settings_errors_keep_field_path() {
		let mut de = serde_json::Deserializer::from_str("{\"enable\":\"yes\"}");
		let err = serde_path_to_error::deserialize::<_, crate::settings::Settings>(&mut de)
			.expect_err("A string enable flag should be rejected.");
		let config = ConfigError::from(err);

		assert!(matches!(&config, ConfigError::Settings { path, .. } if path == "enable"));
	}
}
