//! Ban duration literals (`"60s"`, `"2m"`) and per-request resolution.

// self
use crate::{
	_prelude::*,
	error::ConfigError,
	request::Request,
	rule::{split_digits, unit_seconds},
};

/// Dynamic ban function; receives the resolved group and the request and returns a literal.
pub type BanFn = Arc<dyn Fn(&str, &Request) -> String + Send + Sync>;

/// Ban duration as configured on a rule.
#[derive(Clone)]
pub enum BanSpec {
	/// Literal such as `"60s"`.
	Fixed(String),
	/// Evaluated on every call.
	Dynamic(BanFn),
}
impl BanSpec {
	/// Wraps a closure as a ban function.
	pub fn dynamic<F>(f: F) -> Self
	where
		F: 'static + Fn(&str, &Request) -> String + Send + Sync,
	{
		Self::Dynamic(Arc::new(f))
	}

	/// Resolves the ban duration in seconds for one call.
	pub fn resolve(&self, group: &str, request: &Request) -> Result<u64, ConfigError> {
		match self {
			Self::Fixed(raw) => parse_ban_duration(raw),
			Self::Dynamic(f) => parse_ban_duration(&f(group, request)),
		}
	}
}
impl Debug for BanSpec {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::Fixed(raw) => f.debug_tuple("Fixed").field(raw).finish(),
			Self::Dynamic(_) => f.write_str("Dynamic(<fn>)"),
		}
	}
}
impl From<&str> for BanSpec {
	fn from(value: &str) -> Self {
		Self::Fixed(value.to_owned())
	}
}
impl From<String> for BanSpec {
	fn from(value: String) -> Self {
		Self::Fixed(value)
	}
}

/// Parses `<amount><unit>` into seconds.
///
/// The amount is leading digits and the unit the single lowercase letter after them; anything
/// following the unit is ignored.
pub fn parse_ban_duration(raw: &str) -> Result<u64, ConfigError> {
	let invalid = || ConfigError::InvalidBanDuration { value: raw.to_owned() };
	let (amount, rest) = split_digits(raw);
	let unit = rest.chars().next().filter(char::is_ascii_lowercase).ok_or_else(invalid)?;
	let factor = unit_seconds(unit).ok_or(ConfigError::UnknownBanUnit { unit })?;

	amount.parse::<u64>().ok().and_then(|n| n.checked_mul(factor)).ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn literals_convert_to_seconds() {
		assert_eq!(parse_ban_duration("60s").expect("60s should parse."), 60);
		assert_eq!(parse_ban_duration("2m").expect("2m should parse."), 120);
		assert_eq!(parse_ban_duration("1h").expect("1h should parse."), 3_600);
		assert_eq!(parse_ban_duration("3d").expect("3d should parse."), 259_200);
		assert_eq!(parse_ban_duration("10sec").expect("Trailing text is ignored."), 10);
		assert_eq!(parse_ban_duration("0s").expect("Zero is allowed."), 0);
	}

	#[test]
	fn unknown_units_and_malformed_literals_fail_differently() {
		assert!(matches!(parse_ban_duration("5x"), Err(ConfigError::UnknownBanUnit { unit: 'x' })));
		assert!(matches!(parse_ban_duration("x"), Err(ConfigError::UnknownBanUnit { unit: 'x' })));

		for raw in ["", "60", "m", "5M", " 5s", "99999999999999999999s"] {
			assert!(
				matches!(parse_ban_duration(raw), Err(ConfigError::InvalidBanDuration { .. })),
				"{raw:?} should be malformed."
			);
		}
	}

	#[test]
	fn dynamic_bans_are_resolved_per_request() {
		let spec = BanSpec::dynamic(|group, request| {
			if request.header("x-repeat").is_some() { "1h".into() } else { format!("{}s", group.len()) }
		});
		let url = Url::parse("https://example.com/").expect("Test URL should parse.");
		let plain = Request::new("GET", url.clone());
		let repeat = Request::new("GET", url).with_header("X-Repeat", "1");

		assert_eq!(spec.resolve("abcd", &plain).expect("Dynamic ban should resolve."), 4);
		assert_eq!(spec.resolve("abcd", &repeat).expect("Dynamic ban should resolve."), 3_600);
	}
}
