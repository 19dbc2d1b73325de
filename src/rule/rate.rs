//! Rate literals (`"5/10m"`, `(5, 600)`) and per-request rate resolution.

// self
use crate::{
	_prelude::*,
	error::ConfigError,
	request::Request,
	rule::{split_digits, unit_seconds},
};

/// Dynamic rate function; receives the resolved group and the request.
pub type RateFn = Arc<dyn Fn(&str, &Request) -> RateValue + Send + Sync>;

/// Parsed `count` per `period` seconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rate {
	/// Calls allowed per window.
	pub count: u64,
	/// Window length in seconds; never zero.
	pub period: u64,
}
impl Rate {
	/// Creates a rate, rejecting a zero-length window.
	pub fn new(count: u64, period: u64) -> Result<Self, ConfigError> {
		if period == 0 {
			return Err(ConfigError::InvalidRate { value: format!("{count}/{period}s") });
		}

		Ok(Self { count, period })
	}
}
impl Display for Rate {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "{}/{}s", self.count, self.period)
	}
}
impl FromStr for Rate {
	type Err = ConfigError;

	/// Parses `<count>/<multiplier?><unit?>`; the unit defaults to seconds and anything after it
	/// is ignored.
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let invalid = || ConfigError::InvalidRate { value: s.to_owned() };
		let (count, rest) = split_digits(s);
		let rest = rest.strip_prefix('/').ok_or_else(invalid)?;

		if count.is_empty() {
			return Err(invalid());
		}

		let count = count.parse::<u64>().map_err(|_| invalid())?;
		let (multiplier, rest) = split_digits(rest);
		let unit = rest.chars().next().and_then(unit_seconds).unwrap_or(1);
		let period = if multiplier.is_empty() {
			unit
		} else {
			multiplier.parse::<u64>().ok().and_then(|m| m.checked_mul(unit)).ok_or_else(invalid)?
		};

		Self::new(count, period).map_err(|_| invalid())
	}
}

/// A concrete rate as written by a rule author or returned by a rate function.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RateValue {
	/// Literal such as `"1/m"`.
	Text(String),
	/// `(count, period_seconds)` pair.
	Pair(u64, u64),
	/// Never limit this call.
	Never,
}
impl RateValue {
	/// Parses the value; `Ok(None)` means the call is never limited.
	pub fn parse(&self) -> Result<Option<Rate>, ConfigError> {
		match self {
			Self::Text(raw) => raw.parse().map(Some),
			Self::Pair(count, period) => Rate::new(*count, *period).map(Some),
			Self::Never => Ok(None),
		}
	}
}
impl From<&str> for RateValue {
	fn from(value: &str) -> Self {
		Self::Text(value.to_owned())
	}
}
impl From<String> for RateValue {
	fn from(value: String) -> Self {
		Self::Text(value)
	}
}
impl From<(u64, u64)> for RateValue {
	fn from((count, period): (u64, u64)) -> Self {
		Self::Pair(count, period)
	}
}
impl<T> From<Option<T>> for RateValue
where
	T: Into<RateValue>,
{
	fn from(value: Option<T>) -> Self {
		value.map_or(Self::Never, Into::into)
	}
}

/// Rate as configured on a rule: fixed, or computed per request.
#[derive(Clone)]
pub enum RateSpec {
	/// Same value for every call.
	Fixed(RateValue),
	/// Evaluated on every call.
	Dynamic(RateFn),
}
impl RateSpec {
	/// A rate that never limits.
	pub fn never() -> Self {
		Self::Fixed(RateValue::Never)
	}

	/// Wraps a closure as a rate function.
	pub fn dynamic<F, V>(f: F) -> Self
	where
		F: 'static + Fn(&str, &Request) -> V + Send + Sync,
		V: Into<RateValue>,
	{
		Self::Dynamic(Arc::new(move |group, request| f(group, request).into()))
	}

	/// Resolves the rate for one call; `Ok(None)` means never limit.
	pub fn resolve(&self, group: &str, request: &Request) -> Result<Option<Rate>, ConfigError> {
		match self {
			Self::Fixed(value) => value.parse(),
			Self::Dynamic(f) => f(group, request).parse(),
		}
	}
}
impl Debug for RateSpec {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::Fixed(value) => f.debug_tuple("Fixed").field(value).finish(),
			Self::Dynamic(_) => f.write_str("Dynamic(<fn>)"),
		}
	}
}
impl From<RateValue> for RateSpec {
	fn from(value: RateValue) -> Self {
		Self::Fixed(value)
	}
}
impl From<&str> for RateSpec {
	fn from(value: &str) -> Self {
		Self::Fixed(value.into())
	}
}
impl From<String> for RateSpec {
	fn from(value: String) -> Self {
		Self::Fixed(value.into())
	}
}
impl From<(u64, u64)> for RateSpec {
	fn from(value: (u64, u64)) -> Self {
		Self::Fixed(value.into())
	}
}
impl From<Option<&str>> for RateSpec {
	fn from(value: Option<&str>) -> Self {
		Self::Fixed(value.into())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn rate(raw: &str) -> Rate {
		raw.parse().expect("Rate fixture should parse.")
	}

	#[test]
	fn literals_normalize_to_seconds() {
		assert_eq!(rate("1/m"), Rate { count: 1, period: 60 });
		assert_eq!(rate("2/1s"), Rate { count: 2, period: 1 });
		assert_eq!(rate("10/d"), Rate { count: 10, period: 86_400 });
		assert_eq!(rate("5/10m"), Rate { count: 5, period: 600 });
		assert_eq!(rate("3/"), Rate { count: 3, period: 1 });
		assert_eq!(rate("0/m").count, 0);
		assert_eq!(rate("5/10m").to_string(), "5/600s");
	}

	#[test]
	fn malformed_literals_are_config_errors() {
		for raw in ["", "m", "/m", "x/m", "1m", "1/0m"] {
			let err = raw.parse::<Rate>().expect_err("Malformed rate should be rejected.");

			assert!(matches!(err, ConfigError::InvalidRate { .. }), "{raw} should be invalid.");
		}
	}

	#[test]
	fn pairs_and_text_agree() {
		let text = RateValue::from("1/m").parse().expect("Text rate should parse.");
		let pair = RateValue::from((1, 60)).parse().expect("Pair rate should parse.");

		assert_eq!(text, pair);
		assert_eq!(RateValue::from(None::<&str>).parse().expect("Never should parse."), None);
		assert!(RateValue::Pair(1, 0).parse().is_err());
	}

	#[test]
	fn dynamic_rates_see_group_and_request() {
		let spec = RateSpec::dynamic(|group: &str, request: &Request| {
			if group == "open" || request.authenticated_user().is_some() {
				None
			} else {
				Some("1/m")
			}
		});
		let request = Request::new(
			"GET",
			Url::parse("https://example.com/").expect("Test URL should parse."),
		);

		assert_eq!(spec.resolve("open", &request).expect("Dynamic rate should resolve."), None);
		assert_eq!(
			spec.resolve("closed", &request).expect("Dynamic rate should resolve."),
			Some(Rate { count: 1, period: 60 })
		);
	}
}
