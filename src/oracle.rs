//! Rate oracle contract: the counting side that decides whether a call is over its rate.
//!
//! Guards never count requests themselves. They resolve the rule, hand a [`RateCheck`] to the
//! oracle, and act on its verdict. The oracle owns its counters and their storage.

pub mod memory;

pub use memory::MemoryRateOracle;

// self
use crate::{
	_prelude::*,
	request::Request,
	rule::{KeySpec, MethodFilter, Rate},
};

/// Everything an oracle needs to count one call.
#[derive(Clone, Copy, Debug)]
pub struct RateCheck<'a> {
	/// Resolved rule group.
	pub group: &'a str,
	/// Key spec as configured on the rule.
	pub key: &'a KeySpec,
	/// Identity resolved from `key` for this request.
	pub identity: &'a str,
	/// Rate resolved for this request.
	pub rate: Rate,
	/// Methods the rule applies to; calls outside it must neither count nor limit.
	pub method: &'a MethodFilter,
	/// The request being evaluated.
	pub request: &'a Request,
	/// Whether this call consumes from the budget.
	pub increment: bool,
}

/// Counting strategy consulted by guards.
pub trait RateOracle
where
	Self: Send + Sync,
{
	/// Returns true when the call exceeds its rate, updating counters when `increment` is set.
	fn evaluate(&self, check: &RateCheck<'_>) -> Result<bool>;
}
