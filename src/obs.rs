//! Optional observability helpers for guards.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to run each guarded call inside a `banlimit.guard` span (fields `group` and
//!   `stage`) and to emit events when bans are installed or callers are blocked.
//! - Enable `metrics` to increment the `banlimit_guard_total` counter for every guarded call,
//!   labeled by `outcome`.

mod metrics;
mod tracing;

pub use self::{metrics::*, tracing::*};

// self
use crate::_prelude::*;

/// Terminal state of one guarded call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GuardOutcome {
	/// Guards are globally disabled.
	Disabled,
	/// The rate resolved to "never limit".
	Unlimited,
	/// Within the rate (in annotate-only mode a live ban alone does not deny).
	Allowed,
	/// Over the rate in annotate-only mode; the request was flagged and the call proceeded.
	Annotated,
	/// Denied by a ban that was already in place.
	BlockedByBan,
	/// Denied by a violation on this very call.
	BlockedByViolation,
	/// Resolution or storage failed before a decision was reached.
	Failed,
}
impl GuardOutcome {
	/// Every outcome, in declaration order.
	pub const ALL: [GuardOutcome; 7] = [
		GuardOutcome::Disabled,
		GuardOutcome::Unlimited,
		GuardOutcome::Allowed,
		GuardOutcome::Annotated,
		GuardOutcome::BlockedByBan,
		GuardOutcome::BlockedByViolation,
		GuardOutcome::Failed,
	];

	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			GuardOutcome::Disabled => "disabled",
			GuardOutcome::Unlimited => "unlimited",
			GuardOutcome::Allowed => "allowed",
			GuardOutcome::Annotated => "annotated",
			GuardOutcome::BlockedByBan => "blocked_by_ban",
			GuardOutcome::BlockedByViolation => "blocked_by_violation",
			GuardOutcome::Failed => "failed",
		}
	}

	/// Whether the protected operation runs after this outcome.
	pub const fn proceeds(self) -> bool {
		matches!(
			self,
			GuardOutcome::Disabled
				| GuardOutcome::Unlimited
				| GuardOutcome::Allowed
				| GuardOutcome::Annotated
		)
	}

	pub(crate) const fn index(self) -> usize {
		self as usize
	}
}
impl Display for GuardOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
