// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::obs::GuardOutcome;

/// Decision tallies for every guard built from one limiter, kept per [`GuardOutcome`].
#[derive(Debug, Default)]
pub struct GuardMetrics {
	outcomes: [AtomicU64; GuardOutcome::ALL.len()],
	bans_installed: AtomicU64,
}
impl GuardMetrics {
	/// Calls that ended in `outcome`.
	pub fn outcome(&self, outcome: GuardOutcome) -> u64 {
		self.outcomes[outcome.index()].load(Ordering::Relaxed)
	}

	/// Every guarded call, whatever its outcome.
	pub fn checks(&self) -> u64 {
		GuardOutcome::ALL.iter().map(|o| self.outcome(*o)).sum()
	}

	/// Calls turned away by a ban or a fresh violation.
	pub fn denied(&self) -> u64 {
		GuardOutcome::ALL
			.iter()
			.filter(|o| !o.proceeds() && **o != GuardOutcome::Failed)
			.map(|o| self.outcome(*o))
			.sum()
	}

	/// Ban records this process created; losing an add race does not count.
	pub fn bans_installed(&self) -> u64 {
		self.bans_installed.load(Ordering::Relaxed)
	}

	pub(crate) fn record(&self, outcome: GuardOutcome) {
		self.outcomes[outcome.index()].fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_ban_installed(&self) {
		self.bans_installed.fetch_add(1, Ordering::Relaxed);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn denied_counts_only_blocking_outcomes() {
		let metrics = GuardMetrics::default();

		for outcome in GuardOutcome::ALL {
			metrics.record(outcome);
		}

		metrics.record(GuardOutcome::BlockedByBan);

		assert_eq!(metrics.checks(), 8);
		assert_eq!(metrics.denied(), 3);
		assert_eq!(metrics.outcome(GuardOutcome::BlockedByBan), 2);
		assert_eq!(metrics.outcome(GuardOutcome::Failed), 1);
	}
}
