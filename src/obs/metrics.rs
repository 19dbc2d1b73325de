// self
use crate::obs::GuardOutcome;

/// Records a guard outcome via the global metrics recorder (when enabled).
pub fn record_guard_outcome(outcome: GuardOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("banlimit_guard_total", "outcome" => outcome.as_str()).increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = outcome;
	}
}
