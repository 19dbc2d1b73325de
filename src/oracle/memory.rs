//! Fixed-window in-memory [`RateOracle`].

// crates.io
use sha2::{Digest, Sha256};
// self
use crate::{
	_prelude::*,
	clock::{Clock, SystemClock},
	oracle::{RateCheck, RateOracle},
};

/// Table size at which ended windows are first swept out.
pub const SWEEP_THRESHOLD: usize = 1_024;

#[derive(Clone, Copy, Debug)]
struct Window {
	count: u64,
	ends_at: i64,
}

#[derive(Debug)]
struct WindowTable {
	windows: HashMap<String, Window>,
	sweep_at: usize,
}
impl WindowTable {
	fn sweep(&mut self, now: i64) {
		self.windows.retain(|_, w| w.ends_at > now);
		self.sweep_at = self.windows.len().saturating_mul(2).max(SWEEP_THRESHOLD);
	}
}
impl Default for WindowTable {
	fn default() -> Self {
		Self { windows: HashMap::new(), sweep_at: SWEEP_THRESHOLD }
	}
}

/// Counts calls per (group, rate, identity, methods) in windows aligned to the rate's period.
///
/// A call is limited once the window's count exceeds the rate's allowance, so a `0/<period>`
/// rate limits every counted call. Each counter is reset in place when its window rolls over,
/// and counters left behind by idle callers are swept once the table doubles past its last
/// live size.
#[derive(Clone, Debug)]
pub struct MemoryRateOracle {
	table: Arc<Mutex<WindowTable>>,
	clock: Arc<dyn Clock>,
}
impl MemoryRateOracle {
	/// Creates an oracle that reads time from `clock`.
	pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
		Self { table: Default::default(), clock }
	}

	/// Number of tracked counters, ended or not.
	pub fn len(&self) -> usize {
		self.table.lock().windows.len()
	}

	/// Whether no counters are tracked.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Drops windows that have ended.
	pub fn purge_expired(&self) {
		let now = self.clock.now().unix_timestamp();

		self.table.lock().sweep(now);
	}

	fn counter_key(check: &RateCheck<'_>) -> String {
		let mut hasher = Sha256::new();

		hasher.update(check.group.as_bytes());
		hasher.update(check.rate.to_string().as_bytes());
		hasher.update(check.identity.as_bytes());
		hasher.update(check.method.canonical().as_bytes());

		format!("rl:{:x}", hasher.finalize())
	}
}
impl Default for MemoryRateOracle {
	fn default() -> Self {
		Self::with_clock(Arc::new(SystemClock))
	}
}
impl RateOracle for MemoryRateOracle {
	fn evaluate(&self, check: &RateCheck<'_>) -> Result<bool> {
		if !check.method.matches(&check.request.method) {
			return Ok(false);
		}

		let now = self.clock.now().unix_timestamp();
		let period = i64::try_from(check.rate.period).unwrap_or(i64::MAX);
		let ends_at = (now - now.rem_euclid(period)).saturating_add(period);
		let key = Self::counter_key(check);
		let mut table = self.table.lock();

		if table.windows.len() >= table.sweep_at {
			table.sweep(now);
		}

		let window = table
			.windows
			.entry(key)
			.and_modify(|w| {
				if w.ends_at <= now {
					*w = Window { count: 0, ends_at };
				}
			})
			.or_insert(Window { count: 0, ends_at });

		if check.increment {
			window.count = window.count.saturating_add(1);
		}

		Ok(window.count > check.rate.count)
	}
}
