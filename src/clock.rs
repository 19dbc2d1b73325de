//! Wall-clock port shared by the in-memory cache and oracle.
//!
//! Both TTL expiry and window alignment read time through [`Clock`], so tests can drive them
//! with a [`ManualClock`] instead of sleeping.

// self
use crate::_prelude::*;

/// Source of the current time.
pub trait Clock
where
	Self: Send + Sync + Debug,
{
	/// Returns the current instant.
	fn now(&self) -> OffsetDateTime;
}

/// Clock backed by the system's UTC time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;
impl Clock for SystemClock {
	fn now(&self) -> OffsetDateTime {
		OffsetDateTime::now_utc()
	}
}

/// Clock whose time only moves when told to.
///
/// Clones share the same instant, so a test can keep one handle while the cache and oracle hold
/// others.
#[derive(Clone, Debug)]
pub struct ManualClock(Arc<Mutex<OffsetDateTime>>);
impl ManualClock {
	/// Creates a clock frozen at `start`.
	pub fn new(start: OffsetDateTime) -> Self {
		Self(Arc::new(Mutex::new(start)))
	}

	/// Moves the clock forward.
	pub fn advance(&self, by: Duration) {
		*self.0.lock() += by;
	}

	/// Jumps to a specific instant.
	pub fn set(&self, instant: OffsetDateTime) {
		*self.0.lock() = instant;
	}
}
impl Clock for ManualClock {
	fn now(&self) -> OffsetDateTime {
		*self.0.lock()
	}
}
