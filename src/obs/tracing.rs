// self
use crate::_prelude::*;

/// A span builder used by guards.
#[derive(Clone, Debug)]
pub struct GuardSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl GuardSpan {
	/// Creates a new span tagged with the rule group and stage.
	pub fn new(group: &str, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("banlimit.guard", group, stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (group, stage);

			Self {}
		}
	}

	/// Enters the span for the rest of the guarded call.
	pub fn entered(self) -> GuardSpanGuard {
		#[cfg(feature = "tracing")]
		{
			GuardSpanGuard { guard: self.span.entered() }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = self;

			GuardSpanGuard {}
		}
	}
}

/// RAII guard returned by [`GuardSpan::entered`].
pub struct GuardSpanGuard {
	#[cfg(feature = "tracing")]
	#[allow(dead_code)]
	guard: tracing::span::EnteredSpan,
}
impl Debug for GuardSpanGuard {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("GuardSpanGuard(..)")
	}
}

/// Emits an event for a freshly installed ban.
pub fn trace_ban_installed(identity: &str, ban_seconds: u64, created: bool) {
	#[cfg(feature = "tracing")]
	{
		if created {
			tracing::warn!(identity, ban_seconds, "caller banned");
		} else {
			tracing::debug!(identity, ban_seconds, "ban already in place");
		}
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (identity, ban_seconds, created);
	}
}

/// Emits an event for a denied call.
pub fn trace_blocked(identity: &str, ban_seconds: u64, preexisting: bool) {
	#[cfg(feature = "tracing")]
	{
		tracing::info!(identity, ban_seconds, preexisting, "call blocked");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (identity, ban_seconds, preexisting);
	}
}
