//! Monotonic clock source for enable timestamps
//!
//! The driver compares device sample timestamps against the instant a channel
//! was enabled, so both must come from the same monotonic timeline. The clock
//! is injectable (`SpandaIO::with_clock`) so integrations can supply the
//! timeline the device stamps with, and tests can control time directly.

use std::sync::OnceLock;
use std::time::Instant;

/// Clock function signature: nanoseconds on a monotonic timeline
pub type ClockFn = fn() -> i64;

static EPOCH: OnceLock<Instant> = OnceLock::new();

/// Default clock: monotonic nanoseconds, zero at first use
pub fn monotonic_ns() -> i64 {
    EPOCH.get_or_init(Instant::now).elapsed().as_nanos() as i64
}
