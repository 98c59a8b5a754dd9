//! Time utilities and the injectable clock.
//!
//! Internal timestamps are Unix epoch microseconds (u64). Anchor events
//! carry them rendered as RFC 3339 UTC strings with microsecond precision.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Source of the current time.
///
/// Injected into gates and chains so tests can pin timestamps and
/// check exact digests.
pub trait Clock: Send + Sync {
    /// Current time as microseconds since the Unix epoch.
    fn now_micros(&self) -> u64;
}

/// Wall-clock time from the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_micros(&self) -> u64 {
        now_micros()
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    micros: AtomicU64,
}

impl ManualClock {
    /// Create a clock frozen at `micros`.
    pub fn new(micros: u64) -> Self {
        Self {
            micros: AtomicU64::new(micros),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, micros: u64) {
        self.micros.fetch_add(micros, Ordering::SeqCst);
    }

    /// Jump to an absolute time.
    pub fn set(&self, micros: u64) {
        self.micros.store(micros, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_micros(&self) -> u64 {
        self.micros.load(Ordering::SeqCst)
    }
}

/// Shared handle to the system clock.
pub fn system_clock() -> Arc<dyn Clock> {
    Arc::new(SystemClock)
}

/// Return the current time as microseconds since Unix epoch.
///
/// A clock set before the epoch reads as zero.
pub fn now_micros() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_micros() as u64)
        .unwrap_or(0)
}

/// Last instant with a four-digit year, `9999-12-31T23:59:59.999999Z`.
pub const MAX_RFC3339_MICROS: u64 = 253_402_300_799_999_999;

const MAX_RFC3339: &str = "9999-12-31T23:59:59.999999Z";

/// Convert microseconds to an RFC 3339 UTC string, e.g.
/// `2026-10-19T12:00:00.000000Z`.
///
/// Values past [`MAX_RFC3339_MICROS`] saturate to that instant.
pub fn micros_to_rfc3339(micros: u64) -> String {
    let micros = micros.min(MAX_RFC3339_MICROS);
    let secs = (micros / 1_000_000) as i64;
    let nsecs = ((micros % 1_000_000) * 1000) as u32;
    chrono::DateTime::from_timestamp(secs, nsecs)
        .map(|dt| dt.to_rfc3339_opts(chrono::SecondsFormat::Micros, true))
        .unwrap_or_else(|| MAX_RFC3339.to_string())
}
