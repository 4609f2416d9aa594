//! Scan latch: one accepted scan at a time.

use checkin_core::types::Ticket;
use std::sync::atomic::{AtomicBool, Ordering};

/// Gate that lets a single scan through until it is released
///
/// Cameras report the same code many times per second. The first report
/// latches; later reports are ignored until the lookup fails or staff come
/// back to the scanner and call [`ScanLatch::reset`].
#[derive(Debug, Default)]
pub struct ScanLatch {
    latched: AtomicBool,
}

impl ScanLatch {
    /// Creates an open latch
    #[must_use]
    pub const fn new() -> Self {
        Self {
            latched: AtomicBool::new(false),
        }
    }

    /// Latch if open; `false` when a scan is already in flight
    pub fn try_latch(&self) -> bool {
        self.latched
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Re-open the latch
    pub fn reset(&self) {
        self.latched.store(false, Ordering::Release);
    }

    /// Whether a scan is being handled
    #[must_use]
    pub fn is_latched(&self) -> bool {
        self.latched.load(Ordering::Acquire)
    }
}

/// Result of feeding a scan to the session
#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome {
    /// Another scan is still being handled
    Ignored,
    /// The scanned ticket
    Found(Ticket),
}
