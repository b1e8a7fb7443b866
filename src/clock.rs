//! Monotonic clock readings carried in probe payloads.
//!
//! A reading is the number of seconds since the first call in this process. It
//! only means something to the process that produced it, so round trip times
//! computed from an echoed reading are valid because sender and receiver are
//! the same process. Do not compare readings across hosts or processes.

use std::sync::OnceLock;
use std::time::Instant;

static EPOCH: OnceLock<Instant> = OnceLock::new();

pub fn this_instant() -> f64 {
    EPOCH.get_or_init(Instant::now).elapsed().as_secs_f64()
}

/// Milliseconds between an echoed reading and now.
pub fn elapsed_ms(sent: f64, received: f64) -> f64 {
    (received - sent) * 1000.0
}
