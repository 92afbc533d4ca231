//! Fatal set-up errors
//!
//! A failed set-up step leaves the node without a usable transport, camera
//! or publisher. The error is reported over RTT for a while so an attached
//! probe can catch it, then the chip resets and the whole boot sequence
//! starts over.

use defmt::error;
use embassy_time::{Duration, Timer};
use fwe_node_core::SetupError;

/// How often the error is repeated before the reset
const REPORT_COUNT: u32 = 10;

/// Pause between repeated reports
const REPORT_INTERVAL: Duration = Duration::from_secs(1);

/// Reports `err` and resets the chip.
pub async fn halt(err: SetupError) -> ! {
    for _ in 0..REPORT_COUNT {
        error!(
            "Set-up failed in {:?}: {:?} (code {}), resetting",
            err.stage,
            err.kind,
            err.code()
        );
        Timer::after(REPORT_INTERVAL).await;
    }
    cortex_m::peripheral::SCB::sys_reset()
}
