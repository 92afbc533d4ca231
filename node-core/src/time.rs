//! Message timestamps

/// `builtin_interfaces/Time`: seconds plus nanosecond remainder
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Time {
    pub sec: i32,
    pub nanosec: u32,
}

impl Time {
    /// Builds a stamp from milliseconds since boot.
    ///
    /// The seconds field saturates at `i32::MAX` (about 68 years of uptime).
    pub fn from_millis(ms: u64) -> Self {
        let sec = (ms / 1000).min(i32::MAX as u64) as i32;
        let nanosec = ((ms % 1000) * 1_000_000) as u32;
        Self { sec, nanosec }
    }
}

/// Milliseconds since boot
///
/// Any `Fn() -> u64` is a clock, so the firmware can pass a plain function.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

impl<F: Fn() -> u64> Clock for F {
    fn now_ms(&self) -> u64 {
        self()
    }
}
