//! Periodic scalar telemetry
//!
//! Every tick republishes the counter and a synthetic speed reading.
//!
//! # Speed test signal
//! ```text
//! speed = 30 + 20 * sin(phase * 0.1)     (10..50 km/h)
//! ```
//! The phase advances by one per tick and wraps to zero once it passes
//! 62.8, roughly ten full periods of the sine.

use crate::msg::{Float32, Int32};
use crate::topic::Publisher;
use crate::transport::Transport;

/// Phase value after which the speed signal restarts
const SPEED_PHASE_WRAP: f32 = 62.8;

/// Speed signal offset (km/h)
const SPEED_OFFSET: f32 = 30.0;

/// Speed signal amplitude (km/h)
const SPEED_AMPLITUDE: f32 = 20.0;

/// Counter and speed publishers plus their state
pub struct TelemetryTick {
    counter_publisher: Publisher<Int32>,
    speed_publisher: Publisher<Float32>,
    counter: Int32,
    speed_phase: f32,
}

/// Values published by one tick
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TelemetrySample {
    pub counter: i32,
    pub speed: f32,
}

impl TelemetryTick {
    pub fn new(counter_publisher: Publisher<Int32>, speed_publisher: Publisher<Float32>) -> Self {
        Self {
            counter_publisher,
            speed_publisher,
            counter: Int32 { data: 0 },
            speed_phase: 0.0,
        }
    }

    /// Publishes the counter, bumps it, then publishes the next speed value.
    ///
    /// Publish failures are logged and otherwise ignored.
    pub async fn tick<T: Transport>(&mut self, transport: &mut T) -> TelemetrySample {
        let counter = self.counter;
        match transport.publish(&self.counter_publisher, &counter).await {
            Ok(()) => debug!("Int32 published: {}", counter.data),
            Err(e) => warn!("Int32 publish failed: {:?}", e),
        }
        self.counter.data = self.counter.data.wrapping_add(1);

        let speed = Float32 {
            data: self.next_speed(),
        };
        match transport.publish(&self.speed_publisher, &speed).await {
            Ok(()) => debug!("Speed published: {} km/h", speed.data),
            Err(e) => warn!("Speed publish failed: {:?}", e),
        }

        TelemetrySample {
            counter: counter.data,
            speed: speed.data,
        }
    }

    fn next_speed(&mut self) -> f32 {
        let speed = SPEED_OFFSET + SPEED_AMPLITUDE * libm::sinf(self.speed_phase * 0.1);
        self.speed_phase += 1.0;
        if self.speed_phase > SPEED_PHASE_WRAP {
            self.speed_phase = 0.0;
        }
        speed
    }
}
