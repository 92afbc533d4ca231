//! Steady-state node loop
//!
//! Runs one node tick per period: transport time slice, counter and speed
//! publish, then the frame throttle. Every failure inside a tick is soft and
//! only shows up in the log and the tick report.

use defmt::debug;
use embassy_rp::gpio::Output;
use embassy_time::{Duration, Ticker};
use fwe_node_core::Node;

use crate::task::camera::Camera;
use crate::task::mqtt_transport::MqttTransport;

/// The node with its concrete collaborators
pub type CameraNode = Node<Camera, MqttTransport, fn() -> u64>;

/// Ticks the node forever.
///
/// `_flash_led` is only held so the pin keeps driving the LED off.
#[embassy_executor::task]
pub async fn node_loop(mut node: CameraNode, period: Duration, _flash_led: Output<'static>) {
    let mut ticker = Ticker::every(period);
    loop {
        let report = node.tick().await;
        debug!(
            "Tick {}: counter {}, speed {}, frame {:?}",
            node.throttle().counter(),
            report.telemetry.counter,
            report.telemetry.speed,
            report.frame
        );
        ticker.next().await;
    }
}
