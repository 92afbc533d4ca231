//! Camera node firmware entry point
//!
//! Brings the node up step by step and hands it to the node loop task.
//!
//! # Boot Sequence
//! 1. Boot delay, then Wi-Fi join and DHCP
//! 2. Settle delay, then broker session with bounded retry
//! 3. Publishers for counter, speed and camera frames
//! 4. Camera reset and HD JPEG configuration
//!
//! Any failure along the way is fatal: it is logged and the chip resets.

#![no_std]
#![no_main]

use defmt::{info, warn};
use embassy_executor::Spawner;
use embassy_rp::block::ImageDef;
use embassy_rp::config::Config;
use embassy_rp::gpio::{Level, Output};
use embassy_time::{Delay, Duration, Timer};
use embedded_alloc::Heap;
use fwe_node_core::bootstrap::{self, Backoff};
use fwe_node_core::config::AgentAddress;
use fwe_node_core::mqtt::ConnectOptions;
use fwe_node_core::{Node, NodeConfig, SetupError, SetupStage};
use system::config::{
    AGENT_IP, AGENT_PORT, BOOT_DELAY, HEAP_SIZE, MQTT_PASSWORD, MQTT_USERNAME, NETWORK_SETTLE_DELAY,
};
use system::resources::{AssignedResources, CameraResources, WifiResources};
use task::mqtt_transport::{self, uptime_ms};
use task::node::{node_loop, CameraNode};
use {defmt_rtt as _, panic_probe as _};

/// Firmware image type for bootloader
#[link_section = ".start_block"]
#[used]
pub static IMAGE_DEF: ImageDef = ImageDef::secure_exe();

/// Allocator backing the frame buffer
#[global_allocator]
static HEAP: Heap = Heap::empty();

/// System core modules
mod system;
/// Task implementations
mod task;

/// Firmware entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    init_heap();
    let p = embassy_rp::init(Config::default());
    let r = split_resources!(p);

    // the flash LED stays off for the whole run
    let flash_led = Output::new(r.flash_led.pin, Level::Low);

    let config = NodeConfig::default();
    match bring_up(spawner, r.wifi, r.camera, &config).await {
        Ok(node) => {
            info!("Node {} running", config.node_name);
            spawner
                .spawn(node_loop(node, Duration::from_millis(config.tick_period_ms), flash_led))
                .unwrap();
        }
        Err(err) => system::fatal::halt(err).await,
    }
}

fn init_heap() {
    use core::mem::MaybeUninit;
    static mut HEAP_MEM: [MaybeUninit<u8>; HEAP_SIZE] = [MaybeUninit::uninit(); HEAP_SIZE];
    // SAFETY: runs once, before anything allocates
    unsafe { HEAP.init(core::ptr::addr_of_mut!(HEAP_MEM) as usize, HEAP_SIZE) }
}

/// Runs the boot sequence and returns the ready-to-run node.
async fn bring_up(
    spawner: Spawner,
    wifi: WifiResources,
    camera: CameraResources,
    config: &NodeConfig,
) -> Result<CameraNode, SetupError> {
    Timer::after(BOOT_DELAY).await;

    let agent = AgentAddress::parse(AGENT_IP, AGENT_PORT)?;
    let stack = task::wifi::connect(spawner, wifi).await?;
    Timer::after(NETWORK_SETTLE_DELAY).await;

    bootstrap::validate_node_name(config.node_name)?;
    let options = ConnectOptions {
        client_id: config.node_name,
        keep_alive_secs: config.keep_alive_secs,
        username: MQTT_USERNAME,
        password: MQTT_PASSWORD,
    };
    let mut transport = mqtt_transport::new(stack, agent, options);

    let mut backoff = Backoff::new(config.session_retry);
    loop {
        match transport.open().await {
            Ok(()) => break,
            Err(e) => {
                warn!("Broker session init failed: {:?}", e);
                if !backoff.failed(&mut Delay).await {
                    return Err(backoff.exhausted(SetupStage::Session));
                }
            }
        }
    }

    let (telemetry, image_publisher) = bootstrap::create_publishers(config)?;

    let camera = match task::camera::init(camera).await {
        Ok(camera) => camera,
        Err(err) => {
            transport.shutdown().await;
            return Err(err);
        }
    };

    Ok(Node::new(
        config,
        camera,
        transport,
        uptime_ms as fn() -> u64,
        telemetry,
        image_publisher,
    ))
}
