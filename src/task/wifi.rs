//! Wireless link bring-up
//!
//! Powers up the on-board CYW43439, joins the configured network and waits
//! for a DHCP lease. The chip runner and the IP stack runner each get their
//! own task; after this returns, the stack is ready for TCP.
//!
//! # Radio firmware
//! The CYW43439 firmware blobs are not part of this repository. Copy
//! `43439A0.bin` and `43439A0_clm.bin` from the `cyw43-firmware/` directory
//! of the embassy repository into `cyw43-firmware/` before building.

use cyw43::JoinOptions;
use cyw43_pio::{DEFAULT_CLOCK_DIVIDER, PioSpi};
use defmt::info;
use embassy_executor::Spawner;
use embassy_net::{Stack, StackResources};
use embassy_rp::gpio::{Level, Output};
use embassy_rp::peripherals::{DMA_CH0, PIO0};
use embassy_rp::pio::Pio;
use embassy_time::{Delay, with_timeout};
use fwe_node_core::bootstrap::{Backoff, RetryPolicy};
use fwe_node_core::{SetupError, SetupErrorKind, SetupStage};
use static_cell::StaticCell;

use crate::system::config::{DHCP_TIMEOUT, WIFI_JOIN_ATTEMPTS, WIFI_PASSWORD, WIFI_SSID};
use crate::system::resources::{Irqs, WifiResources};
use crate::task::net::net_task;

/// PIO-driven SPI link to the radio
type WifiSpi = PioSpi<'static, PIO0, 0, DMA_CH0>;

/// Seed for the IP stack (local ports, TCP sequence numbers)
const NET_SEED: u64 = 0x5a17_2b34_d099_ee11;

/// Sockets the stack can hold: one TCP connection plus DHCP and DNS
const STACK_SOCKETS: usize = 3;

/// Pause between join attempts
const JOIN_RETRY_DELAY_MS: u32 = 2000;

/// Drives the CYW43439 bus protocol
#[embassy_executor::task]
async fn cyw43_task(runner: cyw43::Runner<'static, Output<'static>, WifiSpi>) -> ! {
    runner.run().await
}

/// Brings the wireless link up and returns the configured IP stack.
pub async fn connect(spawner: Spawner, r: WifiResources) -> Result<Stack<'static>, SetupError> {
    let fw = include_bytes!("../../cyw43-firmware/43439A0.bin");
    let clm = include_bytes!("../../cyw43-firmware/43439A0_clm.bin");

    let pwr = Output::new(r.pwr, Level::Low);
    let cs = Output::new(r.cs, Level::High);
    let mut pio = Pio::new(r.pio, Irqs);
    let spi = PioSpi::new(
        &mut pio.common,
        pio.sm0,
        DEFAULT_CLOCK_DIVIDER,
        pio.irq0,
        cs,
        r.dio,
        r.clk,
        r.dma,
    );

    static STATE: StaticCell<cyw43::State> = StaticCell::new();
    let state = STATE.init(cyw43::State::new());
    let (net_device, mut control, runner) = cyw43::new(state, pwr, spi, fw).await;
    spawner.spawn(cyw43_task(runner)).unwrap();

    control.init(clm).await;
    control
        .set_power_management(cyw43::PowerManagementMode::PowerSave)
        .await;

    static RESOURCES: StaticCell<StackResources<STACK_SOCKETS>> = StaticCell::new();
    let (stack, runner) = embassy_net::new(
        net_device,
        embassy_net::Config::dhcpv4(Default::default()),
        RESOURCES.init(StackResources::new()),
        NET_SEED,
    );
    spawner.spawn(net_task(runner)).unwrap();

    let mut backoff = Backoff::new(RetryPolicy {
        max_attempts: WIFI_JOIN_ATTEMPTS,
        delay_ms: JOIN_RETRY_DELAY_MS,
    });
    loop {
        info!("Joining {} (attempt {})", WIFI_SSID, backoff.attempt());
        match control
            .join(WIFI_SSID, JoinOptions::new(WIFI_PASSWORD.as_bytes()))
            .await
        {
            Ok(()) => break,
            Err(err) => {
                info!("Join failed with status {}", err.status);
                if !backoff.failed(&mut Delay).await {
                    return Err(backoff.exhausted(SetupStage::Transport));
                }
            }
        }
    }

    info!("Waiting for DHCP lease");
    with_timeout(DHCP_TIMEOUT, stack.wait_config_up())
        .await
        .map_err(|_| SetupError::new(SetupStage::Transport, SetupErrorKind::Timeout))?;
    if let Some(config) = stack.config_v4() {
        info!("Wi-Fi connected, address {}", config.address);
    }

    Ok(stack)
}
