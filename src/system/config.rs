//! Build-time configuration
//!
//! Network credentials and the broker address are baked in from the build
//! environment:
//!
//! ```text
//! WIFI_SSID=... WIFI_PASSWORD=... AGENT_IP=192.168.1.20 [AGENT_PORT=1883] cargo firmware
//! ```
//!
//! `MQTT_USERNAME` / `MQTT_PASSWORD` are optional and only sent when set.

use embassy_time::Duration;

/// Wireless network to join
pub const WIFI_SSID: &str = env!("WIFI_SSID", "Set WIFI_SSID in your environment before building.");

/// Passphrase of the wireless network
pub const WIFI_PASSWORD: &str = env!("WIFI_PASSWORD", "Set WIFI_PASSWORD in your environment before building.");

/// IPv4 address of the broker
pub const AGENT_IP: &str = env!("AGENT_IP", "Set AGENT_IP in your environment before building.");

/// Broker port; empty means the MQTT default
pub const AGENT_PORT: &str = match option_env!("AGENT_PORT") {
    Some(port) => port,
    None => "",
};

/// Broker user name
pub const MQTT_USERNAME: Option<&str> = option_env!("MQTT_USERNAME");

/// Broker password
pub const MQTT_PASSWORD: Option<&str> = option_env!("MQTT_PASSWORD");

/// Pause after power-up before touching the radio
pub const BOOT_DELAY: Duration = Duration::from_secs(2);

/// Pause after the network came up before opening the session
pub const NETWORK_SETTLE_DELAY: Duration = Duration::from_secs(5);

/// Longest wait for a DHCP lease
pub const DHCP_TIMEOUT: Duration = Duration::from_secs(30);

/// Attempts at joining the wireless network
pub const WIFI_JOIN_ATTEMPTS: u8 = 5;

/// Longest wait for the TCP connection to the broker
pub const BROKER_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Camera SPI clock (the ArduCAM Mega accepts up to 8 MHz)
pub const CAMERA_SPI_FREQUENCY: u32 = 8_000_000;

/// Heap for the frame buffer and the outgoing payload (100 KiB ceiling each) plus headroom
pub const HEAP_SIZE: usize = 224 * 1024;
