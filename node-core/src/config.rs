//! Node configuration
//!
//! Every tunable of the node in one place. `NodeConfig::default()` yields the
//! values the deployed camera node runs with.

use core::net::Ipv4Addr;

use crate::bootstrap::RetryPolicy;
use crate::error::{SetupError, SetupErrorKind, SetupStage};

/// Node name, also used as the MQTT client identifier
pub const NODE_NAME: &str = "fwe_node";

/// Counter topic (`std_msgs/Int32`)
pub const INT32_TOPIC: &str = "/fwe_topic";

/// Speed topic (`std_msgs/Float32`)
pub const SPEED_TOPIC: &str = "/ego_vehicle/speedometer";

/// Camera topic (`sensor_msgs/CompressedImage`)
pub const IMAGE_TOPIC: &str = "/ego_vehicle/rgb_front/image_compressed";

/// Largest frame that is still forwarded (100 KiB)
pub const FRAME_CEILING: usize = 102_400;

/// A frame is published on every n-th tick
pub const FRAME_PUBLISH_DIVISOR: u32 = 5;

/// Broker port used when none is configured
pub const DEFAULT_AGENT_PORT: u16 = 1883;

/// Where the broker (the bus agent) listens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentAddress {
    pub ip: Ipv4Addr,
    pub port: u16,
}

impl AgentAddress {
    /// Parses the build-time address settings; an empty port means [`DEFAULT_AGENT_PORT`].
    pub fn parse(ip: &str, port: &str) -> Result<Self, SetupError> {
        let invalid = SetupError::new(SetupStage::Transport, SetupErrorKind::InvalidAddress);
        let ip = ip.trim().parse::<Ipv4Addr>().map_err(|_| invalid)?;
        let port = match port.trim() {
            "" => DEFAULT_AGENT_PORT,
            p => p.parse::<u16>().ok().filter(|&p| p != 0).ok_or(invalid)?,
        };
        Ok(Self { ip, port })
    }
}

/// Complete node configuration
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NodeConfig {
    /// Node name / MQTT client id
    pub node_name: &'static str,
    /// Counter topic
    pub int32_topic: &'static str,
    /// Speed topic
    pub speed_topic: &'static str,
    /// Image topic
    pub image_topic: &'static str,
    /// Loop period in milliseconds
    pub tick_period_ms: u64,
    /// Time slice handed to the transport on every tick, in milliseconds
    pub spin_budget_ms: u64,
    /// Frame publish divisor (publish when `counter % divisor == 0`)
    pub frame_publish_divisor: u32,
    /// Frames larger than this are dropped
    pub frame_ceiling: usize,
    /// `header.frame_id` of published images
    pub frame_id: &'static str,
    /// `format` of published images
    pub image_format: &'static str,
    /// MQTT keep-alive in seconds
    pub keep_alive_secs: u16,
    /// Retry policy for the broker session set-up
    pub session_retry: RetryPolicy,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            node_name: NODE_NAME,
            int32_topic: INT32_TOPIC,
            speed_topic: SPEED_TOPIC,
            image_topic: IMAGE_TOPIC,
            tick_period_ms: 1000,
            spin_budget_ms: 100,
            frame_publish_divisor: FRAME_PUBLISH_DIVISOR,
            frame_ceiling: FRAME_CEILING,
            frame_id: "camera",
            image_format: "jpeg",
            keep_alive_secs: 60,
            session_retry: RetryPolicy::default(),
        }
    }
}
