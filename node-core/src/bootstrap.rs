//! Set-up sequencing helpers
//!
//! Bounded retry for the steps that may need a few attempts (the broker
//! session), plus creation of the node's publishers.

use embedded_hal_async::delay::DelayNs;

use crate::config::NodeConfig;
use crate::error::{SetupError, SetupErrorKind, SetupStage};
use crate::msg::{Float32, Int32};
use crate::telemetry::TelemetryTick;
use crate::throttle::ImagePublisher;
use crate::topic::Publisher;

/// How often and how patiently a set-up step is retried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RetryPolicy {
    /// Attempts in total, including the first
    pub max_attempts: u8,
    /// Pause between attempts
    pub delay_ms: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            delay_ms: 2000,
        }
    }
}

/// Tracks attempts of one retried step
///
/// ```rust,ignore
/// let mut backoff = Backoff::new(policy);
/// let session = loop {
///     match connect().await {
///         Ok(s) => break s,
///         Err(e) => {
///             if !backoff.failed(&mut delay).await {
///                 return Err(backoff.exhausted(SetupStage::Session));
///             }
///         }
///     }
/// };
/// ```
pub struct Backoff {
    policy: RetryPolicy,
    attempt: u8,
}

impl Backoff {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy, attempt: 1 }
    }

    /// Number of the attempt in progress (1-based)
    pub fn attempt(&self) -> u8 {
        self.attempt
    }

    /// Records a failed attempt.
    ///
    /// Waits the configured delay and returns `true` when another attempt is
    /// allowed; returns `false` right away once the budget is spent.
    pub async fn failed<D: DelayNs>(&mut self, delay: &mut D) -> bool {
        warn!("Attempt {}/{} failed", self.attempt, self.policy.max_attempts);
        if self.attempt >= self.policy.max_attempts {
            return false;
        }
        delay.delay_ms(self.policy.delay_ms).await;
        self.attempt += 1;
        true
    }

    /// Fatal error for a step whose attempts are all used up
    pub fn exhausted(&self, stage: SetupStage) -> SetupError {
        error!("{:?} failed after {} attempts", stage, self.attempt);
        SetupError::new(stage, SetupErrorKind::RetriesExhausted(self.attempt))
    }
}

/// Validates the node name, which doubles as the MQTT client identifier.
///
/// MQTT 3.1.1 servers must accept 1..=23 characters from `[0-9a-zA-Z]`;
/// underscores are accepted by every broker in use, so they are allowed too.
pub fn validate_node_name(name: &str) -> Result<(), SetupError> {
    let valid = (1..=23).contains(&name.len()) && name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_');
    if valid {
        Ok(())
    } else {
        Err(SetupError::new(SetupStage::Node, SetupErrorKind::InvalidNodeName))
    }
}

/// Creates the telemetry publishers and the image publisher.
pub fn create_publishers(config: &NodeConfig) -> Result<(TelemetryTick, ImagePublisher), SetupError> {
    let counter = Publisher::<Int32>::new(config.int32_topic)?;
    info!("Int32 publisher created: {}", config.int32_topic);
    let speed = Publisher::<Float32>::new(config.speed_topic)?;
    info!("Speed publisher created: {}", config.speed_topic);
    let image = ImagePublisher::new(config.image_topic)?;
    info!("CompressedImage publisher created: {}", config.image_topic);
    Ok((TelemetryTick::new(counter, speed), image))
}
