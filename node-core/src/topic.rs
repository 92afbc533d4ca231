//! Typed publishers
//!
//! A [`Publisher`] binds a bus topic to one message type. It is created once
//! during set-up; the validation done here is what can make publisher
//! creation fail.

use core::marker::PhantomData;

use heapless::String;

use crate::msg::Message;

/// Longest accepted topic name, in bytes
pub const MAX_TOPIC_LEN: usize = 64;

/// Reasons a topic name is rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TopicError {
    Empty,
    TooLong,
    /// Contains an MQTT wildcard (`+` or `#`) or a NUL
    InvalidCharacter,
}

/// Handle for publishing `M` on one topic
#[derive(Debug)]
pub struct Publisher<M> {
    topic: String<MAX_TOPIC_LEN>,
    _message: PhantomData<fn() -> M>,
}

impl<M: Message> Publisher<M> {
    /// Creates a publisher for a bus topic such as `/ego_vehicle/speedometer`.
    pub fn new(topic: &str) -> Result<Self, TopicError> {
        let name = topic.strip_prefix('/').unwrap_or(topic);
        if name.is_empty() {
            return Err(TopicError::Empty);
        }
        if name.chars().any(|c| matches!(c, '+' | '#' | '\0')) {
            return Err(TopicError::InvalidCharacter);
        }
        let mut stored = String::new();
        stored.push_str(name).map_err(|_| TopicError::TooLong)?;
        debug!("publisher created: {} [{}]", stored.as_str(), M::TYPE_NAME);
        Ok(Self {
            topic: stored,
            _message: PhantomData,
        })
    }

    /// Topic name on the broker (bus topic without the leading `/`)
    pub fn topic(&self) -> &str {
        &self.topic
    }
}
