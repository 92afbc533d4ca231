//! Messaging transport collaborator

use crate::fmt::Loggable;
use crate::msg::Message;
use crate::topic::Publisher;

/// Publish side of the pub/sub bus
///
/// Implementations own connection liveness and reconnects; callers treat
/// every error as soft.
#[allow(async_fn_in_trait)]
pub trait Transport {
    type Error: Loggable;

    /// Fire-and-forget publish of `message` on the publisher's topic.
    async fn publish<M: Message>(&mut self, publisher: &Publisher<M>, message: &M) -> Result<(), Self::Error>;

    /// Processes pending transport work for at most `budget_ms` milliseconds.
    async fn spin_some(&mut self, budget_ms: u64) -> Result<(), Self::Error>;
}
