use async_trait::async_trait;

use crate::consumer::ReceivedMessage;
use crate::errors::PipelineError;

/// A durable, ordered source of change event messages.
///
/// Delivery is at-least-once: a message that is read but never committed
/// will be delivered again after a restart.
#[async_trait]
pub trait MessageSource: Send + Sync {
    /// Wait for the next message.
    ///
    /// # Returns
    ///
    /// * `Ok(ReceivedMessage)` - The next message on the subscribed topic
    /// * `Err(PipelineError)` - If reading from the bus failed
    async fn recv(&self) -> Result<ReceivedMessage, PipelineError>;

    /// Mark a message, and everything before it on its partition, as handled.
    async fn commit(&self, message: &ReceivedMessage) -> Result<(), PipelineError>;
}
