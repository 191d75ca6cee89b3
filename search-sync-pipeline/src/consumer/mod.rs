//! Consumer module for the search sync pipeline.
//!
//! Provides the change event types and the Kafka source they are read from.

mod kafka_consumer;
mod messages;
mod source;

pub use kafka_consumer::KafkaConsumer;
pub use messages::{ChangeEvent, ChangeKind, EventDecodeError, ReceivedMessage};
pub use source::MessageSource;
