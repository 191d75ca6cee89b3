//! Configuration module for the search sync service.

mod dependencies;
mod settings;

pub use dependencies::Dependencies;
pub use settings::{
    DocServiceSettings, KafkaSettings, OpenSearchSettings, Settings, SyncSettings,
};
