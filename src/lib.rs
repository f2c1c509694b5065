pub mod bridge;
pub mod config;
pub mod cookies;
pub mod dom;
pub mod errors;
pub mod interface;
pub mod preferences;
pub mod service;

/// Capacity of the local event bus and of each bridge inbox.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 128;

pub use bridge::{BroadcastRegistry, ConsentEvent, ConsentEventHandler, ContextKind};
pub use config::{Category, ConsentConfig, Service};
pub use errors::ConsentError;
pub use preferences::CookiePreferences;
pub use service::{ConsentService, ServiceRole};
