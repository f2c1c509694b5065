//! Event bridge between the server-rendered and the client-rendered context.
//!
//! Each context owns a [`ConsentEventHandler`]. Events are published on a
//! local `tokio::sync::broadcast` bus and, where the other context needs to
//! know, sent as a [`BridgeMessage`] through the shared [`BroadcastRegistry`].
//! Cross-context delivery is best effort: before the other side has
//! registered (e.g. while prerendering) messages are dropped.

mod event;
mod handler;
mod message;
mod registry;

pub use event::{ConsentChange, ConsentChangedArgs, ConsentEvent};
pub use handler::{ConsentEventHandler, EventSubscription};
pub use message::{BridgeEventName, BridgeMessage, ContextKind};
pub use registry::{BridgeReceiver, BridgeSender, BroadcastRegistry};
