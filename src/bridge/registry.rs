use std::collections::HashMap;
use std::sync::Mutex;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::bridge::{BridgeMessage, ContextKind};

pub type BridgeSender = mpsc::Sender<BridgeMessage>;
pub type BridgeReceiver = mpsc::Receiver<BridgeMessage>;

/// Holds at most one receiver per context.
#[derive(Debug, Default)]
pub struct BroadcastRegistry {
    receivers: Mutex<HashMap<ContextKind, BridgeSender>>,
}

impl BroadcastRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn receivers(&self) -> std::sync::MutexGuard<'_, HashMap<ContextKind, BridgeSender>> {
        self.receivers.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Registers the receiver for `context`, replacing any previous one.
    pub fn register(&self, context: ContextKind, sender: BridgeSender) {
        if self.receivers().insert(context, sender).is_some() {
            log::debug!("bridge: replaced receiver for {context} context");
        } else {
            log::debug!("bridge: registered receiver for {context} context");
        }
    }

    /// Removes the receiver for `context`. Its receive loop ends once the
    /// channel drains.
    pub fn unregister(&self, context: ContextKind) -> bool {
        self.receivers().remove(&context).is_some()
    }

    pub fn is_registered(&self, context: ContextKind) -> bool {
        self.receivers()
            .get(&context)
            .is_some_and(|tx| !tx.is_closed())
    }

    /// Sends `message` to the receiver of `target`. Never blocks and never
    /// fails: returns whether the message was handed to the channel.
    pub fn send(&self, target: ContextKind, message: BridgeMessage) -> bool {
        // Clone the sender so the lock is not held while sending.
        let Some(tx) = self.receivers().get(&target).cloned() else {
            log::trace!("bridge: no {target} receiver, dropping {}", message.name);
            return false;
        };

        match tx.try_send(message) {
            Ok(()) => true,
            Err(TrySendError::Full(message)) => {
                log::debug!("bridge: {target} channel full, dropping {}", message.name);
                false
            }
            Err(TrySendError::Closed(message)) => {
                log::debug!("bridge: {target} receiver gone, dropping {}", message.name);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_without_receiver_is_dropped() {
        let registry = BroadcastRegistry::new();
        assert!(!registry.send(ContextKind::Client, BridgeMessage::show_consent_modal_requested()));
    }

    #[test]
    fn register_replaces_previous_receiver() {
        let registry = BroadcastRegistry::new();
        let (tx1, mut rx1) = mpsc::channel(4);
        let (tx2, mut rx2) = mpsc::channel(4);

        registry.register(ContextKind::Client, tx1);
        registry.register(ContextKind::Client, tx2);
        assert!(registry.send(ContextKind::Client, BridgeMessage::show_consent_modal_requested()));

        // rx1's only sender was dropped by the replacement
        assert!(rx1.try_recv().is_err());
        assert_eq!(rx2.try_recv().unwrap().name, "ShowConsentModalRequested");
    }

    #[test]
    fn full_and_closed_channels_are_swallowed() {
        let registry = BroadcastRegistry::new();
        let (tx, rx) = mpsc::channel(1);
        registry.register(ContextKind::Server, tx);

        assert!(registry.send(ContextKind::Server, BridgeMessage::show_consent_modal_requested()));
        assert!(!registry.send(ContextKind::Server, BridgeMessage::show_consent_modal_requested()));

        drop(rx);
        assert!(!registry.is_registered(ContextKind::Server));
        assert!(!registry.send(ContextKind::Server, BridgeMessage::show_consent_modal_requested()));
    }

    #[test]
    fn contexts_are_independent() {
        let registry = BroadcastRegistry::new();
        let (tx, mut rx) = mpsc::channel(4);
        registry.register(ContextKind::Server, tx);

        assert!(!registry.send(ContextKind::Client, BridgeMessage::show_preferences_modal_requested()));
        assert!(rx.try_recv().is_err());

        assert!(registry.unregister(ContextKind::Server));
        assert!(!registry.unregister(ContextKind::Server));
    }
}
