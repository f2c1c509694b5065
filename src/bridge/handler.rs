use std::fmt::Debug;
use std::sync::{Arc, Mutex};

use tokio::sync::{broadcast, mpsc};

use crate::bridge::{
    BridgeEventName, BridgeMessage, BridgeReceiver, BroadcastRegistry, ConsentEvent, ContextKind,
};
use crate::dom::ScriptLoadedArgs;
use crate::errors::ConsentError;
use crate::preferences::CookiePreferences;
use crate::DEFAULT_CHANNEL_CAPACITY;

/// A handle for receiving the events of one context.
pub type EventSubscription = broadcast::Receiver<ConsentEvent>;

/// Per-context end of the bridge.
pub struct ConsentEventHandler {
    context: ContextKind,
    renders_ui: bool,
    registry: Arc<BroadcastRegistry>,
    bus: broadcast::Sender<ConsentEvent>,
    inbox: Mutex<Option<BridgeReceiver>>,
}

impl Debug for ConsentEventHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsentEventHandler")
            .field("context", &self.context)
            .field("renders_ui", &self.renders_ui)
            .finish_non_exhaustive()
    }
}

impl ConsentEventHandler {
    /// `renders_ui` marks the context hosting the consent dialogs; modal
    /// requests raised elsewhere are forwarded to it.
    pub fn new(context: ContextKind, renders_ui: bool, registry: Arc<BroadcastRegistry>) -> Self {
        let (bus, _rx) = broadcast::channel(DEFAULT_CHANNEL_CAPACITY);
        Self {
            context,
            renders_ui,
            registry,
            bus,
            inbox: Mutex::new(None),
        }
    }

    pub fn context(&self) -> ContextKind {
        self.context
    }

    pub fn renders_ui(&self) -> bool {
        self.renders_ui
    }

    /// Registers this context with the registry. Messages sent to it queue up
    /// in the inbox until [`take_inbox`](Self::take_inbox) is drained.
    /// Calling this again replaces the previous inbox.
    pub fn initialize(&self) {
        let (tx, rx) = mpsc::channel(DEFAULT_CHANNEL_CAPACITY);
        *self.inbox.lock().unwrap_or_else(|e| e.into_inner()) = Some(rx);
        self.registry.register(self.context, tx);
    }

    pub fn take_inbox(&self) -> Option<BridgeReceiver> {
        self.inbox.lock().unwrap_or_else(|e| e.into_inner()).take()
    }

    pub fn subscribe(&self) -> EventSubscription {
        self.bus.subscribe()
    }

    /// Publishes on the local bus only.
    pub fn publish(&self, event: ConsentEvent) {
        // Fails only when nobody is subscribed.
        let _ = self.bus.send(event);
    }

    fn forward(&self, message: BridgeMessage) {
        let target = self.context.other();
        log::trace!("bridge: {} -> {target}: {}", self.context, message.name);
        self.registry.send(target, message);
    }

    pub fn broadcast_preferences_changed(&self, preferences: &CookiePreferences) -> Result<(), ConsentError> {
        let message = BridgeMessage::preferences_changed(preferences)?;
        self.publish(ConsentEvent::PreferencesChanged(preferences.clone()));
        self.forward(message);
        Ok(())
    }

    pub fn broadcast_show_consent_modal_requested(&self) {
        if self.renders_ui {
            self.publish(ConsentEvent::ShowConsentModalRequested);
        } else {
            self.forward(BridgeMessage::show_consent_modal_requested());
        }
    }

    pub fn broadcast_show_preferences_modal_requested(&self) {
        if self.renders_ui {
            self.publish(ConsentEvent::ShowPreferencesModalRequested);
        } else {
            self.forward(BridgeMessage::show_preferences_modal_requested());
        }
    }

    pub fn broadcast_script_loaded(&self, args: &ScriptLoadedArgs) -> Result<(), ConsentError> {
        let message = BridgeMessage::script_loaded(args)?;
        self.publish(ConsentEvent::ScriptLoaded(args.clone()));
        self.forward(message);
        Ok(())
    }

    /// Decodes a message from the other context and republishes it locally.
    pub fn on_received_broadcast(&self, message: BridgeMessage) -> Result<ConsentEvent, ConsentError> {
        log::trace!("bridge: {} received {}", self.context, message.name);

        let event = match message.event_name()? {
            BridgeEventName::PreferencesChanged => ConsentEvent::PreferencesChanged(message.payload()?),
            BridgeEventName::ShowConsentModalRequested => ConsentEvent::ShowConsentModalRequested,
            BridgeEventName::ShowPreferencesModalRequested => ConsentEvent::ShowPreferencesModalRequested,
            BridgeEventName::ScriptLoaded => ConsentEvent::ScriptLoaded(message.payload()?),
        };

        self.publish(event.clone());
        Ok(event)
    }
}
