//! The consent service: policy, stored preferences and notifications.
//!
//! One [`ConsentService`] runs per context. The [`ServiceRole::Authority`]
//! owns the page's scripts and drives activation once the application has
//! loaded. A [`ServiceRole::Proxy`] shares the same cookie and learns about
//! changes made elsewhere through the bridge.

mod listener;
mod transitions;

use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::bridge::{ConsentEvent, ConsentEventHandler, EventSubscription};
use crate::config::ConsentConfig;
use crate::cookies::{decode_preferences, encode_preferences, set_cookie_string, CookieAccessHandle};
use crate::dom::{LoadedScript, ScriptHostHandle, ScriptLoadedArgs};
use crate::errors::ConsentError;
use crate::preferences::CookiePreferences;

pub use crate::bridge::{ConsentChange, ConsentChangedArgs};
pub use listener::{ConsentListener, ListenerId};
pub use transitions::TransitionTracker;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceRole {
    /// Activates scripts and publishes the initial preferences.
    Authority,
    /// Follows the authority.
    Proxy,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

pub struct ConsentService {
    config: Arc<ConsentConfig>,
    cookies: CookieAccessHandle,
    scripts: Option<ScriptHostHandle>,
    handler: Arc<ConsentEventHandler>,
    role: ServiceRole,
    /// Last preferences read, saved or received.
    cache: Mutex<Option<CookiePreferences>>,
    tracker: Mutex<TransitionTracker>,
    /// Scripts reported as loaded by the other context.
    remote_scripts: Mutex<Vec<LoadedScript>>,
    listeners: RwLock<Vec<(ListenerId, Arc<dyn ConsentListener>)>>,
}

impl std::fmt::Debug for ConsentService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsentService")
            .field("role", &self.role)
            .field("context", &self.handler.context())
            .finish_non_exhaustive()
    }
}

impl ConsentService {
    pub fn new(
        config: Arc<ConsentConfig>,
        cookies: CookieAccessHandle,
        scripts: Option<ScriptHostHandle>,
        handler: Arc<ConsentEventHandler>,
        role: ServiceRole,
    ) -> Self {
        Self {
            config,
            cookies,
            scripts,
            handler,
            role,
            cache: Mutex::new(None),
            tracker: Mutex::new(TransitionTracker::new()),
            remote_scripts: Mutex::new(Vec::new()),
            listeners: RwLock::new(Vec::new()),
        }
    }

    pub fn config(&self) -> &ConsentConfig {
        &self.config
    }

    pub fn role(&self) -> ServiceRole {
        self.role
    }

    pub fn handler(&self) -> &Arc<ConsentEventHandler> {
        &self.handler
    }

    pub fn subscribe(&self) -> EventSubscription {
        self.handler.subscribe()
    }

    pub fn add_listener(&self, listener: Arc<dyn ConsentListener>) -> ListenerId {
        let id = ListenerId::new();
        self.listeners
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push((id, listener));
        id
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write().unwrap_or_else(|e| e.into_inner());
        let before = listeners.len();
        listeners.retain(|(lid, _)| *lid != id);
        listeners.len() != before
    }

    /// Reads the stored preferences. Falls back to the last known
    /// preferences, or to necessary-only at revision `-1`, when the cookie
    /// cannot be read.
    pub async fn get_preferences(&self) -> CookiePreferences {
        match self.read_stored() {
            Ok(Some(preferences)) => {
                *lock(&self.cache) = Some(preferences.clone());
                preferences
            }
            Ok(None) => self.fallback(),
            Err(e) => {
                log::warn!("consent cookie could not be read: {e}");
                self.fallback()
            }
        }
    }

    fn read_stored(&self) -> Result<Option<CookiePreferences>, ConsentError> {
        let raw = self
            .cookies
            .read_cookie(&self.config.cookie.name)
            .map_err(|e| ConsentError::StorageUnavailable(e.to_string()))?;

        match raw {
            Some(value) if !value.trim().is_empty() => decode_preferences(&value).map(Some),
            _ => {
                log::trace!("consent cookie {} not set", self.config.cookie.name);
                Ok(None)
            }
        }
    }

    fn fallback(&self) -> CookiePreferences {
        lock(&self.cache)
            .clone()
            .unwrap_or_else(|| CookiePreferences::necessary_fallback(&self.config))
    }

    /// Normalizes, persists and applies `preferences`. Storage and activation
    /// failures are logged; the in-memory state is updated regardless.
    pub async fn save_preferences(&self, mut preferences: CookiePreferences) {
        preferences.ensure_required(&self.config);
        let previous = self.get_preferences().await;

        if let Err(e) = self.persist(&preferences) {
            log::warn!("consent cookie could not be written: {e}");
        }
        self.activate_scripts(&preferences);

        *lock(&self.cache) = Some(preferences.clone());

        if previous != preferences {
            self.publish_preferences_changed(&preferences);
        }
    }

    fn persist(&self, preferences: &CookiePreferences) -> Result<(), ConsentError> {
        let value = encode_preferences(preferences, self.config.cookie.encode_base64)?;
        let set_cookie = set_cookie_string(&self.config.cookie, &value);
        self.cookies
            .write_cookie(&set_cookie)
            .map_err(|e| ConsentError::StorageUnavailable(e.to_string()))
    }

    pub async fn allow_category(&self, identifier: &str) -> Result<(), ConsentError> {
        let category = self
            .config
            .category(identifier)
            .ok_or_else(|| ConsentError::UnknownCategory(identifier.to_string()))?;

        let mut preferences = self.get_preferences().await;
        preferences.allow(category);
        preferences.accepted_revision = self.config.revision;
        self.save_preferences(preferences).await;
        Ok(())
    }

    pub async fn forbid_category(&self, identifier: &str) -> Result<(), ConsentError> {
        let category = self
            .config
            .category(identifier)
            .ok_or_else(|| ConsentError::UnknownCategory(identifier.to_string()))?;
        if category.required {
            return Err(ConsentError::RequiredCategory(identifier.to_string()));
        }

        let mut preferences = self.get_preferences().await;
        preferences.forbid(category);
        preferences.accepted_revision = self.config.revision;
        self.save_preferences(preferences).await;
        Ok(())
    }

    pub async fn save_necessary_only(&self) {
        self.save_preferences(self.config.necessary_only_preferences()).await;
    }

    pub async fn save_accept_all(&self) {
        self.save_preferences(self.config.accept_all_preferences()).await;
    }

    pub async fn is_current_revision_accepted(&self) -> bool {
        self.get_preferences().await.is_current(self.config.revision)
    }

    pub async fn is_category_allowed(&self, identifier: &str) -> bool {
        self.get_preferences().await.is_category_allowed(identifier)
    }

    pub async fn is_service_allowed(&self, identifier: &str) -> bool {
        self.get_preferences().await.is_service_allowed(identifier)
    }

    /// Asks the UI context to show the consent prompt. With
    /// `only_if_necessary` nothing happens once the current revision is accepted.
    pub async fn show_consent_modal(&self, only_if_necessary: bool) {
        if only_if_necessary && self.is_current_revision_accepted().await {
            return;
        }
        self.handler.broadcast_show_consent_modal_requested();
    }

    pub async fn show_preferences_modal(&self) {
        self.handler.broadcast_show_preferences_modal_requested();
    }

    /// Called once the application has rendered in this context.
    ///
    /// The authority activates the scripts of accepted preferences and then
    /// publishes the stored preferences, which gives every listener its
    /// initial transitions. A proxy does nothing.
    pub async fn notify_application_loaded(&self) {
        if self.role == ServiceRole::Proxy {
            log::trace!("proxy: application loaded, waiting for authority");
            return;
        }

        let preferences = self.get_preferences().await;
        if preferences.is_current(self.config.revision) {
            self.activate_scripts(&preferences);
        }
        self.publish_preferences_changed(&preferences);
    }

    /// All scripts activated so far, locally or as reported by the other context.
    pub async fn loaded_scripts(&self, cancel: CancellationToken) -> Result<Vec<LoadedScript>, ConsentError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ConsentError::Cancelled),
            scripts = self.collect_loaded_scripts() => Ok(scripts),
        }
    }

    async fn collect_loaded_scripts(&self) -> Vec<LoadedScript> {
        if let Some(host) = &self.scripts {
            match host.read() {
                Ok(host) => return host.loaded_scripts(),
                Err(_) => log::warn!("script host lock poisoned"),
            }
        }
        lock(&self.remote_scripts).clone()
    }

    /// Spawns the loop that feeds messages from the other context into this
    /// service. It ends when this context's registration is replaced or
    /// removed. Returns `None` when the handler has no inbox (not
    /// initialized, or already taken).
    pub fn spawn_bridge_listener(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        let mut inbox = self.handler.take_inbox()?;
        let service = Arc::clone(self);

        Some(tokio::spawn(async move {
            while let Some(message) = inbox.recv().await {
                match service.handler.on_received_broadcast(message) {
                    Ok(event) => service.on_remote_event(event),
                    Err(e) => log::error!("bridge message rejected: {e}"),
                }
            }
            log::debug!("bridge listener for {} context stopped", service.handler.context());
        }))
    }

    fn on_remote_event(&self, event: ConsentEvent) {
        match event {
            ConsentEvent::PreferencesChanged(preferences) => {
                // The authority owns the cookie.
                if self.role == ServiceRole::Authority {
                    if let Err(e) = self.persist(&preferences) {
                        log::warn!("consent cookie could not be written: {e}");
                    }
                }
                *lock(&self.cache) = Some(preferences.clone());
                if self.role == ServiceRole::Authority && preferences.is_current(self.config.revision) {
                    self.activate_scripts(&preferences);
                }
                self.notify_listeners(&preferences);
            }
            ConsentEvent::ScriptLoaded(args) => {
                *lock(&self.remote_scripts) = args.all_loaded_scripts;
            }
            _ => {}
        }
    }

    /// Activates scripts on the host, if any, and reports each one.
    fn activate_scripts(&self, preferences: &CookiePreferences) {
        let Some(host) = &self.scripts else {
            return;
        };

        let (activated, all) = match host.write() {
            Ok(mut host) => {
                let activated = host.apply_preferences(preferences);
                (activated, host.loaded_scripts())
            }
            Err(_) => {
                log::warn!("script host lock poisoned, scripts not activated");
                return;
            }
        };

        for script in activated {
            let args = ScriptLoadedArgs {
                script,
                all_loaded_scripts: all.clone(),
            };
            if let Err(e) = self.handler.broadcast_script_loaded(&args) {
                log::warn!("script loaded event not sent: {e}");
            }
        }
    }

    fn publish_preferences_changed(&self, preferences: &CookiePreferences) {
        if let Err(e) = self.handler.broadcast_preferences_changed(preferences) {
            log::warn!("preferences changed event not sent: {e}");
        }
        self.notify_listeners(preferences);
    }

    fn notify_listeners(&self, preferences: &CookiePreferences) {
        let changes = lock(&self.tracker).observe(&self.config, preferences);

        // Snapshot so listeners may add or remove listeners.
        let listeners: Vec<_> = self
            .listeners
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();

        for listener in &listeners {
            if let Err(e) = listener.on_preferences_changed(preferences) {
                log::error!("consent listener failed on preferences change: {e:#}");
            }
        }

        for change in changes {
            log::debug!(
                "category {} {:?}{}",
                change.category,
                change.changed_to,
                if change.is_initial_change { " (initial)" } else { "" }
            );
            for listener in &listeners {
                if let Err(e) = listener.on_category_consent_changed(&change) {
                    log::error!("consent listener failed for category {}: {e:#}", change.category);
                }
            }
            self.handler.publish(ConsentEvent::CategoryConsentChanged(change));
        }
    }
}
