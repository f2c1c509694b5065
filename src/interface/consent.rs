use std::sync::Arc;

use crate::bridge::ConsentEvent;
use crate::interface::{prompt_actions, PreferencesSelection, PromptAction};
use crate::service::ConsentService;

/// State of the consent prompt and the preferences modal.
#[derive(Debug)]
pub struct ConsentInterface {
    service: Arc<ConsentService>,
    showing_consent_modal: bool,
    showing_preferences_modal: bool,
}

impl ConsentInterface {
    pub fn new(service: Arc<ConsentService>) -> Self {
        Self {
            service,
            showing_consent_modal: false,
            showing_preferences_modal: false,
        }
    }

    pub fn is_showing_consent_modal(&self) -> bool {
        self.showing_consent_modal
    }

    pub fn is_showing_preferences_modal(&self) -> bool {
        self.showing_preferences_modal
    }

    pub fn actions(&self) -> Vec<PromptAction> {
        prompt_actions(self.service.config())
    }

    /// Lets the service know the application is up, then opens the prompt
    /// if auto-show is on and the current revision is not accepted yet.
    pub async fn on_first_render(&mut self) {
        self.service.notify_application_loaded().await;

        if self.service.config().automatically_show && !self.service.is_current_revision_accepted().await {
            self.showing_consent_modal = true;
        }
    }

    /// Returns whether the visible state changed.
    pub fn handle_event(&mut self, event: &ConsentEvent) -> bool {
        match event {
            ConsentEvent::ShowConsentModalRequested => {
                let changed = !self.showing_consent_modal;
                self.showing_consent_modal = true;
                changed
            }
            ConsentEvent::ShowPreferencesModalRequested => {
                let changed = !self.showing_preferences_modal;
                self.showing_preferences_modal = true;
                changed
            }
            _ => false,
        }
    }

    /// Opens the preferences modal and returns its initial selection.
    pub async fn open_preferences(&mut self) -> PreferencesSelection {
        self.showing_preferences_modal = true;
        PreferencesSelection::load(&self.service).await
    }

    pub fn close_prompt(&mut self) {
        self.showing_consent_modal = false;
    }

    /// Closes the preferences modal. When a selection was saved
    /// (`dismiss_prompt`) the prompt is closed as well.
    pub fn close_preferences(&mut self, dismiss_prompt: bool) {
        self.showing_preferences_modal = false;
        if dismiss_prompt {
            self.showing_consent_modal = false;
        }
    }

    /// Prompt buttons: accept everything or only what is necessary.
    pub async fn accept(&mut self, all: bool) {
        if all {
            self.service.save_accept_all().await;
        } else {
            self.service.save_necessary_only().await;
        }
        self.showing_consent_modal = false;
    }

    /// Dispatches a prompt button.
    pub async fn on_action(&mut self, action: PromptAction) -> Option<PreferencesSelection> {
        match action {
            PromptAction::AcceptAll => self.accept(true).await,
            PromptAction::Acknowledge | PromptAction::NecessaryOnly => self.accept(false).await,
            PromptAction::OpenPreferences => return Some(self.open_preferences().await),
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::{BroadcastRegistry, ConsentEventHandler, ContextKind};
    use crate::config::{Category, ConsentConfig};
    use crate::cookies::{CookieAccessHandle, DefaultCookieJar, JarCookieAccess};
    use crate::service::ServiceRole;
    use std::sync::RwLock;
    use url::Url;

    fn service(automatically_show: bool) -> Arc<ConsentService> {
        let config = ConsentConfig::builder()
            .automatically_show(automatically_show)
            .category(Category::new("analytics"))
            .build()
            .unwrap();
        let jar = Arc::new(RwLock::new(DefaultCookieJar::new()));
        let cookies: CookieAccessHandle =
            Arc::new(JarCookieAccess::new(jar, Url::parse("https://site.test/").unwrap()));
        let handler = Arc::new(ConsentEventHandler::new(
            ContextKind::Client,
            true,
            Arc::new(BroadcastRegistry::new()),
        ));
        Arc::new(ConsentService::new(
            Arc::new(config),
            cookies,
            None,
            handler,
            ServiceRole::Authority,
        ))
    }

    #[tokio::test]
    async fn prompt_shows_until_accepted() {
        let service = service(true);
        let mut ui = ConsentInterface::new(service.clone());
        ui.on_first_render().await;
        assert!(ui.is_showing_consent_modal());

        ui.accept(false).await;
        assert!(!ui.is_showing_consent_modal());
        assert!(service.is_current_revision_accepted().await);
        assert!(!service.is_category_allowed("analytics").await);

        let mut again = ConsentInterface::new(service);
        again.on_first_render().await;
        assert!(!again.is_showing_consent_modal());
    }

    #[tokio::test]
    async fn auto_show_can_be_disabled() {
        let mut ui = ConsentInterface::new(service(false));
        ui.on_first_render().await;
        assert!(!ui.is_showing_consent_modal());
    }

    #[tokio::test]
    async fn events_and_closing() {
        let service = service(false);
        let mut ui = ConsentInterface::new(service.clone());
        let mut events = service.subscribe();

        service.show_preferences_modal().await;
        let event = events.recv().await.unwrap();
        assert!(ui.handle_event(&event));
        assert!(!ui.handle_event(&event));
        assert!(ui.is_showing_preferences_modal());

        assert!(ui.handle_event(&ConsentEvent::ShowConsentModalRequested));
        ui.close_preferences(false);
        assert!(ui.is_showing_consent_modal());

        ui.handle_event(&ConsentEvent::ShowPreferencesModalRequested);
        ui.close_preferences(true);
        assert!(!ui.is_showing_consent_modal());
        assert!(!ui.is_showing_preferences_modal());
    }

    #[tokio::test]
    async fn open_preferences_action_returns_selection() {
        let service = service(true);
        let mut ui = ConsentInterface::new(service);
        assert_eq!(ui.actions(), vec![PromptAction::NecessaryOnly, PromptAction::AcceptAll]);

        let selection = ui.on_action(PromptAction::OpenPreferences).await.unwrap();
        assert!(ui.is_showing_preferences_modal());
        assert!(selection.is_category_selected("necessary"));

        assert!(ui.on_action(PromptAction::AcceptAll).await.is_none());
        assert!(!ui.is_showing_consent_modal());
    }
}
