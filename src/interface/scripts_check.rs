use tokio_util::sync::CancellationToken;

use crate::bridge::ConsentEvent;
use crate::dom::LoadedScript;
use crate::errors::ConsentError;
use crate::preferences::CookiePreferences;
use crate::service::ConsentService;

/// Shows content once the listed scripts have loaded and, optionally, a
/// category is allowed.
#[derive(Debug, Clone)]
pub struct ScriptsLoadedCheck {
    scripts: Vec<String>,
    category: Option<String>,
    rendering: bool,
}

impl ScriptsLoadedCheck {
    pub fn new<I, S>(scripts: I, category: Option<String>) -> Result<Self, ConsentError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let scripts: Vec<String> = scripts.into_iter().map(Into::into).collect();
        if scripts.is_empty() {
            return Err(ConsentError::InvalidParameters(
                "at least one script id is required".to_string(),
            ));
        }
        Ok(Self {
            scripts,
            category: category.filter(|c| !c.is_empty()),
            rendering: false,
        })
    }

    pub fn is_rendering(&self) -> bool {
        self.rendering
    }

    /// Returns whether the render state changed.
    pub fn evaluate(&mut self, loaded: &[LoadedScript], preferences: &CookiePreferences) -> bool {
        let ready = self
            .scripts
            .iter()
            .all(|id| loaded.iter().any(|script| &script.id == id));
        let rendering = ready
            && self
                .category
                .as_deref()
                .map_or(true, |c| preferences.is_category_allowed(c));

        let changed = rendering != self.rendering;
        self.rendering = rendering;
        changed
    }

    /// Asks the service for the loaded scripts and re-evaluates.
    pub async fn check(&mut self, service: &ConsentService, cancel: CancellationToken) -> Result<bool, ConsentError> {
        let loaded = service.loaded_scripts(cancel).await?;
        let preferences = service.get_preferences().await;
        Ok(self.evaluate(&loaded, &preferences))
    }

    pub async fn handle_event(&mut self, service: &ConsentService, event: &ConsentEvent) -> Result<bool, ConsentError> {
        match event {
            ConsentEvent::ScriptLoaded(args) => {
                let preferences = service.get_preferences().await;
                Ok(self.evaluate(&args.all_loaded_scripts, &preferences))
            }
            ConsentEvent::CategoryConsentChanged(_) => self.check(service, CancellationToken::new()).await,
            _ => Ok(false),
        }
    }
}
