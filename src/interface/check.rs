use crate::bridge::ConsentEvent;
use crate::config::ConsentConfig;
use crate::errors::ConsentError;
use crate::preferences::CookiePreferences;
use crate::service::ConsentService;

/// What a piece of content needs consent for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsentRequirement {
    Category(String),
    /// A service; its category is implied.
    Service(String),
}

/// Shows content only while the required category (or service) is allowed.
#[derive(Debug, Clone)]
pub struct ConsentCheck {
    category: String,
    service: Option<String>,
    allowed: bool,
}

impl ConsentCheck {
    pub fn new(config: &ConsentConfig, requirement: ConsentRequirement) -> Result<Self, ConsentError> {
        match requirement {
            ConsentRequirement::Category(id) => {
                if config.category(&id).is_none() {
                    return Err(ConsentError::UnknownCategory(id));
                }
                Ok(Self {
                    category: id,
                    service: None,
                    allowed: false,
                })
            }
            ConsentRequirement::Service(id) => {
                let category = config
                    .category_of_service(&id)
                    .ok_or_else(|| ConsentError::UnknownService(id.clone()))?;
                Ok(Self {
                    category: category.identifier.clone(),
                    service: Some(id),
                    allowed: false,
                })
            }
        }
    }

    /// Category whose consent this check asks for.
    pub fn required_category(&self) -> &str {
        &self.category
    }

    pub fn is_allowed(&self) -> bool {
        self.allowed
    }

    /// Re-evaluates against `preferences`. Returns whether the state changed.
    pub fn evaluate(&mut self, preferences: &CookiePreferences) -> bool {
        let allowed = preferences.is_category_allowed(&self.category)
            && self
                .service
                .as_deref()
                .map_or(true, |s| preferences.is_service_allowed(s));
        let changed = allowed != self.allowed;
        self.allowed = allowed;
        changed
    }

    pub async fn refresh(&mut self, service: &ConsentService) -> bool {
        let preferences = service.get_preferences().await;
        self.evaluate(&preferences)
    }

    pub fn handle_event(&mut self, event: &ConsentEvent) -> bool {
        match event {
            ConsentEvent::PreferencesChanged(preferences) => self.evaluate(preferences),
            _ => false,
        }
    }

    /// The "accept" button: allows the required category.
    pub async fn accept_required(&mut self, service: &ConsentService) -> Result<(), ConsentError> {
        service.allow_category(&self.category).await?;
        self.refresh(service).await;
        Ok(())
    }
}
