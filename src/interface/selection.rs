use std::collections::BTreeSet;

use crate::config::{Category, ConsentConfig};
use crate::preferences::CookiePreferences;
use crate::service::ConsentService;

/// Checkbox state of the preferences modal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreferencesSelection {
    categories: BTreeSet<String>,
    services: BTreeSet<String>,
}

impl PreferencesSelection {
    /// Starts from the stored preferences. Required categories are always
    /// selected; preselected ones too until the current revision is accepted.
    pub fn from_preferences(config: &ConsentConfig, preferences: &CookiePreferences) -> Self {
        let mut selection = Self {
            categories: preferences.allowed_categories.clone(),
            services: preferences.allowed_services.clone(),
        };

        let revision_accepted = preferences.is_current(config.revision);
        for category in &config.categories {
            if category.required || (category.preselected && !revision_accepted) {
                selection.select(category);
            }
        }
        selection
    }

    pub async fn load(service: &ConsentService) -> Self {
        let preferences = service.get_preferences().await;
        Self::from_preferences(service.config(), &preferences)
    }

    pub fn is_category_selected(&self, identifier: &str) -> bool {
        self.categories.contains(identifier)
    }

    pub fn is_service_selected(&self, identifier: &str) -> bool {
        self.services.contains(identifier)
    }

    fn select(&mut self, category: &Category) {
        self.categories.insert(category.identifier.clone());
        self.services.extend(category.service_ids().map(str::to_string));
    }

    /// Checks or unchecks `category` with all of its services. Required
    /// categories stay checked; returns whether anything changed.
    pub fn toggle(&mut self, category: &Category, selected: bool) -> bool {
        if selected {
            let before = self.clone();
            self.select(category);
            *self != before
        } else if category.required {
            false
        } else {
            let removed = self.categories.remove(&category.identifier);
            let mut services_removed = false;
            for service in category.service_ids() {
                services_removed |= self.services.remove(service);
            }
            removed || services_removed
        }
    }

    /// The selection as preferences for the current revision.
    pub fn to_preferences(&self, config: &ConsentConfig) -> CookiePreferences {
        CookiePreferences {
            accepted_revision: config.revision,
            allowed_categories: self.categories.clone(),
            allowed_services: self.services.clone(),
        }
    }

    /// Saves the selection.
    pub async fn allow_selected(&self, service: &ConsentService) {
        service.save_preferences(self.to_preferences(service.config())).await;
    }

    /// Ignores the selection and allows everything.
    pub async fn allow_all(&mut self, service: &ConsentService) {
        for category in &service.config().categories {
            self.select(category);
        }
        service.save_accept_all().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Service;

    fn config() -> ConsentConfig {
        ConsentConfig::builder()
            .revision(4)
            .category(Category::new("functional").preselected(true).service(Service::new("chat")))
            .category(Category::new("analytics").service(Service::new("ga")))
            .build()
            .unwrap()
    }

    #[test]
    fn preselected_only_until_revision_accepted() {
        let cfg = config();

        let fresh = PreferencesSelection::from_preferences(&cfg, &CookiePreferences::default());
        assert!(fresh.is_category_selected("necessary"));
        assert!(fresh.is_category_selected("functional"));
        assert!(fresh.is_service_selected("chat"));
        assert!(!fresh.is_category_selected("analytics"));

        let accepted = cfg.necessary_only_preferences();
        let current = PreferencesSelection::from_preferences(&cfg, &accepted);
        assert!(current.is_category_selected("necessary"));
        assert!(!current.is_category_selected("functional"));
    }

    #[test]
    fn required_categories_are_always_checked() {
        let cfg = config();
        let mut prefs = CookiePreferences::with_revision(4);
        prefs.allowed_categories.insert("analytics".into());

        let mut selection = PreferencesSelection::from_preferences(&cfg, &prefs);
        assert!(selection.is_category_selected("necessary"));
        assert!(!selection.toggle(cfg.category("necessary").unwrap(), false));
        assert!(selection.is_category_selected("necessary"));
    }

    #[test]
    fn toggle_moves_services_with_category() {
        let cfg = config();
        let mut selection = PreferencesSelection::from_preferences(&cfg, &cfg.necessary_only_preferences());
        let analytics = cfg.category("analytics").unwrap();

        assert!(selection.toggle(analytics, true));
        assert!(selection.is_service_selected("ga"));
        assert!(!selection.toggle(analytics, true));

        assert!(selection.toggle(analytics, false));
        assert!(!selection.is_service_selected("ga"));

        let prefs = selection.to_preferences(&cfg);
        assert_eq!(prefs.accepted_revision, 4);
        assert_eq!(prefs.allowed_categories.len(), 1);
    }
}
