//! The user's consent choices.
//!
//! [`CookiePreferences`] is what gets written into the consent cookie and
//! relayed over the bridge. Field names on the wire are PascalCase
//! (`AcceptedRevision`, `AllowedCategories`, `AllowedServices`) so cookies
//! written by other implementations of the same format stay readable.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::config::{Category, ConsentConfig};

/// Revision used for preferences that were never accepted or could not be
/// read. Configured revisions are validated to be `>= 0`, so this never
/// matches the policy.
pub const NOT_ACCEPTED_REVISION: i32 = -1;

/// Accepted policy revision plus the allowed categories and services.
///
/// Equality is exact identity of the revision and of both sets; order and
/// duplicates in the serialized form do not matter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CookiePreferences {
    #[serde(rename = "AcceptedRevision")]
    pub accepted_revision: i32,
    #[serde(rename = "AllowedCategories")]
    pub allowed_categories: BTreeSet<String>,
    #[serde(rename = "AllowedServices")]
    pub allowed_services: BTreeSet<String>,
}

impl CookiePreferences {
    pub fn with_revision(revision: i32) -> Self {
        Self {
            accepted_revision: revision,
            ..Default::default()
        }
    }

    /// Fallback used when no preferences can be read: only the required
    /// categories, with a revision that is never current.
    pub fn necessary_fallback(config: &ConsentConfig) -> Self {
        let mut prefs = Self::with_revision(NOT_ACCEPTED_REVISION);
        for category in config.required_categories() {
            prefs.allow(category);
        }
        prefs
    }

    pub fn is_category_allowed(&self, category: &str) -> bool {
        self.allowed_categories.contains(category)
    }

    pub fn is_service_allowed(&self, service: &str) -> bool {
        self.allowed_services.contains(service)
    }

    pub fn is_current(&self, revision: i32) -> bool {
        self.accepted_revision == revision
    }

    /// Adds the category and all of its services.
    pub fn allow(&mut self, category: &Category) {
        self.allowed_categories.insert(category.identifier.clone());
        self.allowed_services
            .extend(category.service_ids().map(str::to_string));
    }

    /// Removes the category and all of its services.
    pub fn forbid(&mut self, category: &Category) {
        self.allowed_categories.remove(&category.identifier);
        for service in category.service_ids() {
            self.allowed_services.remove(service);
        }
    }

    /// Adds every required category (and its services) that is missing.
    /// Returns true if anything was added.
    pub fn ensure_required(&mut self, config: &ConsentConfig) -> bool {
        let before = (self.allowed_categories.len(), self.allowed_services.len());
        for category in config.required_categories() {
            self.allow(category);
        }
        before != (self.allowed_categories.len(), self.allowed_services.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Service;

    fn config() -> ConsentConfig {
        ConsentConfig::builder()
            .category(
                Category::new("analytics")
                    .service(Service::new("ga"))
                    .service(Service::new("matomo")),
            )
            .category(Category::new("marketing").service(Service::new("ads")))
            .build()
            .unwrap()
    }

    #[test]
    fn equality_ignores_order_and_duplicates() {
        let a: CookiePreferences = serde_json::from_str(
            r#"{"AcceptedRevision":1,"AllowedCategories":["necessary","analytics"],"AllowedServices":["ga"]}"#,
        )
        .unwrap();
        let b: CookiePreferences = serde_json::from_str(
            r#"{"AcceptedRevision":1,"AllowedCategories":["analytics","necessary","analytics"],"AllowedServices":["ga","ga"]}"#,
        )
        .unwrap();
        assert_eq!(a, b);

        let mut c = b.clone();
        c.accepted_revision = 2;
        assert_ne!(a, c);

        let mut d = b.clone();
        d.allowed_services.insert("matomo".into());
        assert_ne!(a, d);
    }

    #[test]
    fn missing_fields_default() {
        let p: CookiePreferences = serde_json::from_str("{}").unwrap();
        assert_eq!(p.accepted_revision, 0);
        assert!(p.allowed_categories.is_empty());
        assert!(p.allowed_services.is_empty());
    }

    #[test]
    fn serializes_with_pascal_case_names() {
        let cfg = config();
        let json = serde_json::to_string(&cfg.necessary_only_preferences()).unwrap();
        assert_eq!(
            json,
            r#"{"AcceptedRevision":1,"AllowedCategories":["necessary"],"AllowedServices":[]}"#
        );
    }

    #[test]
    fn forbid_removes_all_services_of_category() {
        let cfg = config();
        let mut prefs = cfg.accept_all_preferences();
        prefs.forbid(cfg.category("analytics").unwrap());

        assert!(!prefs.is_category_allowed("analytics"));
        assert!(!prefs.is_service_allowed("ga"));
        assert!(!prefs.is_service_allowed("matomo"));
        assert!(prefs.is_service_allowed("ads"));
    }

    #[test]
    fn fallback_is_necessary_only_and_never_current() {
        let cfg = config();
        let prefs = CookiePreferences::necessary_fallback(&cfg);
        assert_eq!(prefs.accepted_revision, NOT_ACCEPTED_REVISION);
        assert!(!prefs.is_current(cfg.revision));
        assert!(!prefs.is_current(0));
        assert_eq!(prefs.allowed_categories.len(), 1);
        assert!(prefs.is_category_allowed("necessary"));
    }

    #[test]
    fn ensure_required_reports_changes() {
        let cfg = config();
        let mut prefs = CookiePreferences::with_revision(1);
        assert!(prefs.ensure_required(&cfg));
        assert!(prefs.is_category_allowed("necessary"));
        assert!(!prefs.ensure_required(&cfg));
    }
}
