//! Consent configuration.
//!
//! `ConsentConfig` describes the consent policy of an application: the policy
//! [revision](ConsentConfig::revision), the catalog of [`Category`]s and their
//! [`Service`]s, how the consent cookie is written ([`CookieOptions`]) and the
//! localized texts shown by the prompt and preferences modal.
//!
//! `ConsentConfig` provides defaults via [`Default`] (a single required
//! `"necessary"` category, revision 1) and a fluent [`ConsentConfig::builder()`]
//! for customization with validation.
//!
//! # Examples
//!
//! ## Use defaults
//! ```rust
//! use cookie_consent::config::ConsentConfig;
//! let cfg = ConsentConfig::default();
//! assert_eq!(cfg.revision, 1);
//! assert_eq!(cfg.categories.len(), 1);
//! ```
//!
//! ## Customize with the builder
//! ```rust
//! use cookie_consent::config::{Category, ConsentConfig, Service};
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cfg = ConsentConfig::builder()
//!     .revision(3)
//!     .policy_url("/cookie-policy")
//!     .category(
//!         Category::new("analytics")
//!             .title("en", "Analytics")
//!             .preselected(true)
//!             .service(Service::new("google-analytics")),
//!     )
//!     .build()?; // returns Result<ConsentConfig, ConfigError>
//! # Ok(()) }
//! ```
//!
//! # Errors
//!
//! Builder validation returns [`ConfigError`] if values are invalid (e.g. a
//! negative revision, duplicate category identifiers or a `SameSite=None`
//! cookie that is not `Secure`).

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::preferences::CookiePreferences;

/// Identifier of the default, always required category.
pub const NECESSARY_CATEGORY: &str = "necessary";

/// Default name of the consent cookie.
pub const DEFAULT_COOKIE_NAME: &str = ".AspNet.CookieConsent";

const DEFAULT_MAX_AGE_SECS: u64 = 180 * 24 * 60 * 60;

/// A text in several languages, keyed by two-letter language code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalizedText(BTreeMap<String, String>);

impl LocalizedText {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self(
            pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    pub fn insert(&mut self, locale: impl Into<String>, text: impl Into<String>) {
        self.0.insert(locale.into(), text.into());
    }

    pub fn get(&self, locale: &str) -> Option<&str> {
        self.0.get(locale).map(String::as_str)
    }

    /// First entry in locale order, used as the last-resort fallback.
    pub fn first(&self) -> Option<&str> {
        self.0.values().next().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// `SameSite` attribute of the consent cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SameSite {
    Strict,
    #[default]
    Lax,
    None,
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SameSite::Strict => write!(f, "Strict"),
            SameSite::Lax => write!(f, "Lax"),
            SameSite::None => write!(f, "None"),
        }
    }
}

/// How and where the consent cookie is written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CookieOptions {
    /// Cookie name.
    pub name: String,
    /// Optional `Domain` attribute.
    pub domain: Option<String>,
    /// Optional `Path` attribute (default `/`).
    pub path: Option<String>,
    pub same_site: SameSite,
    pub secure: bool,
    pub http_only: bool,
    /// `Max-Age` in seconds. `None` omits the attribute.
    pub max_age_secs: Option<u64>,
    /// Absolute `Expires` date. `None` omits the attribute.
    #[serde(with = "time::serde::rfc3339::option")]
    pub expires: Option<OffsetDateTime>,
    /// Base64-encode the JSON value before writing it.
    pub encode_base64: bool,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            name: DEFAULT_COOKIE_NAME.to_string(),
            domain: None,
            path: Some("/".to_string()),
            same_site: SameSite::Lax,
            secure: true,
            http_only: false,
            max_age_secs: Some(DEFAULT_MAX_AGE_SECS),
            expires: None,
            encode_base64: true,
        }
    }
}

/// A service (third party, script, integration) that belongs to a category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Service {
    pub identifier: String,
    pub policy_url: Option<String>,
    pub title: LocalizedText,
    pub show_policy_text: LocalizedText,
}

impl Service {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            ..Default::default()
        }
    }

    pub fn policy_url(mut self, url: impl Into<String>) -> Self {
        self.policy_url = Some(url.into());
        self
    }

    pub fn title(mut self, locale: &str, text: &str) -> Self {
        self.title.insert(locale, text);
        self
    }

    pub fn show_policy_text(mut self, locale: &str, text: &str) -> Self {
        self.show_policy_text.insert(locale, text);
        self
    }
}

/// A named grouping of optional functionality that requires consent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Category {
    pub identifier: String,
    pub title: LocalizedText,
    pub description: LocalizedText,
    pub services: Vec<Service>,
    /// Mandatory, cannot be disabled by the user.
    pub required: bool,
    /// Enabled by default in the preferences modal while the current revision
    /// has not been accepted yet.
    pub preselected: bool,
}

impl Category {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            ..Default::default()
        }
    }

    pub fn title(mut self, locale: &str, text: &str) -> Self {
        self.title.insert(locale, text);
        self
    }

    pub fn description(mut self, locale: &str, text: &str) -> Self {
        self.description.insert(locale, text);
        self
    }

    pub fn service(mut self, service: Service) -> Self {
        self.services.push(service);
        self
    }

    pub fn required(mut self, on: bool) -> Self {
        self.required = on;
        self
    }

    pub fn preselected(mut self, on: bool) -> Self {
        self.preselected = on;
        self
    }

    pub fn service_ids(&self) -> impl Iterator<Item = &str> {
        self.services.iter().map(|s| s.identifier.as_str())
    }

    /// The built-in required category for strictly necessary cookies.
    pub fn necessary() -> Self {
        Self {
            identifier: NECESSARY_CATEGORY.to_string(),
            title: LocalizedText::from_pairs([
                ("en", "Strictly necessary cookies"),
                ("de", "Unbedingt notwendige Cookies"),
            ]),
            description: LocalizedText::from_pairs([
                ("en", "These cookies are essential for the proper functioning of this website. They do not contain personal data and are not used to track you."),
                ("de", "Diese Cookies sind unbedingt notwendig für die Nutzung dieser Webseite. Sie enthalten keine personenbezogenen Daten und werden nicht für Tracking verwendet."),
            ]),
            services: Vec::new(),
            required: true,
            preselected: false,
        }
    }
}

/// Where the consent prompt is placed on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ModalPosition {
    TopLeft,
    TopCenter,
    TopRight,
    BottomLeft,
    #[default]
    BottomCenter,
    BottomRight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ModalLayout {
    Bar,
    #[default]
    Cloud,
}

/// Options of the default consent prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptOptions {
    pub position: ModalPosition,
    pub layout: ModalLayout,
    /// The secondary button opens the preferences modal instead of
    /// saving "necessary only".
    pub secondary_action_opens_settings: bool,
    /// Show "Accept all" before the secondary button.
    pub accept_all_first: bool,
}

/// Texts used by [`ConsentCheck`](crate::interface::ConsentCheck).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckOptions {
    pub text: LocalizedText,
    pub accept_text: LocalizedText,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            text: LocalizedText::from_pairs([
                ("en", "This content uses cookies that are disallowed by your settings. To show it, we need to adjust your cookie settings for our website. We require your consent for:"),
                ("de", "Dieser Inhalt nutzt Cookies, die aktuell nicht erlaubt sind. Um ihn anzuzeigen, müssen Sie Ihre Cookie-Präferenzen auf unserer Webseite aktualisieren. Wir benötigen Ihre Zustimmung für:"),
            ]),
            accept_text: LocalizedText::from_pairs([("en", "Accept"), ("de", "Akzeptieren")]),
        }
    }
}

/// Localized texts of the prompt and preferences modal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterfaceTexts {
    pub consent_title: LocalizedText,
    pub consent_description: LocalizedText,
    pub accept_all: LocalizedText,
    /// Shown instead of accept/decline when only required categories exist.
    pub acknowledge: LocalizedText,
    pub necessary_only: LocalizedText,
    pub open_preferences: LocalizedText,
    pub settings_title: LocalizedText,
    pub settings_description: LocalizedText,
    pub settings_save: LocalizedText,
    pub settings_used_services: LocalizedText,
    pub show_policy: LocalizedText,
}

impl Default for InterfaceTexts {
    fn default() -> Self {
        Self {
            consent_title: LocalizedText::from_pairs([("en", "We use cookies"), ("de", "Wir verwenden Cookies")]),
            consent_description: LocalizedText::from_pairs([
                ("en", "This website uses cookies to improve your experience."),
                ("de", "Diese Webseite verwendet Cookies, um Ihre Erfahrung zu verbessern."),
            ]),
            accept_all: LocalizedText::from_pairs([("en", "Accept all"), ("de", "Alle akzeptieren")]),
            acknowledge: LocalizedText::from_pairs([("en", "I understand!"), ("de", "Alles klar!")]),
            necessary_only: LocalizedText::from_pairs([("en", "Decline"), ("de", "Ablehnen")]),
            open_preferences: LocalizedText::from_pairs([("en", "Manage preferences"), ("de", "Präferenzen ändern")]),
            settings_title: LocalizedText::from_pairs([("en", "Your cookie preferences"), ("de", "Ihre Cookie Präferenzen")]),
            settings_description: LocalizedText::from_pairs([
                ("en", "We use cookies to ensure basic functionality of the website and to enhance your online experience. For each category, you may choose to opt-in/out whenever you want."),
                ("de", "Wir nutzen Cookies für grundlegende Funktionalitäten unserer Webseite und zum Verbessern Ihrer Nutzererfahrung. Für jede Kategorie können Sie individuell Ihre Zustimmung erteilen."),
            ]),
            settings_save: LocalizedText::from_pairs([("en", "Save preferences"), ("de", "Präferenzen anwenden")]),
            settings_used_services: LocalizedText::from_pairs([("en", "Used services"), ("de", "Verwendete Dienste")]),
            show_policy: LocalizedText::from_pairs([("en", "Show cookie policy"), ("de", "Cookie-Richtlinie anzeigen")]),
        }
    }
}

/// Complete consent configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsentConfig {
    /// Revision of the cookie policy. A user whose accepted revision differs
    /// is prompted again.
    pub revision: i32,
    /// Show the prompt on first render when the current revision is not accepted.
    pub automatically_show: bool,
    /// Fallback language code for localized texts.
    pub default_locale: String,
    /// URL of the cookie policy.
    pub policy_url: String,
    pub cookie: CookieOptions,
    pub check: CheckOptions,
    pub prompt: PromptOptions,
    pub texts: InterfaceTexts,
    pub categories: Vec<Category>,
}

impl Default for ConsentConfig {
    fn default() -> Self {
        Self {
            revision: 1,
            automatically_show: true,
            default_locale: "en".to_string(),
            policy_url: "#".to_string(),
            cookie: CookieOptions::default(),
            check: CheckOptions::default(),
            prompt: PromptOptions::default(),
            texts: InterfaceTexts::default(),
            categories: vec![Category::necessary()],
        }
    }
}

impl ConsentConfig {
    pub fn builder() -> ConsentConfigBuilder {
        ConsentConfigBuilder::default()
    }

    /// Parses and validates a JSON configuration. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<ConsentConfig, ConfigError> {
        let cfg: ConsentConfig =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        validate(&cfg)?;
        Ok(cfg)
    }

    pub fn category(&self, identifier: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.identifier == identifier)
    }

    /// Category the given service belongs to.
    pub fn category_of_service(&self, service: &str) -> Option<&Category> {
        self.categories
            .iter()
            .find(|c| c.services.iter().any(|s| s.identifier == service))
    }

    pub fn required_categories(&self) -> impl Iterator<Item = &Category> {
        self.categories.iter().filter(|c| c.required)
    }

    pub fn only_required_categories_exist(&self) -> bool {
        self.categories.iter().all(|c| c.required)
    }

    /// Preferences allowing exactly the required categories, stamped with the current revision.
    pub fn necessary_only_preferences(&self) -> CookiePreferences {
        let mut prefs = CookiePreferences::with_revision(self.revision);
        for category in self.required_categories() {
            prefs.allow(category);
        }
        prefs
    }

    /// Preferences allowing every category and service, stamped with the current revision.
    pub fn accept_all_preferences(&self) -> CookiePreferences {
        let mut prefs = CookiePreferences::with_revision(self.revision);
        for category in &self.categories {
            prefs.allow(category);
        }
        prefs
    }
}

/// Builder for [`ConsentConfig`]. `build()` validates.
#[derive(Debug, Clone, Default)]
pub struct ConsentConfigBuilder {
    inner: ConsentConfig,
}

impl ConsentConfigBuilder {
    #[inline]
    fn map(mut self, f: impl FnOnce(&mut ConsentConfig)) -> Self {
        f(&mut self.inner);
        self
    }

    pub fn revision(self, revision: i32) -> Self { self.map(|c| c.revision = revision) }
    pub fn automatically_show(self, on: bool) -> Self { self.map(|c| c.automatically_show = on) }
    pub fn default_locale<S: Into<String>>(self, locale: S) -> Self { self.map(|c| c.default_locale = locale.into()) }
    pub fn policy_url<S: Into<String>>(self, url: S) -> Self { self.map(|c| c.policy_url = url.into()) }
    pub fn cookie(self, cookie: CookieOptions) -> Self { self.map(|c| c.cookie = cookie) }
    pub fn cookie_name<S: Into<String>>(self, name: S) -> Self { self.map(|c| c.cookie.name = name.into()) }
    pub fn prompt(self, prompt: PromptOptions) -> Self { self.map(|c| c.prompt = prompt) }
    pub fn check(self, check: CheckOptions) -> Self { self.map(|c| c.check = check) }
    pub fn texts(self, texts: InterfaceTexts) -> Self { self.map(|c| c.texts = texts) }

    /// Appends a category to the catalog.
    pub fn category(self, category: Category) -> Self { self.map(|c| c.categories.push(category)) }

    /// Replaces the whole catalog, including the default `necessary` category.
    pub fn categories(self, categories: Vec<Category>) -> Self { self.map(|c| c.categories = categories) }

    /// Apply multiple changes in one go.
    pub fn with(self, f: impl FnOnce(&mut ConsentConfig)) -> Self { self.map(f) }

    /// Validate and build the final config.
    pub fn build(self) -> Result<ConsentConfig, ConfigError> {
        validate(&self.inner)?;
        Ok(self.inner)
    }
}

// ---------- Validation ----------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    NegativeRevision(i32),
    InvalidCookieName(String),
    EmptyLocale,
    EmptyCategoryId,
    DuplicateCategory(String),
    DuplicateService(String),
    InsecureSameSiteNone,
    Parse(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NegativeRevision(r) =>
                write!(f, "revision {r} is negative (expected >= 0)"),
            ConfigError::InvalidCookieName(n) =>
                write!(f, "cookie name {n:?} is empty or contains ';', '=' or whitespace"),
            ConfigError::EmptyLocale =>
                write!(f, "default_locale must not be empty"),
            ConfigError::EmptyCategoryId =>
                write!(f, "category identifiers must not be empty"),
            ConfigError::DuplicateCategory(id) =>
                write!(f, "category {id:?} is configured more than once"),
            ConfigError::DuplicateService(id) =>
                write!(f, "service {id:?} is configured more than once"),
            ConfigError::InsecureSameSiteNone =>
                write!(f, "SameSite=None requires a secure cookie"),
            ConfigError::Parse(e) =>
                write!(f, "configuration could not be parsed: {e}"),
        }
    }
}
impl std::error::Error for ConfigError {}

fn validate(c: &ConsentConfig) -> Result<(), ConfigError> {
    if c.revision < 0 {
        return Err(ConfigError::NegativeRevision(c.revision));
    }
    let name = &c.cookie.name;
    if name.is_empty() || name.chars().any(|ch| ch == ';' || ch == '=' || ch.is_whitespace()) {
        return Err(ConfigError::InvalidCookieName(name.clone()));
    }
    if c.default_locale.is_empty() {
        return Err(ConfigError::EmptyLocale);
    }
    if c.cookie.same_site == SameSite::None && !c.cookie.secure {
        return Err(ConfigError::InsecureSameSiteNone);
    }

    let mut categories = HashSet::new();
    let mut services = HashSet::new();
    for category in &c.categories {
        if category.identifier.is_empty() {
            return Err(ConfigError::EmptyCategoryId);
        }
        if !categories.insert(category.identifier.as_str()) {
            return Err(ConfigError::DuplicateCategory(category.identifier.clone()));
        }
        for service in &category.services {
            if !services.insert(service.identifier.as_str()) {
                return Err(ConfigError::DuplicateService(service.identifier.clone()));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analytics() -> Category {
        Category::new("analytics")
            .title("en", "Analytics")
            .service(Service::new("google-analytics"))
            .service(Service::new("matomo"))
    }

    #[test]
    fn defaults_have_single_required_category() {
        let cfg = ConsentConfig::default();
        assert_eq!(cfg.revision, 1);
        assert!(cfg.automatically_show);
        assert_eq!(cfg.default_locale, "en");
        assert_eq!(cfg.categories.len(), 1);
        assert_eq!(cfg.categories[0].identifier, NECESSARY_CATEGORY);
        assert!(cfg.categories[0].required);
        assert!(cfg.only_required_categories_exist());
        assert_eq!(cfg.cookie.name, DEFAULT_COOKIE_NAME);
        assert_eq!(cfg.cookie.max_age_secs, Some(15_552_000));
    }

    #[test]
    fn builder_appends_categories_after_necessary() {
        let cfg = ConsentConfig::builder()
            .revision(4)
            .category(analytics())
            .build()
            .unwrap();

        assert_eq!(cfg.revision, 4);
        let ids: Vec<_> = cfg.categories.iter().map(|c| c.identifier.as_str()).collect();
        assert_eq!(ids, vec!["necessary", "analytics"]);
        assert!(!cfg.only_required_categories_exist());
        assert_eq!(
            cfg.category_of_service("matomo").map(|c| c.identifier.as_str()),
            Some("analytics")
        );
        assert!(cfg.category_of_service("unknown").is_none());
    }

    #[test]
    fn builder_rejects_invalid_values() {
        assert_eq!(
            ConsentConfig::builder().revision(-1).build().unwrap_err(),
            ConfigError::NegativeRevision(-1)
        );
        assert!(matches!(
            ConsentConfig::builder().cookie_name("bad name").build(),
            Err(ConfigError::InvalidCookieName(_))
        ));
        assert!(matches!(
            ConsentConfig::builder().cookie_name("").build(),
            Err(ConfigError::InvalidCookieName(_))
        ));
        assert_eq!(
            ConsentConfig::builder().default_locale("").build().unwrap_err(),
            ConfigError::EmptyLocale
        );
        assert_eq!(
            ConsentConfig::builder()
                .category(Category::new("necessary"))
                .build()
                .unwrap_err(),
            ConfigError::DuplicateCategory("necessary".into())
        );
        assert_eq!(
            ConsentConfig::builder()
                .category(analytics())
                .category(Category::new("marketing").service(Service::new("matomo")))
                .build()
                .unwrap_err(),
            ConfigError::DuplicateService("matomo".into())
        );
        assert_eq!(
            ConsentConfig::builder()
                .with(|c| {
                    c.cookie.same_site = SameSite::None;
                    c.cookie.secure = false;
                })
                .build()
                .unwrap_err(),
            ConfigError::InsecureSameSiteNone
        );
    }

    #[test]
    fn necessary_only_and_accept_all_preferences() {
        let cfg = ConsentConfig::builder()
            .revision(2)
            .category(analytics())
            .build()
            .unwrap();

        let necessary = cfg.necessary_only_preferences();
        assert_eq!(necessary.accepted_revision, 2);
        assert!(necessary.is_category_allowed("necessary"));
        assert!(!necessary.is_category_allowed("analytics"));
        assert!(necessary.allowed_services.is_empty());

        let all = cfg.accept_all_preferences();
        assert!(all.is_category_allowed("analytics"));
        assert!(all.is_service_allowed("google-analytics"));
        assert!(all.is_service_allowed("matomo"));
    }

    #[test]
    fn from_json_fills_defaults_and_validates() {
        let cfg = ConsentConfig::from_json(
            r#"{ "revision": 7, "cookie": { "name": "consent", "same_site": "Strict" } }"#,
        )
        .unwrap();
        assert_eq!(cfg.revision, 7);
        assert_eq!(cfg.cookie.name, "consent");
        assert_eq!(cfg.cookie.same_site, SameSite::Strict);
        assert_eq!(cfg.cookie.path.as_deref(), Some("/"));
        assert_eq!(cfg.categories.len(), 1);

        assert!(matches!(
            ConsentConfig::from_json(r#"{ "revision": -3 }"#),
            Err(ConfigError::NegativeRevision(-3))
        ));
        assert!(matches!(ConsentConfig::from_json("{"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn localized_text_lookup() {
        let text = LocalizedText::from_pairs([("en", "Hello"), ("de", "Hallo")]);
        assert_eq!(text.get("de"), Some("Hallo"));
        assert_eq!(text.get("fr"), None);
        assert_eq!(text.first(), Some("Hallo")); // locale order: de < en
        assert!(LocalizedText::new().is_empty());
    }

    #[test]
    fn same_site_display() {
        assert_eq!(SameSite::Strict.to_string(), "Strict");
        assert_eq!(SameSite::Lax.to_string(), "Lax");
        assert_eq!(SameSite::None.to_string(), "None");
    }
}
