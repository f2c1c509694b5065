use crate::config::{ConsentConfig, LocalizedText};
use crate::errors::ConsentError;

/// Picks the text for the current locale.
///
/// Fallback order: current locale, default locale, first available entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Localizer {
    current: String,
    default: String,
}

impl Localizer {
    pub fn new(current: impl Into<String>, default: impl Into<String>) -> Self {
        Self {
            current: current.into(),
            default: default.into(),
        }
    }

    /// Uses the configured default locale.
    pub fn for_config(config: &ConsentConfig, current: impl Into<String>) -> Self {
        Self::new(current, config.default_locale.clone())
    }

    pub fn current(&self) -> &str {
        &self.current
    }

    pub fn localize<'a>(&self, text: &'a LocalizedText) -> Result<&'a str, ConsentError> {
        text.get(&self.current)
            .or_else(|| text.get(&self.default))
            .or_else(|| text.first())
            .ok_or_else(|| ConsentError::MissingLocalization(self.current.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_in_order() {
        let text = LocalizedText::from_pairs([("de", "Hallo"), ("en", "Hello"), ("fr", "Bonjour")]);

        assert_eq!(Localizer::new("fr", "en").localize(&text).unwrap(), "Bonjour");
        assert_eq!(Localizer::new("it", "en").localize(&text).unwrap(), "Hello");

        let only_es = LocalizedText::from_pairs([("es", "Hola"), ("cs", "Ahoj")]);
        // first by key order
        assert_eq!(Localizer::new("it", "en").localize(&only_es).unwrap(), "Ahoj");
    }

    #[test]
    fn empty_text_is_an_error() {
        let err = Localizer::new("it", "en")
            .localize(&LocalizedText::new())
            .unwrap_err();
        assert!(matches!(err, ConsentError::MissingLocalization(l) if l == "it"));
    }

    #[test]
    fn default_locale_comes_from_config() {
        let config = ConsentConfig::builder().default_locale("de").build().unwrap();
        let localizer = Localizer::for_config(&config, "it");
        assert_eq!(localizer.localize(&config.texts.accept_all).unwrap(), "Alle akzeptieren");
    }
}
