use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::dom::ScriptLoadedArgs;
use crate::errors::ConsentError;
use crate::preferences::CookiePreferences;

/// The two execution contexts sharing one consent state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContextKind {
    /// Server-side rendering, including prerendering.
    Server,
    /// Rendering inside the browser.
    Client,
}

impl ContextKind {
    pub fn other(self) -> Self {
        match self {
            ContextKind::Server => ContextKind::Client,
            ContextKind::Client => ContextKind::Server,
        }
    }
}

impl Display for ContextKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContextKind::Server => write!(f, "server"),
            ContextKind::Client => write!(f, "client"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BridgeEventName {
    PreferencesChanged,
    ShowConsentModalRequested,
    ShowPreferencesModalRequested,
    ScriptLoaded,
}

impl BridgeEventName {
    pub fn as_str(&self) -> &'static str {
        match self {
            BridgeEventName::PreferencesChanged => "PreferencesChanged",
            BridgeEventName::ShowConsentModalRequested => "ShowConsentModalRequested",
            BridgeEventName::ShowPreferencesModalRequested => "ShowPreferencesModalRequested",
            BridgeEventName::ScriptLoaded => "ScriptLoaded",
        }
    }
}

impl Display for BridgeEventName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BridgeEventName {
    type Err = ConsentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PreferencesChanged" => Ok(BridgeEventName::PreferencesChanged),
            "ShowConsentModalRequested" => Ok(BridgeEventName::ShowConsentModalRequested),
            "ShowPreferencesModalRequested" => Ok(BridgeEventName::ShowPreferencesModalRequested),
            "ScriptLoaded" => Ok(BridgeEventName::ScriptLoaded),
            other => Err(ConsentError::UnknownBridgeEvent(other.to_string())),
        }
    }
}

/// A named event as it travels between contexts. `data` is JSON, or empty
/// for events without payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeMessage {
    pub name: String,
    pub data: String,
}

impl BridgeMessage {
    pub fn new(name: BridgeEventName, data: impl Into<String>) -> Self {
        Self {
            name: name.as_str().to_string(),
            data: data.into(),
        }
    }

    pub fn preferences_changed(preferences: &CookiePreferences) -> Result<Self, ConsentError> {
        Ok(Self::new(
            BridgeEventName::PreferencesChanged,
            serde_json::to_string(preferences)?,
        ))
    }

    pub fn show_consent_modal_requested() -> Self {
        Self::new(BridgeEventName::ShowConsentModalRequested, "")
    }

    pub fn show_preferences_modal_requested() -> Self {
        Self::new(BridgeEventName::ShowPreferencesModalRequested, "")
    }

    pub fn script_loaded(args: &ScriptLoadedArgs) -> Result<Self, ConsentError> {
        Ok(Self::new(BridgeEventName::ScriptLoaded, serde_json::to_string(args)?))
    }

    pub fn event_name(&self) -> Result<BridgeEventName, ConsentError> {
        self.name.parse()
    }

    /// Deserializes `data` as `T`, mapping failures to a bridge payload error.
    pub(crate) fn payload<T: serde::de::DeserializeOwned>(&self) -> Result<T, ConsentError> {
        serde_json::from_str(&self.data).map_err(|e| ConsentError::BridgePayload {
            event: self.name.clone(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_names_parse_back() {
        for name in [
            BridgeEventName::PreferencesChanged,
            BridgeEventName::ShowConsentModalRequested,
            BridgeEventName::ShowPreferencesModalRequested,
            BridgeEventName::ScriptLoaded,
        ] {
            assert_eq!(name.as_str().parse::<BridgeEventName>().unwrap(), name);
        }

        let err = "PreferencesUpdated".parse::<BridgeEventName>().unwrap_err();
        assert!(matches!(err, ConsentError::UnknownBridgeEvent(n) if n == "PreferencesUpdated"));
    }

    #[test]
    fn preferences_message_carries_json() {
        let mut prefs = CookiePreferences::with_revision(3);
        prefs.allowed_categories.insert("necessary".into());

        let msg = BridgeMessage::preferences_changed(&prefs).unwrap();
        assert_eq!(msg.name, "PreferencesChanged");
        assert_eq!(
            msg.data,
            r#"{"AcceptedRevision":3,"AllowedCategories":["necessary"],"AllowedServices":[]}"#
        );
        assert_eq!(msg.payload::<CookiePreferences>().unwrap(), prefs);
    }

    #[test]
    fn modal_requests_have_no_payload() {
        assert!(BridgeMessage::show_consent_modal_requested().data.is_empty());
        assert_eq!(
            BridgeMessage::show_preferences_modal_requested().event_name().unwrap(),
            BridgeEventName::ShowPreferencesModalRequested
        );
    }

    #[test]
    fn bad_payload_is_reported_with_event_name() {
        let msg = BridgeMessage::new(BridgeEventName::PreferencesChanged, "not json");
        match msg.payload::<CookiePreferences>() {
            Err(ConsentError::BridgePayload { event, .. }) => assert_eq!(event, "PreferencesChanged"),
            other => panic!("expected payload error, got {other:?}"),
        }
    }

    #[test]
    fn other_context() {
        assert_eq!(ContextKind::Server.other(), ContextKind::Client);
        assert_eq!(ContextKind::Client.other(), ContextKind::Server);
        assert_eq!(ContextKind::Client.to_string(), "client");
    }
}
