use crate::dom::ScriptLoadedArgs;
use crate::preferences::CookiePreferences;

/// Direction of a category transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConsentChange {
    Granted,
    Revoked,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsentChangedArgs {
    pub category: String,
    pub changed_to: ConsentChange,
    /// True for transitions derived from the first preferences seen in this
    /// session, where there was nothing to compare against.
    pub is_initial_change: bool,
}

/// Events published on a context's local bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsentEvent {
    PreferencesChanged(CookiePreferences),
    ShowConsentModalRequested,
    ShowPreferencesModalRequested,
    ScriptLoaded(ScriptLoadedArgs),
    CategoryConsentChanged(ConsentChangedArgs),
}
