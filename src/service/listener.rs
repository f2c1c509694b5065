use anyhow::Result;
use uuid::Uuid;

use crate::bridge::ConsentChangedArgs;
use crate::preferences::CookiePreferences;

/// Identifies a registered [`ConsentListener`]. Opaque; only useful for
/// removing the listener again.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(Uuid);

impl ListenerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ListenerId {
    fn default() -> Self {
        Self::new()
    }
}

/// Receives consent notifications from a [`ConsentService`](crate::service::ConsentService).
///
/// Errors are logged by the service and never interrupt a save or read.
pub trait ConsentListener: Send + Sync {
    fn on_category_consent_changed(&self, args: &ConsentChangedArgs) -> Result<()>;

    fn on_preferences_changed(&self, _preferences: &CookiePreferences) -> Result<()> {
        Ok(())
    }
}

impl<F> ConsentListener for F
where
    F: Fn(&ConsentChangedArgs) -> Result<()> + Send + Sync,
{
    fn on_category_consent_changed(&self, args: &ConsentChangedArgs) -> Result<()> {
        self(args)
    }
}
