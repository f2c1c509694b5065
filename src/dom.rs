//! Page model for consent-gated scripts.
//!
//! Third-party scripts are shipped inert:
//!
//! ```html
//! <script type="text/plain" data-consent-category="analytics"
//!         data-src="https://example.com/tracker.js" id="tracker"></script>
//! ```
//!
//! Once the user allows the category, [`activate_scripts`] turns such a tag
//! into a live `text/javascript` tag, keeping every other attribute and the
//! inline body. A [`Document`] keeps the page as markup segments plus parsed
//! [`ScriptElement`]s, so untouched markup serializes back byte for byte.
//!
//! The consent service only sees the [`ScriptHost`] trait; [`Document`] is the
//! reference implementation.

mod activation;
mod document;
mod element;
mod loaded;

use std::sync::{Arc, RwLock};

use crate::preferences::CookiePreferences;

pub use activation::{activate_scripts, CATEGORY_ATTR, DATA_SRC_ATTR, INERT_TYPE, LIVE_TYPE, SERVICE_ATTR};
pub use document::{Document, Node, NodeId};
pub use element::ScriptElement;
pub use loaded::{LoadedScript, ScriptLoadedArgs};

/// Something that holds consent-gated scripts and can activate them.
pub trait ScriptHost: Send + Sync {
    /// Activates every inert script allowed by `preferences`. Returns the
    /// scripts activated by this call only.
    fn apply_preferences(&mut self, preferences: &CookiePreferences) -> Vec<LoadedScript>;

    /// All scripts activated so far.
    fn loaded_scripts(&self) -> Vec<LoadedScript>;
}

/// A handle to a script host trait.
pub type ScriptHostHandle = Arc<RwLock<dyn ScriptHost>>;

impl ScriptHost for Document {
    fn apply_preferences(&mut self, preferences: &CookiePreferences) -> Vec<LoadedScript> {
        activate_scripts(self, preferences)
    }

    fn loaded_scripts(&self) -> Vec<LoadedScript> {
        self.loaded().to_vec()
    }
}
