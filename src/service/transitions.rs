use crate::bridge::{ConsentChange, ConsentChangedArgs};
use crate::config::ConsentConfig;
use crate::preferences::CookiePreferences;

/// Remembers the last observed preferences and derives per-category
/// transitions from each new observation.
#[derive(Debug, Default)]
pub struct TransitionTracker {
    baseline: Option<CookiePreferences>,
}

impl TransitionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn baseline(&self) -> Option<&CookiePreferences> {
        self.baseline.as_ref()
    }

    /// Records `preferences` as the new baseline and returns the transitions
    /// relative to the previous one, in configuration order.
    ///
    /// Without a previous baseline every category is reported, granted or
    /// revoked, with `is_initial_change` set.
    pub fn observe(&mut self, config: &ConsentConfig, preferences: &CookiePreferences) -> Vec<ConsentChangedArgs> {
        let previous = self.baseline.replace(preferences.clone());

        config
            .categories
            .iter()
            .filter_map(|category| {
                let id = category.identifier.as_str();
                let now = preferences.is_category_allowed(id);
                let changed_to = if now {
                    ConsentChange::Granted
                } else {
                    ConsentChange::Revoked
                };

                match &previous {
                    None => Some(ConsentChangedArgs {
                        category: id.to_string(),
                        changed_to,
                        is_initial_change: true,
                    }),
                    Some(prev) if prev.is_category_allowed(id) != now => Some(ConsentChangedArgs {
                        category: id.to_string(),
                        changed_to,
                        is_initial_change: false,
                    }),
                    Some(_) => None,
                }
            })
            .collect()
    }
}
