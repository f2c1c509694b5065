use crate::dom::{Document, LoadedScript};
use crate::preferences::CookiePreferences;

/// `type` of a script that must not run yet.
pub const INERT_TYPE: &str = "text/plain";
/// `type` given to an activated script.
pub const LIVE_TYPE: &str = "text/javascript";
/// Category that has to be allowed before the script may run.
pub const CATEGORY_ATTR: &str = "data-consent-category";
/// Optional service that has to be allowed as well.
pub const SERVICE_ATTR: &str = "data-consent-service";
/// Source URL that becomes `src` on activation.
pub const DATA_SRC_ATTR: &str = "data-src";

fn non_empty(s: &&str) -> bool {
    !s.is_empty()
}

/// Turns every inert, consent-gated script allowed by `preferences` into a
/// live script and returns the scripts activated by this call.
///
/// The live element keeps the attribute order and the inline body of the
/// placeholder. `type` becomes `text/javascript`, the gating attributes are
/// dropped and `data-src` (if present) becomes `src`. Activated elements are
/// no longer inert, so running this again with the same preferences changes
/// nothing.
pub fn activate_scripts(doc: &mut Document, preferences: &CookiePreferences) -> Vec<LoadedScript> {
    let mut activated = Vec::new();

    for node in doc.script_ids() {
        let Some(placeholder) = doc.script(node) else {
            continue;
        };
        if !placeholder
            .script_type()
            .is_some_and(|t| t.trim().eq_ignore_ascii_case(INERT_TYPE))
        {
            continue;
        }
        let Some(category) = placeholder.attr(CATEGORY_ATTR).filter(non_empty) else {
            continue;
        };
        if !preferences.is_category_allowed(category) {
            continue;
        }
        let service = placeholder.attr(SERVICE_ATTR).filter(non_empty).map(str::to_string);
        if service.as_deref().is_some_and(|s| !preferences.is_service_allowed(s)) {
            continue;
        }

        let category = category.to_string();
        let mut live = placeholder.clone();
        live.set_attr("type", LIVE_TYPE);
        live.remove_attr(CATEGORY_ATTR);
        live.remove_attr(SERVICE_ATTR);

        let src = match live.remove_attr(DATA_SRC_ATTR).filter(|s| !s.is_empty()) {
            Some(src) => {
                live.set_attr("src", &src);
                Some(src)
            }
            None => live.attr("src").filter(non_empty).map(str::to_string),
        };

        let id = match live.attr("id").filter(non_empty) {
            Some(id) => id.to_string(),
            None => doc.next_anonymous_id(),
        };

        doc.replace_script(node, live);

        log::debug!("activated script {id} (category {category}, src {src:?})");
        let loaded = LoadedScript {
            id,
            category,
            service,
            src,
        };
        doc.record_loaded(loaded.clone());
        activated.push(loaded);
    }

    activated
}
