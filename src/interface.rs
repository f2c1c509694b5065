//! Headless UI components.
//!
//! These structs hold what a rendering layer needs to draw the consent
//! dialogs and consent-dependent content. They are driven by calls from the
//! renderer and by [`ConsentEvent`](crate::bridge::ConsentEvent)s from the
//! service's bus; markup is left to the host.

mod check;
mod consent;
mod layout;
mod localizer;
mod scripts_check;
mod selection;

pub use check::{ConsentCheck, ConsentRequirement};
pub use consent::ConsentInterface;
pub use layout::{prompt_actions, x_position_class, y_position_class, PromptAction};
pub use localizer::Localizer;
pub use scripts_check::ScriptsLoadedCheck;
pub use selection::PreferencesSelection;
