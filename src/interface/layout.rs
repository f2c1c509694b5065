use crate::config::{ConsentConfig, ModalPosition};

/// Vertical placement class of the prompt container.
pub fn y_position_class(position: ModalPosition) -> &'static str {
    match position {
        ModalPosition::BottomLeft | ModalPosition::BottomCenter | ModalPosition::BottomRight => {
            "cc:bottom-0 cc:left-0"
        }
        ModalPosition::TopLeft | ModalPosition::TopCenter | ModalPosition::TopRight => "cc:top-0 cc:left-0",
    }
}

/// Horizontal alignment class of the prompt container.
pub fn x_position_class(position: ModalPosition) -> &'static str {
    match position {
        ModalPosition::BottomLeft | ModalPosition::TopLeft => "cc:justify-start",
        ModalPosition::BottomRight | ModalPosition::TopRight => "cc:justify-end",
        ModalPosition::BottomCenter | ModalPosition::TopCenter => "cc:justify-center",
    }
}

/// A button of the consent prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptAction {
    AcceptAll,
    /// Single button when there is nothing to choose.
    Acknowledge,
    NecessaryOnly,
    OpenPreferences,
}

/// Buttons of the consent prompt in display order.
pub fn prompt_actions(config: &ConsentConfig) -> Vec<PromptAction> {
    if config.only_required_categories_exist() {
        return vec![PromptAction::Acknowledge];
    }

    let secondary = if config.prompt.secondary_action_opens_settings {
        PromptAction::OpenPreferences
    } else {
        PromptAction::NecessaryOnly
    };

    if config.prompt.accept_all_first {
        vec![PromptAction::AcceptAll, secondary]
    } else {
        vec![secondary, PromptAction::AcceptAll]
    }
}
