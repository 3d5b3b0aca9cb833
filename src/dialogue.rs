//! Promotion creation dialogue: template first, then duration.

use serde::{Deserialize, Serialize};
use teloxide::dispatching::dialogue::{Dialogue, InMemStorage};

/// Conversation state of an admin creating a promotion
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum PromoDialogueState {
    #[default]
    Start,
    WaitingForTemplate,
    WaitingForDuration {
        template: String,
    },
}

/// Type alias for the promotion dialogue
pub type PromoDialogue = Dialogue<PromoDialogueState, InMemStorage<PromoDialogueState>>;

impl PromoDialogueState {
    /// Whether the admin is in the middle of creating a promotion
    pub fn is_creating(&self) -> bool {
        !matches!(self, PromoDialogueState::Start)
    }
}
