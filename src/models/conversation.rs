use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::message::SenderSummary;

/// Conversation participant with the joined profile summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub user_id: Uuid,
    pub profile: SenderSummary,
}

/// Conversation header plus its resolved participant list.
///
/// Created upstream before any message exists; this core only reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    pub name: Option<String>,
    pub is_group: bool,
    pub participants: Vec<Participant>,
}

impl Conversation {
    pub const MIN_PARTICIPANTS: usize = 2;

    /// Malformed join data occasionally yields conversations with fewer
    /// than two resolved participants; those must not reach any listing
    /// surface.
    pub fn is_degenerate(&self) -> bool {
        self.participants.len() < Self::MIN_PARTICIPANTS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn participant() -> Participant {
        let user_id = Uuid::new_v4();
        Participant {
            user_id,
            profile: SenderSummary {
                id: user_id,
                display_name: "test".to_string(),
                avatar_ref: None,
            },
        }
    }

    #[test]
    fn test_single_participant_is_degenerate() {
        let conversation = Conversation {
            id: Uuid::new_v4(),
            name: None,
            is_group: false,
            participants: vec![participant()],
        };
        assert!(conversation.is_degenerate());
    }

    #[test]
    fn test_two_participants_are_valid() {
        let conversation = Conversation {
            id: Uuid::new_v4(),
            name: Some("pair".to_string()),
            is_group: false,
            participants: vec![participant(), participant()],
        };
        assert!(!conversation.is_degenerate());
    }
}
