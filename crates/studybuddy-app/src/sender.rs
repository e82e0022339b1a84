//! Sender labelling.
//!
//! Messages written by the viewer are labelled [`OWN_SENDER_LABEL`] instead
//! of the viewer's name. Live pushes carry the author's id, so the check is
//! exact. History entries may only carry a free-text name, and for those
//! [`name_matches_viewer`] applies a substring heuristic.

use studybuddy_proto::{HistoricalMessage, UserId, WireUser};

/// Label shown for the viewer's own messages.
pub const OWN_SENDER_LABEL: &str = "You";

/// The signed-in user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewer {
    /// User identifier.
    pub id: UserId,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
}

impl Viewer {
    /// Create a viewer.
    pub fn new(
        id: impl Into<UserId>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        Self { id: id.into(), first_name: first_name.into(), last_name: last_name.into() }
    }

    /// Label for the author of a live message.
    pub fn label_for_push(&self, sender: &WireUser) -> String {
        if sender.id == self.id { OWN_SENDER_LABEL.to_string() } else { sender.display_name() }
    }

    /// Label for the author of a history entry.
    ///
    /// Own if the sender id matches, or if the free-text name matches the
    /// viewer's name (see [`name_matches_viewer`]).
    pub fn label_for_history(&self, message: &HistoricalMessage) -> String {
        let same_id = message.sender_id.as_ref() == Some(&self.id);
        if same_id || name_matches_viewer(&message.sender, self) {
            OWN_SENDER_LABEL.to_string()
        } else {
            message.sender.clone()
        }
    }
}

/// Whether a free-text sender name looks like the viewer.
///
/// Case-insensitive substring match on both first and last name. This
/// misfires when another member's name contains the viewer's names, e.g.
/// "Ann Lee" also matches "Joanne Leeds". The viewer's names are trimmed
/// first, and a part that is empty after trimming never matches.
pub fn name_matches_viewer(sender_name: &str, viewer: &Viewer) -> bool {
    let first = viewer.first_name.trim().to_lowercase();
    let last = viewer.last_name.trim().to_lowercase();
    if first.is_empty() || last.is_empty() {
        return false;
    }

    let sender = sender_name.to_lowercase();
    sender.contains(&first) && sender.contains(&last)
}
