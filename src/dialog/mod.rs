//! Multi-step intake dialog
//!
//! A linear state machine that collects one [`LocationNote`] field per
//! incoming message:
//!
//! ```text
//! None -> WaitingName -> WaitingType -> WaitingCategory
//!      -> WaitingAddress -> WaitingCity -> WaitingNote -> (complete)
//! ```
//!
//! The engine is pure: it mutates the session it is given and tells the
//! caller what to reply and whether the draft is ready to persist. Sending
//! messages, storing sessions and appending records are the dispatcher's job.

use crate::types::LocationNote;

/// Reply text meaning "leave this optional field empty".
pub const SKIP_SENTINEL: &str = "k";

/// Current position in the intake dialog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DialogStep {
    #[default]
    None,
    WaitingName,
    WaitingType,
    WaitingCategory,
    WaitingAddress,
    WaitingCity,
    WaitingNote,
}

impl DialogStep {
    /// The step that follows this one, or `None` when the dialog is done.
    pub fn next(self) -> Option<DialogStep> {
        match self {
            DialogStep::None => Some(DialogStep::WaitingName),
            DialogStep::WaitingName => Some(DialogStep::WaitingType),
            DialogStep::WaitingType => Some(DialogStep::WaitingCategory),
            DialogStep::WaitingCategory => Some(DialogStep::WaitingAddress),
            DialogStep::WaitingAddress => Some(DialogStep::WaitingCity),
            DialogStep::WaitingCity => Some(DialogStep::WaitingNote),
            DialogStep::WaitingNote => None,
        }
    }

    /// Prompt shown when the dialog enters this step (HTML parse mode).
    pub fn prompt(self) -> &'static str {
        match self {
            DialogStep::None => "",
            DialogStep::WaitingName => {
                "📝 <b>Name of the place or activity?</b>\n(Send /cancel to stop)"
            }
            DialogStep::WaitingType => "🍜 <b>What type is it?</b> (e.g. Pho, Cafe...):",
            DialogStep::WaitingCategory => "📂 <b>Category?</b> (e.g. food, chill):",
            DialogStep::WaitingAddress => "📍 <b>Address?</b> (send 'k' to skip):",
            DialogStep::WaitingCity => "🏙 <b>City?</b>:",
            DialogStep::WaitingNote => "📝 <b>Note?</b> (send 'k' to skip):",
        }
    }

    /// Whether the `k` sentinel clears the field collected at this step.
    pub fn is_optional(self) -> bool {
        matches!(self, DialogStep::WaitingAddress | DialogStep::WaitingNote)
    }

    pub fn is_active(self) -> bool {
        self != DialogStep::None
    }
}

/// In-progress entry for one chat.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserSession {
    pub step: DialogStep,
    pub draft: LocationNote,
}

/// Outcome of feeding one message into the dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// The field was recorded; reply with the prompt for the next step.
    Continue { prompt: &'static str },
    /// The last field was recorded; the draft is ready to persist.
    Complete(LocationNote),
    /// No dialog is in progress; the message was not consumed.
    Idle,
}

impl UserSession {
    /// A fresh session waiting for the first field.
    pub fn start() -> Self {
        Self {
            step: DialogStep::WaitingName,
            draft: LocationNote::default(),
        }
    }

    /// Record `text` into the field for the current step and advance.
    ///
    /// Content is not validated. On [`Transition::Complete`] the session is
    /// left at `WaitingNote` with the finished draft, so a failed save can be
    /// retried by resending the note.
    pub fn advance(&mut self, text: &str) -> Transition {
        let step = self.step;
        let value = field_value(step, text);

        let draft = &mut self.draft;
        match step {
            DialogStep::None => return Transition::Idle,
            DialogStep::WaitingName => draft.name = value,
            DialogStep::WaitingType => draft.kind = value,
            DialogStep::WaitingCategory => draft.category = value,
            DialogStep::WaitingAddress => draft.address = value,
            DialogStep::WaitingCity => draft.city = value,
            DialogStep::WaitingNote => draft.note = value,
        }

        match step.next() {
            Some(next) => {
                self.step = next;
                Transition::Continue {
                    prompt: next.prompt(),
                }
            }
            None => Transition::Complete(self.draft.clone()),
        }
    }
}

fn field_value(step: DialogStep, text: &str) -> String {
    let text = text.trim();
    if step.is_optional() && text == SKIP_SENTINEL {
        String::new()
    } else {
        text.to_string()
    }
}

/// Map the skip sentinel to an empty string for an optional field.
pub fn optional_field(text: &str) -> String {
    field_value(DialogStep::WaitingNote, text)
}
