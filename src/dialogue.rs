//! Guided video collection dialogue: conversation state and its transition function.
//!
//! The state machine is pure. Side effects (the store insert, the replies) are
//! described by [`Step`] and carried out by the collector in
//! `bot::dialogue_manager`.

use serde::{Deserialize, Serialize};

use crate::video_model::{validate_title, NewVideo, VideoError};

/// Represents the conversation state for guided video collection
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollectorState {
    #[default]
    Idle,
    AwaitingUrl,
    AwaitingTitle {
        pending_url: String,
    },
}

impl CollectorState {
    pub fn is_idle(&self) -> bool {
        matches!(self, CollectorState::Idle)
    }
}

/// Inputs the collector reacts to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CollectorInput<'a> {
    /// `/newvid` without arguments
    Start,
    /// `/cancel`
    Cancel,
    /// Any text that is not a command
    Text(&'a str),
}

/// What a transition asks the caller to do
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Step {
    /// Ask the user for the URL
    PromptUrl,
    /// Ask the user for the title
    PromptTitle,
    /// Title was rejected; ask again
    RejectTitle(VideoError),
    /// Insert this record and confirm
    Commit(NewVideo),
    /// Collection aborted by the user
    Cancelled,
    /// Cancel received while idle
    NothingToCancel,
    /// Input is not for the collector
    Ignored,
}

/// Apply one input to a session state
pub fn transition(state: CollectorState, input: CollectorInput<'_>) -> (Step, CollectorState) {
    match (state, input) {
        (_, CollectorInput::Start) => (Step::PromptUrl, CollectorState::AwaitingUrl),

        (CollectorState::Idle, CollectorInput::Cancel) => {
            (Step::NothingToCancel, CollectorState::Idle)
        }
        (_, CollectorInput::Cancel) => (Step::Cancelled, CollectorState::Idle),

        (CollectorState::Idle, CollectorInput::Text(_)) => (Step::Ignored, CollectorState::Idle),

        (CollectorState::AwaitingUrl, CollectorInput::Text(text)) => (
            Step::PromptTitle,
            CollectorState::AwaitingTitle {
                pending_url: text.to_string(),
            },
        ),

        (CollectorState::AwaitingTitle { pending_url }, CollectorInput::Text(text)) => {
            match validate_title(text) {
                Ok(()) => (
                    Step::Commit(NewVideo::new(text, pending_url)),
                    CollectorState::Idle,
                ),
                // Keep dialogue active, user can try again
                Err(e) => (
                    Step::RejectTitle(e),
                    CollectorState::AwaitingTitle { pending_url },
                ),
            }
        }
    }
}
