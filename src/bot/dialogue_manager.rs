//! Dialogue Manager module: owns the per-chat guided collection sessions
//!
//! Session state is only changed through [`GuidedCollector::handle`], which
//! applies [`transition`] and performs the resulting side effect.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::db::{bounded, RecordStore};
use crate::dialogue::{transition, CollectorInput, CollectorState, Step};
use crate::localization::{t, t_args};
use crate::video_model::VideoError;

use super::ui_builder::Reply;

/// Identifies one conversation (the Telegram chat id)
pub type SessionKey = i64;

/// Guided collection sessions keyed by chat
#[derive(Debug, Default)]
pub struct GuidedCollector {
    sessions: Mutex<HashMap<SessionKey, CollectorState>>,
}

impl GuidedCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state of a session
    pub fn state(&self, key: SessionKey) -> CollectorState {
        let sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        sessions.get(&key).cloned().unwrap_or_default()
    }

    /// Number of sessions with a collection in progress
    pub fn active_sessions(&self) -> usize {
        let sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        sessions.len()
    }

    /// Apply an input to the session table; idle sessions are not kept
    fn apply(&self, key: SessionKey, input: CollectorInput<'_>) -> Step {
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        let current = sessions.remove(&key).unwrap_or_default();
        let (step, next) = transition(current, input);

        if !next.is_idle() {
            sessions.insert(key, next);
        }

        step
    }

    /// Handle one input for a session
    ///
    /// Returns `None` when the input is not for the collector (plain text
    /// while idle), so the caller can fall through to other handling.
    pub async fn handle(
        &self,
        key: SessionKey,
        input: CollectorInput<'_>,
        store: &dyn RecordStore,
        store_timeout: Duration,
    ) -> Option<Reply> {
        let step = self.apply(key, input);
        debug!(chat_id = key, step = ?step, "Guided collection step");

        let text = match step {
            Step::PromptUrl => t("collect-ask-url"),
            Step::PromptTitle => t("collect-ask-title"),
            Step::RejectTitle(VideoError::EmptyTitle) => t("title-empty"),
            Step::Cancelled => {
                info!(chat_id = key, "Guided collection cancelled");
                t("collect-cancelled")
            }
            Step::NothingToCancel => t("collect-nothing-to-cancel"),
            Step::Ignored => return None,
            // The session is already idle here, whatever the insert does
            Step::Commit(video) => match bounded(store_timeout, store.insert(video)).await {
                Ok(id) => {
                    info!(chat_id = key, video_id = %id, "Inserted video from guided collection");
                    t_args("video-saved", &[("id", id.to_string().as_str())])
                }
                Err(e) => {
                    error!(chat_id = key, error = %e, "Failed to save collected video");
                    t("error-save")
                }
            },
        };

        Some(Reply::text(text))
    }
}
