//! Transport-independent turn handling
//!
//! [`BotContext`] takes one incoming event for a chat and produces the reply.
//! It holds the shared record store, the generation service and the guided
//! collection sessions; the teloxide endpoints only translate updates into
//! [`Incoming`] events and replies back into messages.

use std::sync::Arc;
use tracing::{error, info, warn};

use crate::config::TimeoutConfig;
use crate::db::{bounded, RecordStore};
use crate::dialogue::{CollectorInput, CollectorState};
use crate::generation::GenerationService;
use crate::localization::{t, t_args};
use crate::video_model::{NewVideo, VideoError};

use super::commands::{parse_text, Command, ParsedText, COMMAND_TABLE};
use super::dialogue_manager::{GuidedCollector, SessionKey};
use super::ui_builder::{
    create_delete_buttons, format_titles, parse_selection, truncate_message, Reply, Selection,
};

/// One inbound event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Incoming {
    /// A text message
    Text(String),
    /// An inline button click carrying its callback payload
    Selection(String),
}

/// Shared state injected into every handler
pub struct BotContext {
    store: Arc<dyn RecordStore>,
    generation: GenerationService,
    collector: GuidedCollector,
    timeouts: TimeoutConfig,
    bot_username: Option<String>,
}

impl BotContext {
    pub fn new(
        store: Arc<dyn RecordStore>,
        generation: GenerationService,
        timeouts: TimeoutConfig,
        bot_username: Option<String>,
    ) -> Self {
        Self {
            store,
            generation,
            collector: GuidedCollector::new(),
            timeouts,
            bot_username,
        }
    }

    /// Guided collection state of a chat
    pub fn session_state(&self, session: SessionKey) -> CollectorState {
        self.collector.state(session)
    }

    /// Handle one event and produce the reply
    ///
    /// The turn runs on its own task so that a panic in any handler is
    /// contained and answered with the generic failure message.
    pub async fn handle(self: &Arc<Self>, session: SessionKey, incoming: Incoming) -> Reply {
        let ctx = Arc::clone(self);
        let turn = tokio::spawn(async move { ctx.dispatch(session, incoming).await });

        match turn.await {
            Ok(reply) => reply,
            Err(e) => {
                error!(chat_id = session, error = %e, "Handler failed unexpectedly");
                Reply::text(t("error-unexpected"))
            }
        }
    }

    async fn dispatch(&self, session: SessionKey, incoming: Incoming) -> Reply {
        match incoming {
            Incoming::Text(text) => self.handle_text(session, &text).await,
            Incoming::Selection(data) => self.handle_selection(session, &data).await,
        }
    }

    async fn handle_text(&self, session: SessionKey, text: &str) -> Reply {
        match parse_text(text, self.bot_username.as_deref()) {
            ParsedText::Command { command, args } => {
                info!(chat_id = session, command = command.name(), args = ?args, "Received command");
                self.route(session, command, args).await
            }
            ParsedText::Unknown { name } => {
                info!(chat_id = session, command = %name, "Received unrecognized command");
                Reply::text(t("command-unknown"))
            }
            ParsedText::Text => {
                let collected = self
                    .collector
                    .handle(
                        session,
                        CollectorInput::Text(text),
                        self.store.as_ref(),
                        self.timeouts.store,
                    )
                    .await;

                match collected {
                    Some(reply) => reply,
                    None => self.generate_reply(session, text).await,
                }
            }
        }
    }

    /// Command dispatch table
    async fn route(&self, session: SessionKey, command: Command, args: Vec<String>) -> Reply {
        match command {
            Command::Start | Command::Help => self.start(),
            Command::NewVid if args.is_empty() => self.collect(session, CollectorInput::Start).await,
            Command::NewVid => self.create_video(session, args).await,
            Command::Cancel => self.collect(session, CollectorInput::Cancel).await,
            Command::Delete => self.offer_deletion(session).await,
            Command::FlushDb => self.flush(session).await,
            Command::VideosList => self.list_videos(session).await,
            Command::VideosLength => self.count_videos(session).await,
        }
    }

    async fn collect(&self, session: SessionKey, input: CollectorInput<'_>) -> Reply {
        self.collector
            .handle(session, input, self.store.as_ref(), self.timeouts.store)
            .await
            .unwrap_or_else(|| Reply::text(t("collect-nothing-to-cancel")))
    }

    fn start(&self) -> Reply {
        let commands = COMMAND_TABLE
            .iter()
            .map(|(name, _, description_key)| format!("/{} - {}", name, t(description_key)))
            .collect::<Vec<_>>()
            .join("\n");

        Reply::text(format!(
            "{}\n\n{}\n\n{}\n{}\n\n{}",
            t("welcome-title"),
            t("help-newvid-usage"),
            t("help-title"),
            commands,
            t("welcome-description"),
        ))
    }

    async fn create_video(&self, session: SessionKey, args: Vec<String>) -> Reply {
        let mut args = args.into_iter();
        let (title, url) = match (args.next(), args.next()) {
            (Some(title), Some(url)) => (title, url),
            _ => {
                warn!(chat_id = session, "Insufficient arguments provided to /newvid command");
                return Reply::text(t("newvid-usage"));
            }
        };
        let description = args.collect::<Vec<_>>().join(" ");

        let video = NewVideo::new(title, url).with_description(description);
        if let Err(e) = video.validate() {
            warn!(chat_id = session, error = %e, "Rejected /newvid arguments");
            return Reply::text(validation_message(&e));
        }

        info!(
            chat_id = session,
            title = %video.title,
            url = %video.url,
            "Preparing to insert video data"
        );

        match bounded(self.timeouts.store, self.store.insert(video)).await {
            Ok(id) => {
                info!(chat_id = session, video_id = %id, "Inserted video document");
                Reply::text(t_args("video-saved", &[("id", id.to_string().as_str())]))
            }
            Err(e) => {
                error!(chat_id = session, error = %e, "Error in /newvid command");
                Reply::text(t("error-save"))
            }
        }
    }

    async fn list_videos(&self, session: SessionKey) -> Reply {
        match bounded(self.timeouts.store, self.store.list()).await {
            Ok(videos) if videos.is_empty() => Reply::text(t("videos-none")),
            Ok(videos) => {
                info!(chat_id = session, count = videos.len(), "Returning list of videos");
                Reply::text(truncate_message(&format_titles(&videos)))
            }
            Err(e) => {
                error!(chat_id = session, error = %e, "Error in /videoslist command");
                Reply::text(t("error-store"))
            }
        }
    }

    async fn count_videos(&self, session: SessionKey) -> Reply {
        match bounded(self.timeouts.store, self.store.count()).await {
            Ok(count) => {
                info!(chat_id = session, count = count, "Counted videos");
                Reply::text(t_args("videos-count", &[("count", count.to_string().as_str())]))
            }
            Err(e) => {
                error!(chat_id = session, error = %e, "Error in /videoslength command");
                Reply::text(t("error-store"))
            }
        }
    }

    async fn flush(&self, session: SessionKey) -> Reply {
        match bounded(self.timeouts.store, self.store.delete_all()).await {
            Ok(count) => {
                info!(chat_id = session, count = count, "Deleted all videos");
                Reply::text(t_args("videos-flushed", &[("count", count.to_string().as_str())]))
            }
            Err(e) => {
                error!(chat_id = session, error = %e, "Error in /flushdb command");
                Reply::text(t("error-store"))
            }
        }
    }

    async fn offer_deletion(&self, session: SessionKey) -> Reply {
        match bounded(self.timeouts.store, self.store.list()).await {
            Ok(videos) if videos.is_empty() => Reply::text(t("videos-none")),
            Ok(videos) => {
                info!(chat_id = session, count = videos.len(), "Offering videos for deletion");
                Reply::text(t("delete-prompt")).with_buttons(create_delete_buttons(&videos))
            }
            Err(e) => {
                error!(chat_id = session, error = %e, "Error in /delete command");
                Reply::text(t("error-store"))
            }
        }
    }

    async fn handle_selection(&self, session: SessionKey, data: &str) -> Reply {
        let id = match parse_selection(data) {
            Some(Selection::Delete(id)) => id,
            None => {
                warn!(chat_id = session, data = %data, "Unknown callback payload");
                return Reply::text(t("selection-unknown"));
            }
        };

        // First match wins when titles repeat
        match bounded(self.timeouts.store, self.store.delete_first_with_title_of(id)).await {
            Ok(Some(video)) => {
                info!(chat_id = session, video_id = %video.id, selected_id = %id, "Deleted video by title");
                Reply::text(t_args("delete-success", &[("title", video.title.as_str())]))
            }
            Ok(None) => {
                info!(chat_id = session, selected_id = %id, "Selected video no longer exists");
                Reply::text(t("delete-not-found"))
            }
            Err(e) => {
                error!(chat_id = session, error = %e, "Failed to delete selected video");
                Reply::text(t("error-store"))
            }
        }
    }

    async fn generate_reply(&self, session: SessionKey, prompt: &str) -> Reply {
        match self.generation.reply(prompt).await {
            Ok(text) => Reply::text(truncate_message(&text)),
            Err(e) => {
                warn!(chat_id = session, error = %e, "Text generation failed");
                Reply::text(t("error-generation"))
            }
        }
    }
}

fn validation_message(error: &VideoError) -> String {
    match error {
        VideoError::EmptyTitle => t("title-empty"),
    }
}
