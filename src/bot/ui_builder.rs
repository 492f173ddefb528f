//! UI Builder module for creating keyboards and formatting messages

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use uuid::Uuid;

use crate::localization::t;
use crate::video_model::VideoRecord;

/// Telegram message length limit, counted in UTF-16 code units
pub const MAX_MESSAGE_UNITS: usize = 4096;

/// Callback payload prefix of delete buttons
pub const DELETE_PREFIX: &str = "del:";

/// An inline button: label shown to the user, payload sent back on click
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub data: String,
}

/// Outgoing reply for one conversation turn
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Reply {
    pub text: String,
    /// One button per keyboard row
    pub buttons: Vec<Button>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            buttons: Vec::new(),
        }
    }

    pub fn with_buttons(mut self, buttons: Vec<Button>) -> Self {
        self.buttons = buttons;
        self
    }
}

/// What a button click asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Delete the first record sharing the title of this one
    Delete(Uuid),
}

/// Decode a callback payload
pub fn parse_selection(data: &str) -> Option<Selection> {
    data.strip_prefix(DELETE_PREFIX)
        .and_then(|id| Uuid::parse_str(id).ok())
        .map(Selection::Delete)
}

/// One delete button per record, labelled with its title and carrying its id
pub fn create_delete_buttons(videos: &[VideoRecord]) -> Vec<Button> {
    videos
        .iter()
        .map(|video| Button {
            label: format!("🗑️ {}", video.title),
            data: format!("{DELETE_PREFIX}{}", video.id),
        })
        .collect()
}

/// Build the inline keyboard for a reply, if it has buttons
pub fn create_keyboard(buttons: &[Button]) -> Option<InlineKeyboardMarkup> {
    if buttons.is_empty() {
        return None;
    }

    let rows = buttons
        .iter()
        .map(|button| vec![InlineKeyboardButton::callback(button.label.clone(), button.data.clone())])
        .collect::<Vec<_>>();

    Some(InlineKeyboardMarkup::new(rows))
}

/// Format video titles as a list under a header
pub fn format_titles(videos: &[VideoRecord]) -> String {
    let titles = videos
        .iter()
        .map(|video| video.title.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    format!("{}\n{}", t("videos-list-header"), titles)
}

/// Cut a message down to what Telegram accepts, on a character boundary
pub fn truncate_message(text: &str) -> String {
    if text.encode_utf16().count() <= MAX_MESSAGE_UNITS {
        return text.to_string();
    }

    // One unit is left for the ellipsis
    let mut units = 0;
    let mut truncated: String = text
        .chars()
        .take_while(|c| {
            units += c.len_utf16();
            units < MAX_MESSAGE_UNITS
        })
        .collect();
    truncated.push('…');
    truncated
}
