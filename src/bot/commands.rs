//! Command parsing for text messages
//!
//! A command is a message starting with `/`. The name may carry an
//! `@botname` suffix; arguments are split on whitespace with double quotes
//! grouping words, so `/newvid "My clip" http://x` has two arguments.

use regex::Regex;
use std::sync::LazyLock;

static COMMAND_HEADER: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^/([A-Za-z0-9_]+)(?:@([A-Za-z0-9_]+))?(?:\s+([\s\S]*))?$").ok()
});

/// Commands understood by the bot
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Command {
    Start,
    Help,
    NewVid,
    Delete,
    FlushDb,
    VideosList,
    VideosLength,
    Cancel,
}

/// Command names and the Fluent key of their description, in menu order
pub const COMMAND_TABLE: &[(&str, Command, &str)] = &[
    ("start", Command::Start, "command-start"),
    ("help", Command::Help, "command-help"),
    ("newvid", Command::NewVid, "command-newvid"),
    ("delete", Command::Delete, "command-delete"),
    ("flushdb", Command::FlushDb, "command-flushdb"),
    ("videoslist", Command::VideosList, "command-videoslist"),
    ("videoslength", Command::VideosLength, "command-videoslength"),
    ("cancel", Command::Cancel, "command-cancel"),
];

impl Command {
    /// Look up a command by name, ignoring case
    pub fn from_name(name: &str) -> Option<Self> {
        COMMAND_TABLE
            .iter()
            .find(|(command_name, _, _)| command_name.eq_ignore_ascii_case(name))
            .map(|(_, command, _)| *command)
    }

    pub fn name(self) -> &'static str {
        COMMAND_TABLE
            .iter()
            .find(|(_, command, _)| *command == self)
            .map(|(name, _, _)| *name)
            .unwrap_or_default()
    }
}

/// Result of parsing a text message
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParsedText {
    /// A known command with its arguments
    Command { command: Command, args: Vec<String> },
    /// Looks like a command but is not one of ours
    Unknown { name: String },
    /// Plain text
    Text,
}

/// Whether a message would be treated as a command rather than a field value
pub fn is_command_text(text: &str) -> bool {
    text.trim_start().starts_with('/')
}

/// Parse a text message
///
/// `bot_username` is compared against an `@botname` suffix; commands
/// addressed to another bot are reported as unknown.
pub fn parse_text(text: &str, bot_username: Option<&str>) -> ParsedText {
    let text = text.trim();
    if !is_command_text(text) {
        return ParsedText::Text;
    }

    let captures = match COMMAND_HEADER.as_ref().and_then(|re| re.captures(text)) {
        Some(captures) => captures,
        None => {
            return ParsedText::Unknown {
                name: text.split_whitespace().next().unwrap_or(text).to_string(),
            }
        }
    };

    let name = captures.get(1).map_or("", |m| m.as_str());
    let addressed_elsewhere = match (captures.get(2), bot_username) {
        (Some(target), Some(username)) => !target.as_str().eq_ignore_ascii_case(username),
        _ => false,
    };

    match Command::from_name(name) {
        Some(command) if !addressed_elsewhere => ParsedText::Command {
            command,
            args: split_arguments(captures.get(3).map_or("", |m| m.as_str())),
        },
        _ => ParsedText::Unknown {
            name: name.to_string(),
        },
    }
}

/// Split an argument string on whitespace, honouring double quotes
pub fn split_arguments(input: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut has_token = false;

    for c in input.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                has_token = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if has_token {
                    args.push(std::mem::take(&mut current));
                    has_token = false;
                }
            }
            c => {
                current.push(c);
                has_token = true;
            }
        }
    }

    if has_token {
        args.push(current);
    }

    args
}
