//! Bot module for handling Telegram interactions
//!
//! This module is split into several submodules:
//! - `commands`: Parses command text and holds the command table
//! - `context`: Turns one incoming event into a reply, independent of Telegram
//! - `dialogue_manager`: Owns the guided collection sessions
//! - `message_handler`: Handles incoming messages
//! - `callback_handler`: Handles inline keyboard callback queries
//! - `ui_builder`: Creates keyboards and formats messages

pub mod callback_handler;
pub mod commands;
pub mod context;
pub mod dialogue_manager;
pub mod message_handler;
pub mod ui_builder;

// Re-export main handler functions for use in main.rs
pub use callback_handler::callback_handler;
pub use message_handler::message_handler;

pub use context::{BotContext, Incoming};
pub use dialogue_manager::SessionKey;
pub use ui_builder::{Button, Reply};
