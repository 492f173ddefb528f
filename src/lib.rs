//! # Video Catalog Telegram Bot
//!
//! A Telegram bot that keeps a small catalog of videos (title, URL,
//! description) in a record store, collects new entries through a guided
//! conversation, and answers free text with replies from a generative model.

pub mod bot;
pub mod circuit_breaker;
pub mod config;
pub mod db;
pub mod dialogue;
pub mod generation;
pub mod localization;
pub mod video_model;
