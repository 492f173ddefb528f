//! # Video Record Data Model
//!
//! Data structures for the video catalog: the stored [`VideoRecord`] and the
//! insertable [`NewVideo`] built by the guided collection flow or by the
//! single-shot `/newvid` command.
//!
//! ## Usage
//!
//! ```rust
//! use vidbot::video_model::NewVideo;
//!
//! let video = NewVideo::new("Intro", "http://x/1").with_description("first upload");
//! assert!(video.validate().is_ok());
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// A video record as held by the record store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct VideoRecord {
    /// Store-assigned identifier, immutable once assigned
    pub id: Uuid,
    /// Non-empty title, stored verbatim
    pub title: String,
    /// URL as supplied by the user, not validated
    pub url: String,
    /// Free-form description, empty when not supplied
    pub description: String,
    /// Insertion time; listings are returned oldest first
    pub created_at: DateTime<Utc>,
}

/// A video record that has not been inserted yet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewVideo {
    pub title: String,
    pub url: String,
    pub description: String,
}

/// Validation failures for user-supplied video fields
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VideoError {
    #[error("title is empty")]
    EmptyTitle,
}

impl NewVideo {
    /// Create a video with an empty description
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            description: String::new(),
        }
    }

    /// Attach a description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Check the fields a record must carry before it is committed
    pub fn validate(&self) -> Result<(), VideoError> {
        validate_title(&self.title)
    }
}

/// Validates a title input without altering it
pub fn validate_title(title: &str) -> Result<(), VideoError> {
    if title.trim().is_empty() {
        return Err(VideoError::EmptyTitle);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_video_defaults_to_empty_description() {
        let video = NewVideo::new("Intro", "http://x/1");
        assert_eq!(video.title, "Intro");
        assert_eq!(video.url, "http://x/1");
        assert_eq!(video.description, "");
    }

    #[test]
    fn test_title_validation() {
        assert!(validate_title("Intro").is_ok());
        assert!(validate_title("  padded  ").is_ok());
        assert_eq!(validate_title(""), Err(VideoError::EmptyTitle));
        assert_eq!(validate_title(" \n\t"), Err(VideoError::EmptyTitle));
        assert!(validate_title(&"a".repeat(500)).is_ok());
        assert!(validate_title("Введение в программирование на Rust").is_ok());
    }

    #[test]
    fn test_url_is_not_validated() {
        let video = NewVideo::new("Clip", "not a url at all");
        assert!(video.validate().is_ok());
    }
}
