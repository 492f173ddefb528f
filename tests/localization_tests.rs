//! # Localization Tests
//!
//! Message retrieval and formatting for the bundled English messages.

use vidbot::bot::commands::COMMAND_TABLE;
use vidbot::localization::{t, t_args, LocalizationManager};
use std::collections::HashMap;

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_localization() -> LocalizationManager {
        LocalizationManager::new().expect("Failed to create localization manager")
    }

    #[test]
    fn test_get_message_existing_key() {
        let manager = setup_localization();

        let message = manager.get_message_in_language("newvid-usage", "en", None);
        assert_eq!(message, "Usage: /newvid <title> <url> [description]");
    }

    #[test]
    fn test_get_message_nonexistent_key() {
        let manager = setup_localization();

        let message = manager.get_message_in_language("nonexistent-key", "en", None);
        assert!(message.starts_with("Missing translation:"));
    }

    #[test]
    fn test_get_message_unsupported_language() {
        let manager = setup_localization();

        let message = manager.get_message_in_language("videos-none", "de", None);
        // Falls back to English
        assert_eq!(message, "No videos found.");
    }

    #[test]
    fn test_get_message_with_args() {
        let manager = setup_localization();

        let mut args = HashMap::new();
        args.insert("count", "3");

        let message = manager.get_message_in_language("videos-count", "en", Some(&args));
        assert_eq!(message, "📊 Total videos: 3");
    }

    #[test]
    fn test_arguments_are_not_isolated() {
        let manager = setup_localization();

        let message = manager.get_message_with_args("delete-success", &[("title", "Intro")]);
        assert!(message.ends_with("Deleted video: Intro"));
        assert!(!message.contains('\u{2068}'));
    }

    #[test]
    fn test_every_command_has_a_description() {
        for (name, _, description_key) in COMMAND_TABLE {
            let description = t(description_key);
            assert!(
                !description.starts_with("Missing translation"),
                "no description for /{name}"
            );
        }
    }

    #[test]
    fn test_global_helpers() {
        assert_eq!(t("command-unknown"), "Sorry, I don't recognize that command.");
        assert_eq!(
            t_args("videos-flushed", &[("count", "0")]),
            "🗑️ Flushed 0 videos from the database."
        );
    }
}
