use crate::preferences::{Choice, Preferences};

pub const NO_GEAR: &str = "No gear specified";
pub const NO_MOUNTAIN: &str = "Not specified";

const PREAMBLE: &str = "You are an experienced mountain expedition assistant. \
                        Answer based on the following context:";

/// Builds the instruction sent to the model for one turn. Preference lines
/// always appear in the same order, followed by the user's message.
pub fn compose(prefs: &Preferences, user_text: &str) -> String {
    let gear = if prefs.gear.is_empty() {
        NO_GEAR.to_string()
    } else {
        prefs
            .gear
            .checked()
            .map(|g| g.label())
            .collect::<Vec<_>>()
            .join(", ")
    };
    let mountain = prefs.mountain_name.as_deref().unwrap_or(NO_MOUNTAIN);

    format!(
        "{PREAMBLE}\n\n\
         - Focus: {}\n\
         - Experience Level: {}\n\
         - Target Mountain: {mountain}\n\
         - Season: {}\n\
         - Carried Equipment: {gear}\n\
         - Response Style: {}\n\
         - Language: {}\n\n\
         User message: {user_text}",
        prefs.focus_topic.label(),
        prefs.experience_level.label(),
        prefs.season.label(),
        prefs.response_style.label(),
        prefs.response_language.label(),
    )
}
