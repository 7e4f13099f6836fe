// Transcript projection. The log is small and turn-based, so callers simply
// re-render the whole thing after each interaction.

use serde::Serialize;

use crate::session::{Message, Role};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Block<'a> {
    pub role: Role,
    pub speaker: &'static str,
    pub body: &'a str,
}

pub const fn speaker(role: Role) -> &'static str {
    match role {
        Role::User => "You",
        Role::Assistant => "AURA",
    }
}

pub fn blocks(messages: &[Message]) -> Vec<Block<'_>> {
    messages
        .iter()
        .map(|m| Block {
            role: m.role(),
            speaker: speaker(m.role()),
            body: m.content(),
        })
        .collect()
}

/// Plain-text transcript for the terminal: a speaker header per block, the
/// body indented underneath, blank line between blocks.
pub fn plain(messages: &[Message]) -> String {
    blocks(messages)
        .iter()
        .map(|b| {
            let body = b
                .body
                .lines()
                .map(|l| format!("  {l}"))
                .collect::<Vec<_>>()
                .join("\n");
            format!("{}:\n{body}", b.speaker)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocks_keep_order_and_roles() {
        let log = vec![
            Message::user("Is a tent enough?"),
            Message::assistant("Bring a rain fly too."),
            Message::user("Thanks"),
        ];
        let rendered = blocks(&log);
        let roles: Vec<_> = rendered.iter().map(|b| b.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant, Role::User]);
        assert_eq!(rendered[1].speaker, "AURA");
        assert_eq!(rendered[1].body, "Bring a rain fly too.");
    }

    #[test]
    fn test_blocks_of_empty_log() {
        assert!(blocks(&[]).is_empty());
        assert_eq!(plain(&[]), "");
    }

    #[test]
    fn test_plain_indents_multiline_bodies() {
        let log = vec![Message::user("hi"), Message::assistant("line one\nline two")];
        assert_eq!(plain(&log), "You:\n  hi\n\nAURA:\n  line one\n  line two");
    }
}
