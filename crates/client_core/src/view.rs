//! View collaborator: everything the controller reads from or writes to the screen.

use shared::domain::{ChatMessage, MessageOrigin};

/// One entry of the visible message log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub text: String,
    pub origin: MessageOrigin,
    /// Secondary line listing the sources, present only when there are any.
    pub sources_line: Option<String>,
}

impl RenderedMessage {
    pub fn new(text: impl Into<String>, origin: MessageOrigin, sources: &[String]) -> Self {
        let sources_line = if sources.is_empty() {
            None
        } else {
            Some(format!("Sources: {}", sources.join(", ")))
        };
        Self {
            text: text.into(),
            origin,
            sources_line,
        }
    }
}

impl From<&ChatMessage> for RenderedMessage {
    fn from(message: &ChatMessage) -> Self {
        Self::new(message.text.clone(), message.origin, &message.sources)
    }
}

/// Typed stand-in for the page elements the controller drives.
///
/// Implementations are owned by the controller and only touched from the task
/// that owns it.
pub trait ChatView: Send {
    fn website_url(&self) -> String;
    fn force_scrape(&self) -> bool;

    fn show_loading(&mut self);
    fn hide_loading(&mut self);

    /// Hide the setup form and reveal the chat log and input.
    fn show_chat_view(&mut self);

    fn message_input(&self) -> String;
    fn clear_message_input(&mut self);

    fn append_message(&mut self, message: RenderedMessage);
    fn scroll_to_latest(&mut self);
    fn clear_messages(&mut self);

    /// Blocking, user-facing notice.
    fn notify(&mut self, notice: &str);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sources_are_comma_joined_on_a_secondary_line() {
        let rendered = RenderedMessage::new(
            "X",
            MessageOrigin::Bot,
            &["a".to_string(), "b".to_string()],
        );
        assert_eq!(rendered.sources_line.as_deref(), Some("Sources: a, b"));
    }

    #[test]
    fn no_sources_line_without_sources() {
        let rendered = RenderedMessage::new("X", MessageOrigin::Bot, &[]);
        assert_eq!(rendered.sources_line, None);
        assert_eq!(rendered.text, "X");
    }
}
