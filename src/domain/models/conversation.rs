#[cfg(test)]
#[path = "conversation_test.rs"]
mod tests;

use std::collections::HashMap;

use anyhow::anyhow;
use anyhow::bail;
use anyhow::Result;

use super::Author;
use super::Message;

pub const THINKING_PLACEHOLDER: &str = "思考中...\n";
pub const STILL_THINKING: &str = "还在思考中，请稍候...\n";

/// The ordered message list for one session, with an id index on the side so
/// the reconciler can find its placeholder without scanning. At most one
/// assistant placeholder may be in flight at a time; `begin_assistant_turn`
/// enforces that.
#[derive(Default)]
pub struct Conversation {
    messages: Vec<Message>,
    index: HashMap<String, usize>,
    in_flight: Option<String>,
}

impl Conversation {
    pub fn new() -> Conversation {
        return Conversation::default();
    }

    pub fn from_history(history: Vec<Message>) -> Conversation {
        let mut conversation = Conversation::new();
        for message in history {
            conversation.push(message);
        }

        return conversation;
    }

    pub fn push(&mut self, message: Message) {
        // Server history can repeat ids; keeping the first occurrence keeps the
        // index and the ordered list in sync.
        if self.index.contains_key(&message.id) {
            tracing::warn!(id = message.id, "Dropping message with duplicate id");
            return;
        }

        self.index.insert(message.id.to_string(), self.messages.len());
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        return &self.messages;
    }

    pub fn get(&self, id: &str) -> Option<&Message> {
        return self.index.get(id).map(|idx| return &self.messages[*idx]);
    }

    pub fn last(&self) -> Option<&Message> {
        return self.messages.last();
    }

    pub fn is_turn_active(&self) -> bool {
        return self.in_flight.is_some();
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        self.index.clear();
        self.in_flight = None;
    }

    /// Creates the mutable assistant placeholder for a new turn and returns its
    /// id. Fails while another turn is still streaming; two concurrent turns
    /// would corrupt the placeholder bookkeeping.
    pub fn begin_assistant_turn(&mut self) -> Result<String> {
        if self.in_flight.is_some() {
            bail!("a turn is already in flight for this session");
        }

        let placeholder = Message::new(Author::Assistant, THINKING_PLACEHOLDER);
        let id = placeholder.id.to_string();
        self.push(placeholder);
        self.in_flight = Some(id.to_string());

        return Ok(id);
    }

    /// Applies one stream delta to the placeholder, located by id, never by
    /// position. The first delta replaces the thinking text outright.
    pub fn apply_delta(&mut self, id: &str, text: &str) -> Result<()> {
        let message = self.message_mut(id)?;
        if message.text == THINKING_PLACEHOLDER || message.text == STILL_THINKING {
            message.replace(text);
        } else {
            message.append(text);
        }

        return Ok(());
    }

    /// Swaps the placeholder for the slow-response note. Does nothing once a
    /// real delta has landed.
    pub fn note_still_thinking(&mut self, id: &str) -> Result<()> {
        let message = self.message_mut(id)?;
        if message.text == THINKING_PLACEHOLDER {
            message.replace(STILL_THINKING);
        }

        return Ok(());
    }

    /// Prepends a warning marker to a message, once.
    pub fn prefix_warning(&mut self, id: &str) -> Result<()> {
        let message = self.message_mut(id)?;
        if !message.text.starts_with("⚠️") {
            let flagged = format!("⚠️ {text}", text = message.text);
            message.replace(&flagged);
        }

        return Ok(());
    }

    /// Freezes the placeholder and releases the turn lock.
    pub fn finish_turn(&mut self, id: &str) {
        if self.in_flight.as_deref() == Some(id) {
            self.in_flight = None;
        }
    }

    /// Ends a turn on failure. The placeholder is edited in place when it is
    /// still showing the thinking text; otherwise a fresh error bubble is
    /// appended so the user always ends the turn with an assistant message.
    pub fn fail_turn(&mut self, id: &str, text: &str) {
        self.finish_turn(id);

        if let Ok(message) = self.message_mut(id) {
            if message.text == THINKING_PLACEHOLDER || message.text == STILL_THINKING {
                message.set_error(text);
                return;
            }
        }

        self.push(Message::new_with_type(
            Author::Assistant,
            super::MessageType::Error,
            text,
        ));
    }

    fn message_mut(&mut self, id: &str) -> Result<&mut Message> {
        let idx = *self
            .index
            .get(id)
            .ok_or_else(|| return anyhow!(format!("no message with id {id}")))?;

        return Ok(&mut self.messages[idx]);
    }
}
