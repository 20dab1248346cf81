#[cfg(test)]
#[path = "message_test.rs"]
mod tests;

use uuid::Uuid;

use super::Author;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MessageType {
    Normal,
    Error,
}

#[derive(Clone, Debug)]
pub struct Message {
    pub id: String,
    pub author: Author,
    pub text: String,
    mtype: MessageType,
}

impl Message {
    pub fn new(author: Author, text: &str) -> Message {
        return Message {
            id: Uuid::new_v4().to_string(),
            author,
            text: text.to_string(),
            mtype: MessageType::Normal,
        };
    }

    pub fn new_with_type(author: Author, mtype: MessageType, text: &str) -> Message {
        return Message {
            id: Uuid::new_v4().to_string(),
            author,
            text: text.to_string(),
            mtype,
        };
    }

    /// Rebuilds a message fetched from the backend history endpoint, keeping
    /// the server-assigned id.
    pub fn from_history(msg_id: &str, role: &str, content: &str) -> Message {
        return Message {
            id: msg_id.to_string(),
            author: Author::from_role(role),
            text: content.to_string(),
            mtype: MessageType::Normal,
        };
    }

    pub fn message_type(&self) -> MessageType {
        return self.mtype;
    }

    pub fn append(&mut self, text: &str) {
        self.text += text;
    }

    pub fn replace(&mut self, text: &str) {
        self.text = text.to_string();
    }

    pub fn set_error(&mut self, text: &str) {
        self.text = text.to_string();
        self.mtype = MessageType::Error;
    }
}
