use serde_derive::Deserialize;
use serde_derive::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Author {
    User,
    Assistant,
}

impl Author {
    pub fn from_role(role: &str) -> Author {
        if role == "user" {
            return Author::User;
        }
        return Author::Assistant;
    }

    pub fn role(&self) -> &'static str {
        match self {
            Author::User => return "user",
            Author::Assistant => return "assistant",
        }
    }
}
