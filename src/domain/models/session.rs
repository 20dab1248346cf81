use serde_derive::Deserialize;
use serde_derive::Serialize;

/// One entry from the assistant's session listing. The title and timestamp are
/// owned by the server; the client only fills them in when creating a brand new
/// conversation locally.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub last_time: String,
}
