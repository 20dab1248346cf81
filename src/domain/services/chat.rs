#[cfg(test)]
#[path = "chat_test.rs"]
mod tests;

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::Reconciler;
use super::TurnOutcome;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Author;
use crate::domain::models::Conversation;
use crate::domain::models::Message;
use crate::domain::models::Session;
use crate::infrastructure::api::AssistantApi;

#[derive(Debug)]
pub enum TurnResult {
    Completed { sessions: Vec<Session> },
    /// The reply streamed and reconciled fine, but the post-turn session list
    /// refresh failed. The turn does not count as a success without it.
    RefreshFailed,
    Failed,
    Cancelled,
}

/// Runs one full chat turn: user message in, streamed assistant reply
/// reconciled into the conversation, session list refreshed on success.
pub struct ChatService {
    api: Arc<AssistantApi>,
    reconciler: Reconciler,
    user_id: String,
    page_size: u64,
}

impl Default for ChatService {
    fn default() -> ChatService {
        return ChatService::new(
            Arc::new(AssistantApi::default()),
            Reconciler::default(),
            &Config::get(ConfigKey::UserId),
            Config::get_u64(ConfigKey::PageSize, 10),
        );
    }
}

impl ChatService {
    pub fn new(
        api: Arc<AssistantApi>,
        reconciler: Reconciler,
        user_id: &str,
        page_size: u64,
    ) -> ChatService {
        return ChatService {
            api,
            reconciler,
            user_id: user_id.to_string(),
            page_size,
        };
    }

    pub async fn send(
        &self,
        conversation: &mut Conversation,
        session_id: &str,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<TurnResult> {
        conversation.push(Message::new(Author::User, text));
        let placeholder_id = conversation.begin_assistant_turn()?;

        let (tx, mut rx) = mpsc::unbounded_channel();
        let api = self.api.clone();
        let session = session_id.to_string();
        let message = text.to_string();
        let user_id = self.user_id.to_string();
        let streamer = tokio::spawn(async move {
            return api.chat_stream(&session, &message, &user_id, &tx).await;
        });

        let outcome = self
            .reconciler
            .run(&mut rx, conversation, &placeholder_id, cancel)
            .await?;

        if outcome == TurnOutcome::Cancelled {
            streamer.abort();
            return Ok(TurnResult::Cancelled);
        }

        match streamer.await? {
            Ok(()) => {}
            Err(err) => {
                tracing::error!(error = %err, "Chat stream failed");
                conversation.fail_turn(
                    &placeholder_id,
                    &format!("抱歉，我暂时无法回复您的消息。错误: {err}"),
                );
                return Ok(TurnResult::Failed);
            }
        }

        match self.api.session_list(1, self.page_size, &self.user_id).await {
            Ok(sessions) => return Ok(TurnResult::Completed { sessions }),
            Err(err) => {
                tracing::warn!(error = %err, "Session list refresh failed after turn");
                return Ok(TurnResult::RefreshFailed);
            }
        }
    }
}
