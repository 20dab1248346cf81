#[cfg(test)]
#[path = "reconciler_test.rs"]
mod tests;

use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Conversation;
use crate::domain::models::StreamEvent;

pub const CANCELLED_NOTICE: &str = "已停止生成。";

const RATE_LIMIT_PHRASES: [&str; 4] = ["rate limit", "限流", "请求过于频繁", "系统繁忙"];

#[derive(Debug, PartialEq, Eq)]
pub enum TurnOutcome {
    Completed,
    Cancelled,
}

/// Drains one turn's stream events into the conversation. All mutation goes
/// through the placeholder id handed out by `begin_assistant_turn`, so a
/// reordered or late event can never touch another message.
pub struct Reconciler {
    thinking_after: Duration,
}

impl Default for Reconciler {
    fn default() -> Reconciler {
        return Reconciler::new(Duration::from_millis(Config::get_u64(
            ConfigKey::StreamThinkingTimeout,
            3000,
        )));
    }
}

impl Reconciler {
    pub fn new(thinking_after: Duration) -> Reconciler {
        return Reconciler { thinking_after };
    }

    pub async fn run(
        &self,
        rx: &mut mpsc::UnboundedReceiver<StreamEvent>,
        conversation: &mut Conversation,
        placeholder_id: &str,
        cancel: &CancellationToken,
    ) -> Result<TurnOutcome> {
        let reminder = tokio::time::sleep(self.thinking_after);
        tokio::pin!(reminder);

        let mut got_delta = false;
        let mut reminder_fired = false;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    rx.close();
                    conversation.fail_turn(placeholder_id, CANCELLED_NOTICE);
                    return Ok(TurnOutcome::Cancelled);
                }
                _ = &mut reminder, if !got_delta && !reminder_fired => {
                    reminder_fired = true;
                    conversation.note_still_thinking(placeholder_id)?;
                }
                event = rx.recv() => {
                    match event {
                        Some(StreamEvent::Delta(text)) => {
                            got_delta = true;
                            conversation.apply_delta(placeholder_id, &text)?;
                        }
                        Some(StreamEvent::Done) | None => {
                            self.finish(conversation, placeholder_id)?;
                            return Ok(TurnOutcome::Completed);
                        }
                    }
                }
            }
        }
    }

    fn finish(&self, conversation: &mut Conversation, placeholder_id: &str) -> Result<()> {
        // The marker goes on at most once, over the final text, so a phrase
        // split across two deltas is still caught.
        if let Some(message) = conversation.get(placeholder_id) {
            let lowered = message.text.to_lowercase();
            if RATE_LIMIT_PHRASES.iter().any(|phrase| return lowered.contains(phrase)) {
                conversation.prefix_warning(placeholder_id)?;
            }
        }

        conversation.finish_turn(placeholder_id);
        return Ok(());
    }
}
