#[cfg(test)]
#[path = "client_test.rs"]
mod tests;

use std::sync::Arc;

use anyhow::anyhow;
use anyhow::bail;
use anyhow::Result;
use futures::stream::TryStreamExt;
use serde::de::DeserializeOwned;
use serde_derive::Deserialize;
use serde_json::json;
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;
use tokio_util::io::StreamReader;

use super::Credentials;
use super::TokenStore;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Message;
use crate::domain::models::Session;
use crate::domain::models::StreamEvent;

fn convert_err(err: reqwest::Error) -> std::io::Error {
    let err_msg = err.to_string();
    return std::io::Error::new(std::io::ErrorKind::Interrupted, err_msg);
}

const TOKEN_EXPIRED: i64 = 1101;

#[derive(Deserialize)]
struct Envelope<T> {
    code: i64,
    #[serde(default)]
    msg: String,
    data: Option<T>,
}

#[derive(Deserialize)]
struct SessionListData {
    #[serde(default)]
    session_list: Vec<Session>,
}

#[derive(Deserialize)]
struct HistoryMessage {
    msg_id: String,
    role: String,
    content: String,
}

#[derive(Default, Debug, Clone, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    text: String,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Default, Debug, Clone, Deserialize)]
struct StreamFrame {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

pub struct AssistantApi {
    url: String,
    credentials: Arc<dyn Credentials>,
}

impl Default for AssistantApi {
    fn default() -> AssistantApi {
        return AssistantApi {
            url: Config::get(ConfigKey::ApiUrl),
            credentials: Arc::new(TokenStore::default()),
        };
    }
}

impl AssistantApi {
    pub fn new(url: &str, credentials: Arc<dyn Credentials>) -> AssistantApi {
        return AssistantApi {
            url: url.to_string(),
            credentials,
        };
    }

    pub async fn session_list(
        &self,
        page: u64,
        page_size: u64,
        user_id: &str,
    ) -> Result<Vec<Session>> {
        let body = json!({
            "page": page,
            "page_size": page_size,
            "user_id": user_id,
        });

        let data: SessionListData = self
            .request_envelope("/ai_assistant/session_list", &body)
            .await?;

        return Ok(data.session_list);
    }

    pub async fn get_history(&self, session_id: &str) -> Result<Vec<Message>> {
        let body = json!({ "session_id": session_id });

        let history: Vec<HistoryMessage> = self
            .request_envelope("/ai_assistant/get_history", &body)
            .await?;

        let messages = history
            .iter()
            .map(|item| {
                return Message::from_history(&item.msg_id, &item.role, &item.content);
            })
            .collect();

        return Ok(messages);
    }

    /// Sends one user message and feeds the chunked response through `tx` as
    /// deltas, ending with `StreamEvent::Done`. Malformed frames are logged and
    /// skipped; an expired-token envelope triggers exactly one refreshed retry.
    pub async fn chat_stream(
        &self,
        session_id: &str,
        message: &str,
        user_id: &str,
        tx: &mpsc::UnboundedSender<StreamEvent>,
    ) -> Result<()> {
        let body = json!({
            "session_id": session_id,
            "messages": message,
            "user_id": user_id,
        });

        let mut refreshed = false;
        let res = loop {
            let res = self.post("/ai_assistant/chat-stream", &body).await?;
            if !res.status().is_success() {
                tracing::error!(status = res.status().as_u16(), "Chat request failed");
                bail!("发送消息失败");
            }

            // A JSON body instead of a stream is an error envelope.
            let is_json = res
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|value| return value.to_str().ok())
                .map_or(false, |value| return value.contains("application/json"));
            if !is_json {
                break res;
            }

            let envelope = res.json::<Envelope<serde_json::Value>>().await?;
            if envelope.code != TOKEN_EXPIRED {
                bail!(format!("发送消息失败: {}", envelope.msg));
            }

            self.handle_expired(&mut refreshed).await?;
        };

        let stream = res.bytes_stream().map_err(convert_err);
        let mut lines_reader = StreamReader::new(stream).lines();

        // A read error here is a dropped connection, not end-of-stream.
        while let Some(line) = lines_reader.next_line().await? {
            emit_frames(&line, tx)?;
        }

        tx.send(StreamEvent::Done)?;
        return Ok(());
    }

    async fn request_envelope<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<T> {
        let mut refreshed = false;
        loop {
            let res = self.post(path, body).await?;
            if !res.status().is_success() {
                tracing::error!(status = res.status().as_u16(), path, "Request failed");
                bail!(format!("request to {path} failed"));
            }

            let envelope = res.json::<Envelope<T>>().await?;
            if envelope.code == TOKEN_EXPIRED {
                self.handle_expired(&mut refreshed).await?;
                continue;
            }
            if envelope.code != 0 {
                bail!(format!("request to {path} rejected: {}", envelope.msg));
            }

            return envelope
                .data
                .ok_or_else(|| return anyhow!(format!("response from {path} carried no data")));
        }
    }

    /// One refresh-and-retry per request. A second expired envelope, or a
    /// failed refresh, clears credentials and escalates — the forced-logout
    /// path.
    async fn handle_expired(&self, refreshed: &mut bool) -> Result<()> {
        if *refreshed {
            self.credentials.clear();
            bail!("登录已过期，请重新登录");
        }

        tracing::warn!("Access token expired, refreshing");
        if let Err(err) = self.credentials.refresh().await {
            tracing::error!(error = %err, "Token refresh failed, clearing credentials");
            self.credentials.clear();
            bail!("登录已过期，请重新登录");
        }

        *refreshed = true;
        return Ok(());
    }

    async fn post(&self, path: &str, body: &serde_json::Value) -> Result<reqwest::Response> {
        let res = reqwest::Client::new()
            .post(format!("{url}{path}", url = self.url))
            .header(
                "Authorization",
                format!("Bearer {}", self.credentials.access_token()),
            )
            .json(body)
            .send()
            .await?;

        return Ok(res);
    }
}

/// Splits one chunk on the literal `data:` delimiter and parses each non-empty
/// segment. A frame that fails to parse contributes nothing and never aborts
/// the stream. A frame whose only content is `finish_reason == "stop"` marks
/// end-of-content and is ignored.
fn emit_frames(chunk: &str, tx: &mpsc::UnboundedSender<StreamEvent>) -> Result<()> {
    for segment in chunk.split("data:") {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }

        let frame = match serde_json::from_str::<StreamFrame>(segment) {
            Ok(frame) => frame,
            Err(err) => {
                tracing::warn!(error = %err, segment, "Skipping malformed stream frame");
                continue;
            }
        };

        if let Some(choice) = frame.choices.first() {
            if !choice.text.is_empty() {
                tx.send(StreamEvent::Delta(choice.text.to_string()))?;
            } else if choice.finish_reason.as_deref() == Some("stop") {
                tracing::debug!("Stream frame signalled stop");
            }
        }
    }

    return Ok(());
}
