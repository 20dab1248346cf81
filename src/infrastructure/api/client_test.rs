use std::io::Write;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;

use super::AssistantApi;
use super::Credentials;
use super::TokenStore;
use crate::domain::models::Author;
use crate::domain::models::StreamEvent;

fn api_with(server: &mockito::Server, token: &str, refresh_token: &str) -> AssistantApi {
    let store = TokenStore::new(&server.url(), token, refresh_token);
    return AssistantApi::new(&server.url(), Arc::new(store));
}

#[tokio::test]
async fn it_fetches_the_session_list() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/ai_assistant/session_list")
        .match_header("Authorization", "Bearer abc")
        .with_status(200)
        .with_body(
            r#"{"code":0,"data":{"session_list":[
                {"session_id":"123456","last_time":"2025-07-26 01:40:54","title":"深圳旅游攻略"}
            ]}}"#,
        )
        .create();

    let api = api_with(&server, "abc", "");
    let sessions = api.session_list(1, 10, "u_1").await?;

    mock.assert();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].session_id, "123456");
    assert_eq!(sessions[0].title, "深圳旅游攻略");
    return Ok(());
}

#[tokio::test]
async fn it_fetches_history_as_messages() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/ai_assistant/get_history")
        .with_status(200)
        .with_body(
            r#"{"code":0,"data":[
                {"msg_id":"m1","role":"user","content":"你好"},
                {"msg_id":"m2","role":"assistant","content":"你好呀"}
            ]}"#,
        )
        .create();

    let api = api_with(&server, "abc", "");
    let messages = api.get_history("123456").await?;

    mock.assert();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].author, Author::User);
    assert_eq!(messages[1].author, Author::Assistant);
    assert_eq!(messages[1].text, "你好呀");
    return Ok(());
}

#[tokio::test]
async fn it_retries_once_with_a_refreshed_token() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let expired = server
        .mock("POST", "/ai_assistant/session_list")
        .match_header("Authorization", "Bearer stale")
        .with_status(200)
        .with_body(r#"{"code":1101,"msg":"token已过期，请刷新"}"#)
        .expect(1)
        .create();
    let refresh = server
        .mock("POST", "/auth/refresh")
        .with_status(200)
        .with_body(r#"{"code":0,"data":{"token":"fresh"}}"#)
        .expect(1)
        .create();
    let retried = server
        .mock("POST", "/ai_assistant/session_list")
        .match_header("Authorization", "Bearer fresh")
        .with_status(200)
        .with_body(r#"{"code":0,"data":{"session_list":[]}}"#)
        .expect(1)
        .create();

    let api = api_with(&server, "stale", "refresh-me");
    let sessions = api.session_list(1, 10, "u_1").await?;

    expired.assert();
    refresh.assert();
    retried.assert();
    assert!(sessions.is_empty());
    return Ok(());
}

#[tokio::test]
async fn it_forces_logout_when_the_retry_is_still_expired() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let expired = server
        .mock("POST", "/ai_assistant/session_list")
        .with_status(200)
        .with_body(r#"{"code":1101,"msg":"token已过期，请刷新"}"#)
        .expect(2)
        .create();
    let refresh = server
        .mock("POST", "/auth/refresh")
        .with_status(200)
        .with_body(r#"{"code":0,"data":{"token":"fresh"}}"#)
        .expect(1)
        .create();

    let store = Arc::new(TokenStore::new(&server.url(), "stale", "refresh-me"));
    let api = AssistantApi::new(&server.url(), store.clone());
    let res = api.session_list(1, 10, "u_1").await;

    expired.assert();
    refresh.assert();
    assert!(res.is_err());
    // Credentials are wiped on the forced-logout path.
    assert_eq!(store.access_token(), "");
    return Ok(());
}

#[tokio::test]
async fn it_forces_logout_when_the_refresh_itself_fails() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let expired = server
        .mock("POST", "/ai_assistant/session_list")
        .with_status(200)
        .with_body(r#"{"code":1101,"msg":"token已过期，请刷新"}"#)
        .expect(1)
        .create();
    let refresh = server
        .mock("POST", "/auth/refresh")
        .with_status(500)
        .expect(1)
        .create();

    let api = api_with(&server, "stale", "refresh-me");
    let res = api.session_list(1, 10, "u_1").await;

    expired.assert();
    refresh.assert();
    assert!(res.is_err());
    return Ok(());
}

#[tokio::test]
async fn it_streams_deltas_and_skips_malformed_frames() -> Result<()> {
    let body = [
        r#"data: {"choices":[{"text":"Hello"}]}"#,
        "data: {not json at all",
        r#"data: {"choices":[{"text":" world","finish_reason":"stop"}]}"#,
        r#"data: {"choices":[{"text":"","finish_reason":"stop"}]}"#,
    ]
    .join("\n");

    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/ai_assistant/chat-stream")
        .with_status(200)
        .with_header("content-type", "text/event-stream")
        .with_body(body)
        .create();

    let (tx, mut rx) = mpsc::unbounded_channel::<StreamEvent>();
    let api = api_with(&server, "abc", "");
    api.chat_stream("123456", "你好", "u_1", &tx).await?;

    mock.assert();
    assert_eq!(rx.recv().await, Some(StreamEvent::Delta("Hello".to_string())));
    assert_eq!(
        rx.recv().await,
        Some(StreamEvent::Delta(" world".to_string()))
    );
    assert_eq!(rx.recv().await, Some(StreamEvent::Done));
    return Ok(());
}

#[tokio::test]
async fn it_surfaces_a_connection_drop_mid_stream() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/ai_assistant/chat-stream")
        .with_status(200)
        .with_header("content-type", "text/event-stream")
        .with_chunked_body(|writer| {
            writer.write_all(b"data: {\"choices\":[{\"text\":\"Hello\"}]}\n")?;
            writer.flush()?;
            return Err(std::io::Error::new(
                std::io::ErrorKind::ConnectionAborted,
                "connection dropped",
            ));
        })
        .create();

    let (tx, mut rx) = mpsc::unbounded_channel::<StreamEvent>();
    let api = api_with(&server, "abc", "");
    let res = api.chat_stream("123456", "你好", "u_1", &tx).await;

    mock.assert();
    assert!(res.is_err());
    // Nothing after the delivered deltas, and in particular no Done.
    drop(tx);
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    assert!(!events.contains(&StreamEvent::Done));
    return Ok(());
}

#[tokio::test]
async fn it_treats_a_json_chat_response_as_an_error_envelope() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/ai_assistant/chat-stream")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"code":500,"msg":"服务器内部错误"}"#)
        .create();

    let (tx, mut rx) = mpsc::unbounded_channel::<StreamEvent>();
    let api = api_with(&server, "abc", "");
    let res = api.chat_stream("123456", "你好", "u_1", &tx).await;

    mock.assert();
    assert!(res.is_err());
    // No Done is emitted on setup failure; the channel just closes.
    drop(tx);
    assert_eq!(rx.recv().await, None);
    return Ok(());
}
