//! Integration tests for username negotiation.

mod common;

use chadt_proto::{Message, MessageType};
use common::TestServer;

#[tokio::test]
async fn test_accept_then_reject_duplicate() {
    let server = TestServer::spawn().await.expect("spawn server");
    let mut first = server.connect().await.unwrap();
    assert_eq!(first.username, "user0");

    let verdict = first.ask_for_username("alice").await.unwrap();
    assert_eq!(verdict.message_type, MessageType::UsernameAccepted);
    assert_eq!(verdict.text, "alice");
    assert_eq!(verdict.recipient, "alice");
    first.username = verdict.text;

    let second = server.connect().await.unwrap();
    let verdict = second.ask_for_username("alice").await.unwrap();
    assert_eq!(verdict.message_type, MessageType::UsernameRejected);
    assert_eq!(verdict.text, "alice");
    assert_eq!(verdict.recipient, "user1");

    server.wait_for_usernames(&["alice", "user1"]).await.unwrap();
    server.shutdown().await;
}

#[tokio::test]
async fn test_rename_is_broadcast() {
    let server = TestServer::spawn().await.expect("spawn server");
    let watcher = server.connect().await.unwrap();
    let mut renamer = server.connect().await.unwrap();

    renamer.request_username("bob").await.unwrap();

    let change = watcher.expect(MessageType::UserNameChange).await.unwrap();
    assert_eq!(change.text, "user1,bob");
    assert_eq!(change.name_change(), Some(("user1", "bob")));
    assert_eq!(change.sender, "SERVER");

    // The renamer hears about itself too.
    let own = renamer.expect(MessageType::UserNameChange).await.unwrap();
    assert_eq!(own.text, "user1,bob");
    server.shutdown().await;
}

#[tokio::test]
async fn test_invalid_names_are_rejected() {
    let server = TestServer::spawn().await.expect("spawn server");
    let client = server.connect().await.unwrap();

    let too_long = "x".repeat(33);
    for name in ["", " padded", "padded ", "a,b", "ALL", "SERVER", too_long.as_str()] {
        let verdict = client.ask_for_username(name).await.unwrap();
        assert_eq!(
            verdict.message_type,
            MessageType::UsernameRejected,
            "{name:?} should be rejected"
        );
        assert_eq!(verdict.text, name);
    }

    server.wait_for_usernames(&["user0"]).await.unwrap();
    server.shutdown().await;
}

#[tokio::test]
async fn test_configured_bounds_apply() {
    let server = TestServer::spawn_with(|config| {
        config.server.username_min_length = 3;
        config.server.username_max_length = 5;
    })
    .await
    .expect("spawn server");
    let client = server.connect().await.unwrap();

    let short = client.ask_for_username("al").await.unwrap();
    assert_eq!(short.message_type, MessageType::UsernameRejected);
    let long = client.ask_for_username("alicia").await.unwrap();
    assert_eq!(long.message_type, MessageType::UsernameRejected);
    let fits = client.ask_for_username("alice").await.unwrap();
    assert_eq!(fits.message_type, MessageType::UsernameAccepted);
    server.shutdown().await;
}

#[tokio::test]
async fn test_released_name_can_be_claimed() {
    let server = TestServer::spawn().await.expect("spawn server");
    let mut first = server.connect().await.unwrap();
    first.request_username("alice").await.unwrap();
    first.request_username("alicia").await.unwrap();

    let mut second = server.connect().await.unwrap();
    second.request_username("alice").await.unwrap();

    server.wait_for_usernames(&["alice", "alicia"]).await.unwrap();
    server.shutdown().await;
}

#[tokio::test]
async fn test_sender_reflects_current_username() {
    let server = TestServer::spawn().await.expect("spawn server");
    let mut speaker = server.connect().await.unwrap();
    let listener = server.connect().await.unwrap();

    speaker.request_username("alice").await.unwrap();
    // Claims to be someone else; the server knows better.
    speaker
        .send(&Message::text("hi", "mallory", "ALL"))
        .await
        .unwrap();

    let heard = listener.expect(MessageType::Text).await.unwrap();
    assert_eq!(heard.sender, "alice");
    assert_eq!(heard.text, "hi");
    server.shutdown().await;
}

#[tokio::test]
async fn test_name_must_fit_narrower_recipient_field() {
    let server = TestServer::spawn_with(|config| {
        config.protocol.sender_max_length = 32;
        config.protocol.recipient_max_length = 8;
    })
    .await
    .expect("spawn server");
    assert!(chadt::config::validate(server.config()).is_ok());

    let mut client = server.connect().await.unwrap();
    let verdict = client.ask_for_username("abcdefghijkl").await.unwrap();
    assert_eq!(verdict.message_type, MessageType::UsernameRejected);
    assert_eq!(verdict.recipient, "user0");

    client.request_username("eightchr").await.unwrap();
    assert_eq!(client.username, "eightchr");

    // The accepted name still works as a direct-message recipient.
    let other = server.connect().await.unwrap();
    other.say("eightchr", "psst").await.unwrap();
    let heard = client.expect(MessageType::Text).await.unwrap();
    assert_eq!(heard.text, "psst");
    assert_eq!(heard.recipient, "eightchr");

    server.wait_for_usernames(&["eightchr", "user1"]).await.unwrap();
    server.shutdown().await;
}
