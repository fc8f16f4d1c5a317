use std::sync::Arc;

use wiremock::matchers::{body_string, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use lorebase_client::{ChatTransport, Error, Role, SessionManager, StaticTokenProvider};

async fn authed_session() -> Arc<SessionManager> {
    let provider = StaticTokenProvider::new(Some("test-bearer".to_string()));
    let manager = Arc::new(SessionManager::new(Arc::new(provider)));
    manager.refresh().await;
    manager
}

async fn transport_for(server: &MockServer) -> ChatTransport {
    ChatTransport::new(reqwest::Client::new(), server.uri(), authed_session().await)
}

#[tokio::test]
async fn plain_text_reply_lands_in_conversation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .and(header("Authorization", "Bearer test-bearer"))
        .and(header("Content-Type", "text/plain"))
        .and(body_string("What is a lorebase?"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Hello, world!"))
        .expect(1)
        .mount(&server)
        .await;

    let transport = transport_for(&server).await;
    let reply = transport
        .send_message("What is a lorebase?")
        .await
        .expect("reply");
    assert_eq!(reply.as_deref(), Some("Hello, world!"));

    let messages = transport.conversation();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, Role::User);
    assert_eq!(messages[0].text, "What is a lorebase?");
    assert_eq!(messages[1].role, Role::Assistant);
    assert_eq!(messages[1].text, "Hello, world!");
}

#[tokio::test]
async fn envelope_reply_extracts_nested_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"result":{"output":{"text":"Hi there"}}}"#),
        )
        .mount(&server)
        .await;

    let transport = transport_for(&server).await;
    let reply = transport.send_message("hello").await.expect("reply");
    assert_eq!(reply.as_deref(), Some("Hi there"));
    assert_eq!(transport.conversation()[1].text, "Hi there");
}

#[tokio::test]
async fn error_status_replaces_pending_with_error_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let transport = transport_for(&server).await;
    let err = transport.send_message("hello").await.unwrap_err();
    assert!(matches!(err, Error::Status { .. }));

    let messages = transport.conversation();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, Role::User);
    assert_eq!(messages[1].role, Role::Error);
    assert!(messages[1].text.starts_with("Error: "), "{}", messages[1].text);
    // No lingering loading bubble: the only assistant-shaped slot is the
    // error message itself.
    assert!(!messages.iter().any(|m| m.role == Role::Assistant));
}

#[tokio::test]
async fn whitespace_message_is_a_noop() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let transport = transport_for(&server).await;
    assert!(transport.send_message("").await.expect("noop").is_none());
    assert!(transport.send_message("   \n\t").await.expect("noop").is_none());
    assert!(transport.conversation().is_empty());
}

#[tokio::test]
async fn unauthenticated_send_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    // Provider with nothing to hand out: refresh fails, session stays
    // unauthenticated.
    let manager = Arc::new(SessionManager::new(Arc::new(StaticTokenProvider::new(
        None,
    ))));
    manager.refresh().await;

    let transport = ChatTransport::new(reqwest::Client::new(), server.uri(), manager);
    let err = transport.send_message("hello").await.unwrap_err();
    assert!(matches!(err, Error::NotAuthenticated));

    let messages = transport.conversation();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].role, Role::Error);
}

#[tokio::test]
async fn watcher_sees_every_fragment_in_order() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_string("streamed reply text"))
        .mount(&server)
        .await;

    let transport = transport_for(&server).await;
    let (tx, mut rx) = tokio::sync::mpsc::channel::<String>(16);

    let reply = transport
        .send_message_watched("hello", Some(&tx))
        .await
        .expect("reply")
        .expect("non-empty send");
    drop(tx);

    let mut seen = String::new();
    while let Some(fragment) = rx.recv().await {
        seen.push_str(&fragment);
    }
    assert_eq!(seen, reply);
    assert_eq!(seen, "streamed reply text");
}
