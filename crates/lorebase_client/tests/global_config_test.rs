use lorebase_client::{ConfigLoader, Error};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_body() -> serde_json::Value {
    serde_json::json!({
        "domain": "tenant.example.auth",
        "clientId": "abc123",
        "audience": "https://api.example.net",
        "scope": "openid profile",
        "fakeLogin": "false"
    })
}

#[tokio::test]
async fn loads_config_from_backend() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/config/global"))
        .respond_with(ResponseTemplate::new(200).set_body_json(config_body()))
        .expect(1)
        .mount(&server)
        .await;

    let loader = ConfigLoader::new(reqwest::Client::new(), server.uri());
    let config = loader.load().await.expect("config");

    assert_eq!(config.domain, "tenant.example.auth");
    assert_eq!(config.client_id, "abc123");
    assert!(!config.use_fake_login());
}

#[tokio::test]
async fn config_is_fetched_exactly_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/config/global"))
        .respond_with(ResponseTemplate::new(200).set_body_json(config_body()))
        .expect(1)
        .mount(&server)
        .await;

    let loader = ConfigLoader::new(reqwest::Client::new(), server.uri());
    assert!(loader.get().is_none());

    let (a, b) = tokio::join!(loader.load(), loader.load());
    assert!(a.is_ok());
    assert!(b.is_ok());

    // A third call comes from the cache; the mock's expect(1) verifies no
    // further request went out.
    loader.load().await.expect("cached config");
    assert!(loader.get().is_some());
}

#[tokio::test]
async fn non_success_status_is_a_hard_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/config/global"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let loader = ConfigLoader::new(reqwest::Client::new(), server.uri());
    let err = loader.load().await.unwrap_err();
    assert!(matches!(err, Error::ConfigLoad(_)));
    assert!(loader.get().is_none());
}

#[tokio::test]
async fn malformed_payload_is_a_hard_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/config/global"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let loader = ConfigLoader::new(reqwest::Client::new(), server.uri());
    let err = loader.load().await.unwrap_err();
    assert!(matches!(err, Error::ConfigLoad(_)));
}
