//! Integration tests for the REST client against a mock server

use serde_json::{json, Value};
use session_rest_client::session::{self, LOGIN_PATH, REGISTRATION_PATH};
use session_rest_client::token_store::TOKENS_KEY;
use session_rest_client::{
    ClientConfig, Credentials, FileTokenStore, MemoryTokenStore, RestClient, TokenPair, TokenStore,
};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const REFRESH: &str = "/auth/refresh_tokens/";

fn client_for(server: &MockServer, tokens: TokenPair) -> RestClient<MemoryTokenStore> {
    let store = MemoryTokenStore::with_tokens(&tokens).unwrap();
    RestClient::new(ClientConfig::new(server.uri()), store).unwrap()
}

#[tokio::test]
async fn test_expired_access_token_is_refreshed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/widgets"))
        .and(header("authorization", "Bearer old"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "token expired"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path(REFRESH))
        .and(body_json(json!({"refresh": "r1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "new"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/widgets"))
        .and(header("authorization", "Bearer new"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, TokenPair::new("old", "r1"));

    let payload: Value = client.get("/widgets", true).await.unwrap();
    assert_eq!(payload, json!({"id": 1}));
    assert_eq!(client.token_store().tokens(), TokenPair::new("new", "r1"));
}

#[tokio::test]
async fn test_missing_session_fails_without_retry() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/widgets"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "no token"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path(REFRESH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "new"})))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, TokenPair::default());

    let err = client.get::<Value>("/widgets", true).await.unwrap_err();
    assert_eq!(err.status, 403);
    assert_eq!(err.status_text, "Forbidden");
    assert!(err.is_session_expired());
}

#[tokio::test]
async fn test_registration_returns_grant_untouched() {
    let mock_server = MockServer::start().await;

    let grant = json!({"username": "alice", "tokens": {"access": "a", "refresh": "b"}});
    Mock::given(method("POST"))
        .and(path(REGISTRATION_PATH))
        .and(body_json(json!({"username": "alice", "password": "pw", "secret_key": "SECRET-1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(&grant))
        .expect(1)
        .mount(&mock_server)
        .await;

    let store = MemoryTokenStore::new();
    let client = RestClient::new(ClientConfig::new(mock_server.uri()), store.clone()).unwrap();

    let credentials = Credentials::registration("alice", "pw", "SECRET-1");
    let result = session::register(&client, &credentials).await.unwrap();
    assert_eq!(result.username, "alice");
    assert_eq!(result.tokens, TokenPair::new("a", "b"));
    assert!(!store.contains(TOKENS_KEY));

    session::persist(&store, &result).unwrap();
    assert!(session::is_logged_in(&store));
}

#[tokio::test]
async fn test_retry_failure_without_api_body_is_unauthorized() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/widgets/1"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .expect(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path(REFRESH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "new"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, TokenPair::new("old", "r1"));

    let err = client
        .put::<_, Value>("/widgets/1", &json!({"name": "gear"}), true)
        .await
        .unwrap_err();
    assert_eq!(err.status, 401);
    assert_eq!(err.status_text, "Unauthorized");
    assert_eq!(err.message, "Request failed with status code 500");
}

#[tokio::test]
async fn test_login_error_is_passed_through() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path(LOGIN_PATH))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"message": "Invalid username or password"})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path(REFRESH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "new"})))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, TokenPair::new("old", "r1"));

    let err = session::login(&client, &Credentials::login("alice", "wrong"))
        .await
        .unwrap_err();
    assert_eq!(err.status, 400);
    assert_eq!(err.status_text, "Bad Request");
    assert_eq!(err.kind, "RESTError");
    assert_eq!(err.to_string(), "Bad Request: Invalid username or password");
    assert_eq!(err.user_message(), "Invalid username or password");
}

#[tokio::test]
async fn test_delete_without_body_succeeds() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/widgets/1"))
        .and(header("authorization", "Bearer live"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, TokenPair::new("live", "r1"));

    let payload: Value = client.delete("/widgets/1", true).await.unwrap();
    assert_eq!(payload, Value::Null);
}

#[tokio::test]
async fn test_refreshed_token_survives_in_file_store() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/widgets"))
        .and(header("authorization", "Bearer old"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "token expired"})))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path(REFRESH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "new"})))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/widgets"))
        .and(header("authorization", "Bearer new"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let store_path = dir.path().join("session.json");
    let store = FileTokenStore::open(&store_path).unwrap();
    store.set_tokens(&TokenPair::new("old", "r1")).unwrap();

    let client = RestClient::new(ClientConfig::new(mock_server.uri()), store).unwrap();
    let payload: Vec<Value> = client.get("/widgets", true).await.unwrap();
    assert!(payload.is_empty());

    let reopened = FileTokenStore::open(&store_path).unwrap();
    assert_eq!(reopened.tokens(), TokenPair::new("new", "r1"));
}

#[tokio::test]
async fn test_connection_failure_is_normalized() {
    let store = MemoryTokenStore::new();
    let client = RestClient::new(ClientConfig::new("http://127.0.0.1:1"), store).unwrap();

    let err = client.get::<Value>("/widgets", false).await.unwrap_err();
    assert_eq!(err.status, 401);
    assert_eq!(err.status_text, "Unauthorized");
    assert_eq!(err.kind, "ConnectionError");
}
