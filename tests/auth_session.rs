use std::sync::Arc;

use async_trait::async_trait;
use matchpoint_client::auth::{MemoryTokenStore, TokenStore, TokenStoreError};
use matchpoint_client::config::ClientOptions;
use matchpoint_client::error::Error;
use matchpoint_client::Matchpoint;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_with_store(server: &MockServer, store: Arc<dyn TokenStore>) -> Matchpoint {
    Matchpoint::new_with_options(&server.uri(), ClientOptions::default(), store)
}

#[tokio::test]
async fn login_stores_token_and_user() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_partial_json(json!({"email": "a@b.com"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accessToken": "t1",
            "user": {"id": "u1", "email": "a@b.com", "name": "A"}
        })))
        .mount(&mock_server)
        .await;

    let store = Arc::new(MemoryTokenStore::new());
    let client = client_with_store(&mock_server, store.clone());

    let user = client.auth().login("a@b.com", "pw").await.unwrap();
    assert_eq!(user.id.as_deref(), Some("u1"));

    let snapshot = client.auth().snapshot();
    assert!(snapshot.logged_in);
    assert_eq!(snapshot.user.unwrap().email, "a@b.com");
    assert_eq!(client.auth().access_token().as_deref(), Some("t1"));
    assert_eq!(store.load().await.unwrap().as_deref(), Some("t1"));
}

#[tokio::test]
async fn login_accepts_snake_case_token_under_data() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "access_token": "t2",
                "user": {"_id": "u2", "username": "a@b.com"}
            }
        })))
        .mount(&mock_server)
        .await;

    let client = client_with_store(&mock_server, Arc::new(MemoryTokenStore::new()));

    let user = client.auth().login("a@b.com", "pw").await.unwrap();
    assert_eq!(user.id.as_deref(), Some("u2"));
    assert_eq!(client.auth().access_token().as_deref(), Some("t2"));
}

#[tokio::test]
async fn login_failure_leaves_store_logged_out() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "statusCode": 401,
            "message": "Wrong password"
        })))
        .mount(&mock_server)
        .await;

    let client = client_with_store(&mock_server, Arc::new(MemoryTokenStore::new()));

    let err = client.auth().login("a@b.com", "nope").await.unwrap_err();
    match err {
        Error::Api { status, message } => {
            assert_eq!(status, 401);
            assert_eq!(message, "Wrong password");
        }
        other => panic!("expected Api error, got {:?}", other),
    }

    let snapshot = client.auth().snapshot();
    assert!(!snapshot.logged_in);
    assert!(snapshot.user.is_none());
    assert_eq!(snapshot.last_error.as_deref(), Some("Wrong password"));
    assert!(client.auth().access_token().is_none());
}

#[tokio::test]
async fn login_error_message_from_array_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "message": ["email must be valid", "password too short"]
        })))
        .mount(&mock_server)
        .await;

    let client = client_with_store(&mock_server, Arc::new(MemoryTokenStore::new()));

    let err = client.auth().login("bad", "x").await.unwrap_err();
    assert_eq!(err.user_message(), "email must be valid");
}

#[tokio::test]
async fn login_unparsable_error_body_gets_generic_message() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(500).set_body_string("<html>oops</html>"))
        .mount(&mock_server)
        .await;

    let client = client_with_store(&mock_server, Arc::new(MemoryTokenStore::new()));

    let err = client.auth().login("a@b.com", "pw").await.unwrap_err();
    assert_eq!(err.user_message(), "Server error, please try again later");
}

#[tokio::test]
async fn register_with_token_logs_in_directly() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/register"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "token": "t3",
            "user": {"id": "u3", "email": "a@b.com"}
        })))
        .mount(&mock_server)
        .await;

    let client = client_with_store(&mock_server, Arc::new(MemoryTokenStore::new()));

    let user = client
        .auth()
        .register("a@b.com", "pw", "A", "X")
        .await
        .unwrap();
    assert_eq!(user.id.as_deref(), Some("u3"));
    assert_eq!(client.auth().access_token().as_deref(), Some("t3"));
}

#[tokio::test]
async fn register_without_token_falls_back_to_login() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/register"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "accessToken": "",
            "user": {"id": "u4", "email": "a@b.com"}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_partial_json(json!({"email": "a@b.com", "password": "pw"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accessToken": "t4",
            "user": {"id": "u4", "email": "a@b.com"}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_with_store(&mock_server, Arc::new(MemoryTokenStore::new()));

    let user = client
        .auth()
        .register("a@b.com", "pw", "A", "X")
        .await
        .unwrap();
    assert_eq!(user.id.as_deref(), Some("u4"));
    assert_eq!(client.auth().access_token().as_deref(), Some("t4"));
    assert!(client.auth().snapshot().logged_in);
}

#[tokio::test]
async fn register_message_only_body_also_falls_back_to_login() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/register"))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({"message": "User created"})),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accessToken": "t5",
            "user": {"id": "u5", "email": "a@b.com"}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_with_store(&mock_server, Arc::new(MemoryTokenStore::new()));

    let user = client
        .auth()
        .register("a@b.com", "pw", "A", "X")
        .await
        .unwrap();
    assert_eq!(user.id.as_deref(), Some("u5"));
    assert_eq!(client.auth().access_token().as_deref(), Some("t5"));
}

/// Token store whose removal always fails, for the best-effort logout path
struct BrokenTokenStore;

#[async_trait]
impl TokenStore for BrokenTokenStore {
    async fn save(&self, _token: &str) -> Result<(), TokenStoreError> {
        Ok(())
    }

    async fn load(&self) -> Result<Option<String>, TokenStoreError> {
        Ok(Some("stale".to_string()))
    }

    async fn remove(&self) -> Result<(), TokenStoreError> {
        Err(TokenStoreError("keychain unavailable".to_string()))
    }
}

#[tokio::test]
async fn logout_swallows_persistence_failure() {
    let mock_server = MockServer::start().await;
    let client = client_with_store(&mock_server, Arc::new(BrokenTokenStore));

    client.auth().restore().await.unwrap();
    assert!(client.auth().snapshot().logged_in);

    client.auth().logout().await;

    let snapshot = client.auth().snapshot();
    assert!(!snapshot.logged_in);
    assert!(snapshot.user.is_none());
    assert!(client.auth().access_token().is_none());
}

#[tokio::test]
async fn restore_enters_logged_in_without_a_user() {
    let mock_server = MockServer::start().await;
    let store = Arc::new(MemoryTokenStore::with_token("persisted"));
    let client = client_with_store(&mock_server, store);

    let restored = client.auth().restore().await.unwrap();
    assert!(restored);

    let snapshot = client.auth().snapshot();
    assert!(snapshot.logged_in);
    assert!(snapshot.user.is_none());
    assert_eq!(client.auth().access_token().as_deref(), Some("persisted"));
}

#[tokio::test]
async fn restore_without_persisted_token_stays_logged_out() {
    let mock_server = MockServer::start().await;
    let client = client_with_store(&mock_server, Arc::new(MemoryTokenStore::new()));

    let restored = client.auth().restore().await.unwrap();
    assert!(!restored);
    assert!(!client.auth().snapshot().logged_in);
}

#[tokio::test]
async fn forgot_password_returns_server_message() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/forgot-password"))
        .and(body_partial_json(json!({"email": "a@b.com"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"message": "Reset email sent"})),
        )
        .mount(&mock_server)
        .await;

    let client = client_with_store(&mock_server, Arc::new(MemoryTokenStore::new()));

    let message = client.auth().forgot_password("a@b.com").await.unwrap();
    assert_eq!(message.as_deref(), Some("Reset email sent"));
}

#[tokio::test]
async fn reset_token_validation_round_trip() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/auth/reset-password"))
        .and(query_param("token", "rt1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"valid": true})))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/reset-password"))
        .and(body_partial_json(json!({"token": "rt1", "password": "new"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"message": "Password updated"})),
        )
        .mount(&mock_server)
        .await;

    let client = client_with_store(&mock_server, Arc::new(MemoryTokenStore::new()));

    let check = client.auth().validate_reset_token("rt1").await.unwrap();
    assert!(check.valid);

    let message = client.auth().reset_password("rt1", "new").await.unwrap();
    assert_eq!(message.as_deref(), Some("Password updated"));
}
