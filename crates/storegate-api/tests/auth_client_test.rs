// Integration tests for `StorefrontClient` using wiremock.

use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use storegate_api::{Error, StorefrontClient};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, StorefrontClient) {
    let server = MockServer::start().await;
    let url = server.uri().parse().expect("mock server URL");
    let client = StorefrontClient::with_client(reqwest::Client::new(), url);
    (server, client)
}

fn secret(s: &str) -> SecretString {
    SecretString::from(s.to_owned())
}

// ── check-auth ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_check_auth_authenticated() {
    let (server, client) = setup().await;

    let body = json!({
        "success": true,
        "user": {
            "id": "u-17",
            "userName": "maria",
            "email": "maria@example.com",
            "role": "user"
        }
    });

    Mock::given(method("GET"))
        .and(path("/api/auth/check-auth"))
        .and(header("cache-control", "no-store, no-cache, must-revalidate, proxy-revalidate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let resp = client.check_auth().await.unwrap();
    assert!(resp.success);
    let user = resp.user.unwrap();
    assert_eq!(user.user_name, "maria");
    assert_eq!(user.email, "maria@example.com");
    assert_eq!(user.role.as_deref(), Some("user"));
}

#[tokio::test]
async fn test_check_auth_anonymous_401() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/auth/check-auth"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"success": false, "user": null})),
        )
        .mount(&server)
        .await;

    let err = client.check_auth().await.unwrap_err();
    assert!(err.is_unauthenticated());
}

#[tokio::test]
async fn test_check_auth_success_false_means_anonymous() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/auth/check-auth"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"success": false, "user": null})),
        )
        .mount(&server)
        .await;

    let resp = client.check_auth().await.unwrap();
    assert!(!resp.success);
    assert!(storegate_api::client::user_from_check(resp).is_none());
}

// ── admin access-check ──────────────────────────────────────────────

#[tokio::test]
async fn test_admin_access_granted() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/admin/access-check"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .mount(&server)
        .await;

    client.check_admin_access().await.unwrap();
}

#[tokio::test]
async fn test_admin_access_forbidden_is_distinguishable() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/admin/access-check"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({"success": false})))
        .mount(&server)
        .await;

    let err = client.check_admin_access().await.unwrap_err();
    assert!(err.is_forbidden());
    assert!(!err.is_unauthenticated());
}

#[tokio::test]
async fn test_admin_access_session_expired() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/admin/access-check"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = client.check_admin_access().await.unwrap_err();
    assert!(err.is_unauthenticated());
}

#[tokio::test]
async fn test_admin_access_server_error_is_not_forbidden() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/admin/access-check"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let err = client.check_admin_access().await.unwrap_err();
    assert!(matches!(err, Error::Api { status: 500, .. }));
}

// ── login / register / logout ───────────────────────────────────────

#[tokio::test]
async fn test_login_success() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(json!({
            "email": "maria@example.com",
            "password": "hunter2"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "Logged in successfully",
            "user": {
                "userName": "maria",
                "email": "maria@example.com"
            }
        })))
        .mount(&server)
        .await;

    let resp = client
        .login("maria@example.com", &secret("hunter2"))
        .await
        .unwrap();
    assert!(resp.success);
    assert_eq!(resp.user.unwrap().user_name, "maria");
}

#[tokio::test]
async fn test_login_rejected_is_not_an_error() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "message": "Incorrect email or password"
        })))
        .mount(&server)
        .await;

    let resp = client
        .login("maria@example.com", &secret("wrong"))
        .await
        .unwrap();
    assert!(!resp.success);
    assert_eq!(resp.message.as_deref(), Some("Incorrect email or password"));
    assert!(resp.user.is_none());
}

#[tokio::test]
async fn test_register() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/register"))
        .and(body_json(json!({
            "userName": "maria",
            "email": "maria@example.com",
            "password": "hunter2"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "Registration successful"
        })))
        .mount(&server)
        .await;

    let resp = client
        .register("maria", "maria@example.com", &secret("hunter2"))
        .await
        .unwrap();
    assert!(resp.success);
}

#[tokio::test]
async fn test_logout() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/logout"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .mount(&server)
        .await;

    client.logout().await.unwrap();
}

#[tokio::test]
async fn test_malformed_body_is_deserialization_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/auth/check-auth"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let err = client.check_auth().await.unwrap_err();
    assert!(matches!(err, Error::Deserialization { .. }));
}
