//! Shared test helpers for Uyuni API integration tests
//!
//! Each helper mounts the endpoints a test needs on a wiremock server and
//! returns a client pointing at it.

use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ldapsync_uyuni::client::UyuniClient;
use ldapsync_uyuni::store::UyuniAccountStore;

pub const SESSION: &str = "42x7f2c0ffee";

pub fn session_header() -> String {
    format!("pxt-session-cookie={SESSION}")
}

/// Successful API envelope around `result`
pub fn ok(result: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "success": true, "result": result }))
}

/// Failed API envelope with `message`
pub fn failure(message: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "success": false, "message": message }))
}

/// Mounts `POST /auth/login`, answering with an expired and a live cookie
pub async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(
            ok(json!("Login successful"))
                .append_header("Set-Cookie", "pxt-session-cookie=stale; Max-Age=0; Path=/")
                .append_header(
                    "Set-Cookie",
                    format!("pxt-session-cookie={SESSION}; Path=/; Secure; HttpOnly").as_str(),
                ),
        )
        .mount(server)
        .await;
}

/// Starts a server with login mounted and returns a logged-in client
pub async fn setup_uyuni_mock() -> (MockServer, UyuniClient) {
    let server = MockServer::start().await;
    mount_login(&server).await;

    let mut client = UyuniClient::with_base_url(server.uri()).expect("valid mock URL");
    client
        .login("admin", "secret")
        .await
        .expect("login against mock");

    (server, client)
}

/// Same as [`setup_uyuni_mock`], wrapped in the account store
pub async fn setup_store() -> (MockServer, UyuniAccountStore) {
    let (server, client) = setup_uyuni_mock().await;
    (server, UyuniAccountStore::new(client))
}
