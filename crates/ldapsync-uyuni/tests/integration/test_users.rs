//! User listing, details, creation, PAM and deletion through the account store

use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::Mock;

use ldapsync_core::ports::{AccountDetails, IAccountStore, NewAccount, UserSummary};

use crate::common::{self, failure, ok};

#[tokio::test]
async fn test_list_users_returns_logins() {
    let (server, store) = common::setup_store().await;
    Mock::given(method("GET"))
        .and(path("/user/listUsers"))
        .respond_with(ok(json!([
            { "id": 1, "login": "admin", "login_uc": "ADMIN", "enabled": true },
            { "id": 7, "login": "alice", "login_uc": "ALICE", "enabled": true },
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let users = store.list_users().await.unwrap();

    assert_eq!(
        users,
        vec![
            UserSummary { login: "admin".to_string() },
            UserSummary { login: "alice".to_string() },
        ]
    );
}

#[tokio::test]
async fn test_get_details_maps_snake_case_fields() {
    let (server, store) = common::setup_store().await;
    Mock::given(method("GET"))
        .and(path("/user/getDetails"))
        .and(query_param("login", "alice"))
        .respond_with(ok(json!({
            "first_name": "Alice",
            "last_name": "Liddell",
            "email": "alice@example.com",
            "org_id": 1,
            "use_pam": true,
        })))
        .mount(&server)
        .await;

    let details = store.get_details("alice").await.unwrap();

    assert_eq!(
        details,
        AccountDetails {
            first_name: "Alice".to_string(),
            last_name: "Liddell".to_string(),
            email: "alice@example.com".to_string(),
        }
    );
}

#[tokio::test]
async fn test_create_user_posts_pam_account() {
    let (server, store) = common::setup_store().await;
    Mock::given(method("POST"))
        .and(path("/user/create"))
        .and(body_json(json!({
            "login": "alice",
            "password": "",
            "firstName": "Alice",
            "lastName": "Liddell",
            "email": "alice@example.com",
            "usePamAuth": 1,
        })))
        .respond_with(ok(json!(1)))
        .expect(1)
        .mount(&server)
        .await;

    store
        .create_user(&NewAccount {
            login: "alice".to_string(),
            password: String::new(),
            first_name: "Alice".to_string(),
            last_name: "Liddell".to_string(),
            email: "alice@example.com".to_string(),
            use_pam_auth: true,
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn test_create_user_failure_carries_server_message() {
    let (server, store) = common::setup_store().await;
    Mock::given(method("POST"))
        .and(path("/user/create"))
        .respond_with(failure("Invalid email address"))
        .mount(&server)
        .await;

    let err = store
        .create_user(&NewAccount {
            login: "bob".to_string(),
            password: String::new(),
            first_name: "Bob".to_string(),
            last_name: "Builder".to_string(),
            email: "not-an-email".to_string(),
            use_pam_auth: true,
        })
        .await
        .unwrap_err();

    let message = format!("{err:#}");
    assert!(message.contains("Failed to create user 'bob'"));
    assert!(message.contains("Invalid email address"));
}

#[tokio::test]
async fn test_set_details_and_pam() {
    let (server, store) = common::setup_store().await;
    Mock::given(method("POST"))
        .and(path("/user/setDetails"))
        .and(body_json(json!({
            "login": "bob",
            "details": {
                "first_name": "Bob",
                "last_name": "Builder",
                "email": "bob@example.com",
            },
        })))
        .respond_with(ok(json!(1)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/user/usePamAuthentication"))
        .and(body_json(json!({ "login": "bob", "pam_value": 1 })))
        .respond_with(ok(json!(1)))
        .expect(1)
        .mount(&server)
        .await;

    let details = AccountDetails {
        first_name: "Bob".to_string(),
        last_name: "Builder".to_string(),
        email: "bob@example.com".to_string(),
    };
    store.set_details("bob", &details).await.unwrap();
    store.use_pam_authentication("bob", true).await.unwrap();
}

#[tokio::test]
async fn test_delete_user() {
    let (server, store) = common::setup_store().await;
    Mock::given(method("POST"))
        .and(path("/user/delete"))
        .and(body_json(json!({ "login": "dave" })))
        .respond_with(ok(json!(1)))
        .expect(1)
        .mount(&server)
        .await;

    store.delete_user("dave").await.unwrap();
}
