//! Write passes: create, update, delete and repeated runs

use std::sync::Arc;

use ldapsync_core::ports::{AccountDetails, NewAccount};
use ldapsync_sync::engine::FailedUser;

use crate::common::*;

fn calls_since(store: &FakeAccountStore, mark: usize, login: &str) -> Vec<Call> {
    store
        .calls()
        .split_off(mark)
        .into_iter()
        .filter(|call| call.concerns(login))
        .collect()
}

#[tokio::test]
async fn test_new_user_is_created_then_granted_roles() {
    let directory = Arc::new(FakeDirectory::new(standard_directory()));
    let store = Arc::new(FakeAccountStore::with_admin());
    let engine = engine(&directory, &store);

    let mut plan = engine.start().await.unwrap();
    let mark = store.calls().len();
    let report = engine.apply(&mut plan).await;

    assert_eq!(report.added, 3);
    assert!(report.failed.is_empty());
    assert!(report.errors.is_empty());

    assert_eq!(
        calls_since(&store, mark, "alice"),
        vec![
            Call::CreateUser(NewAccount {
                login: "alice".to_string(),
                password: String::new(),
                first_name: "Alice".to_string(),
                last_name: "Liddell".to_string(),
                email: "alice@example.com".to_string(),
                use_pam_auth: true,
            }),
            Call::ListRoles("alice".to_string()),
            Call::AddRole("alice".to_string(), "org_admin".to_string()),
        ]
    );

    let bob = store.account("bob").unwrap();
    assert_eq!(bob.roles, vec!["config_admin", "system_group_admin"]);
    assert!(bob.pam);
}

#[tokio::test]
async fn test_creation_failure_is_isolated() {
    let directory = Arc::new(FakeDirectory::new(standard_directory()));
    let store = Arc::new(FakeAccountStore::with_admin().failing_create("bob"));
    let engine = engine(&directory, &store);

    let mut plan = engine.start().await.unwrap();
    let mark = store.calls().len();
    let report = engine.apply(&mut plan).await;

    assert_eq!(report.added, 2);
    assert_eq!(report.failed.len(), 1);
    let FailedUser { uid, reason } = &report.failed[0];
    assert_eq!(uid, "bob");
    assert!(reason.contains("Invalid email"));
    assert!(report.has_failures());

    let bob = plan.new_users.iter().find(|u| u.uid() == "bob").unwrap();
    assert!(!bob.is_valid());

    // No role push after a failed creation
    let bob_calls = calls_since(&store, mark, "bob");
    assert_eq!(bob_calls.len(), 1);
    assert!(matches!(bob_calls[0], Call::CreateUser(_)));

    assert!(store.account("alice").is_some());
    assert!(store.account("carol").is_some());
}

#[tokio::test]
async fn test_update_replaces_roles_then_details_then_pam() {
    let directory = Arc::new(FakeDirectory::new(standard_directory()));
    let store = Arc::new(
        FakeAccountStore::with_admin()
            .with_account("alice", "Alice", "Liddell", "alice@example.com", &["org_admin"])
            .with_account("bob", "Robert", "Builder", "bob@old.example.com", &["config_admin", "monitoring_admin"])
            .with_account("carol", "Carol", "Danvers", "carol@example.com", &["config_admin", "system_group_admin"]),
    );
    let engine = engine(&directory, &store);

    let mut plan = engine.start().await.unwrap();
    let mark = store.calls().len();
    let report = engine.apply(&mut plan).await;

    assert_eq!(report.updated, 1);
    assert_eq!(
        calls_since(&store, mark, "bob"),
        vec![
            Call::ListRoles("bob".to_string()),
            Call::RemoveRole("bob".to_string(), "config_admin".to_string()),
            Call::RemoveRole("bob".to_string(), "monitoring_admin".to_string()),
            Call::AddRole("bob".to_string(), "config_admin".to_string()),
            Call::AddRole("bob".to_string(), "system_group_admin".to_string()),
            Call::SetDetails(
                "bob".to_string(),
                AccountDetails {
                    first_name: "Bob".to_string(),
                    last_name: "Builder".to_string(),
                    email: "bob@example.com".to_string(),
                }
            ),
            Call::UsePam("bob".to_string(), true),
        ]
    );

    // Unchanged users see no calls at all
    assert!(calls_since(&store, mark, "alice").is_empty());
    assert!(calls_since(&store, mark, "carol").is_empty());
}

#[tokio::test]
async fn test_failed_details_stop_the_update() {
    let directory = Arc::new(FakeDirectory::new(standard_directory()));
    let store = Arc::new(
        FakeAccountStore::with_admin()
            .with_account("alice", "Alice", "Liddell", "alice@old.example.com", &["org_admin"])
            .with_account("bob", "Robert", "Builder", "bob@example.com", &[])
            .failing_set_details("alice"),
    );
    let engine = engine(&directory, &store);

    let mut plan = engine.start().await.unwrap();
    let mark = store.calls().len();
    let report = engine.apply(&mut plan).await;

    let alice_calls = calls_since(&store, mark, "alice");
    assert!(matches!(alice_calls.last(), Some(Call::SetDetails(_, _))));
    assert!(!alice_calls.iter().any(|c| matches!(c, Call::UsePam(_, _))));

    // bob is still updated, carol still created
    assert_eq!(report.updated, 1);
    assert_eq!(report.added, 1);
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].contains("alice"));
}

#[tokio::test]
async fn test_removed_member_is_deleted() {
    let mut entries = standard_directory();
    entries.push(person("dave", "Dave", "Lister", "dave@example.com"));
    let directory = Arc::new(FakeDirectory::new(entries));
    let store = Arc::new(
        FakeAccountStore::with_admin()
            .with_account("dave", "Dave", "Lister", "dave@example.com", &["config_admin"])
            .with_account("eve", "Eve", "Local", "eve@example.com", &[]),
    );

    let report = engine(&directory, &store).sync().await.unwrap();

    assert_eq!(report.removed, 1);
    assert!(store.account("dave").is_none());
    assert!(store.account("eve").is_some());
    assert!(store.account(FROZEN_ADMIN).is_some());
}

#[tokio::test]
async fn test_deletion_failure_is_recorded() {
    let mut entries = standard_directory();
    entries.push(person("dave", "Dave", "Lister", "dave@example.com"));
    let directory = Arc::new(FakeDirectory::new(entries));
    let store = Arc::new(
        FakeAccountStore::with_admin()
            .with_account("dave", "Dave", "Lister", "dave@example.com", &[])
            .failing_delete("dave"),
    );

    let report = engine(&directory, &store).sync().await.unwrap();

    assert_eq!(report.removed, 0);
    assert_eq!(report.added, 3);
    assert!(report.errors.iter().any(|e| e.contains("dave")));
    assert!(!report.has_failures());
}

#[tokio::test]
async fn test_frozen_user_is_never_written() {
    let mut entries = standard_directory();
    entries.push(person(FROZEN_ADMIN, "Someone", "Else", "else@example.com"));
    let directory = Arc::new(FakeDirectory::new(entries));
    let store = Arc::new(FakeAccountStore::with_admin());

    engine(&directory, &store).sync().await.unwrap();

    assert!(store
        .calls_for(FROZEN_ADMIN)
        .iter()
        .all(|call| !call.is_write()));
    let admin = store.account(FROZEN_ADMIN).unwrap();
    assert_eq!(admin.details.email, "root@example.com");
}

#[tokio::test]
async fn test_second_run_is_a_no_op() {
    let mut entries = standard_directory();
    entries.push(person("dave", "Dave", "Lister", "dave@example.com"));
    let directory = Arc::new(FakeDirectory::new(entries));
    let store = Arc::new(
        FakeAccountStore::with_admin()
            .with_account("bob", "Robert", "Builder", "bob@example.com", &["monitoring_admin"])
            .with_account("dave", "Dave", "Lister", "dave@example.com", &[]),
    );
    let engine = engine(&directory, &store);

    let first = engine.sync().await.unwrap();
    assert_eq!((first.added, first.updated, first.removed), (2, 1, 1));

    let writes_before = store.writes().len();
    let plan = engine.start().await.unwrap();
    assert!(plan.is_empty());

    let second = engine.sync().await.unwrap();
    assert_eq!((second.added, second.updated, second.removed), (0, 0, 0));
    assert_eq!(store.writes().len(), writes_before);
}

#[tokio::test]
async fn test_single_role_failures_do_not_stop_the_push() {
    let directory = Arc::new(FakeDirectory::new(standard_directory()));
    let store = Arc::new(
        FakeAccountStore::with_admin()
            .with_account("alice", "Alice", "Liddell", "alice@example.com", &["org_admin"])
            .with_account("bob", "Robert", "Builder", "bob@old.example.com", &["config_admin", "monitoring_admin"])
            .with_account("carol", "Carol", "Danvers", "carol@example.com", &["config_admin", "system_group_admin"])
            .failing_remove_role("bob", "config_admin")
            .failing_add_role("bob", "config_admin"),
    );
    let engine = engine(&directory, &store);

    let mut plan = engine.start().await.unwrap();
    let mark = store.calls().len();
    let report = engine.apply(&mut plan).await;

    let bob_calls = calls_since(&store, mark, "bob");
    assert!(bob_calls.contains(&Call::RemoveRole("bob".to_string(), "monitoring_admin".to_string())));
    assert!(bob_calls.contains(&Call::AddRole("bob".to_string(), "system_group_admin".to_string())));
    assert!(matches!(bob_calls.last(), Some(Call::UsePam(_, true))));

    assert_eq!(report.updated, 1);
    assert_eq!(report.errors.len(), 2);
    assert!(report.errors.iter().all(|e| e.contains("config_admin") && e.contains("bob")));

    let bob = store.account("bob").unwrap();
    assert_eq!(bob.roles, vec!["config_admin", "system_group_admin"]);
    assert_eq!(bob.details.email, "bob@example.com");
}

#[tokio::test]
async fn test_role_listing_failure_skips_only_that_update() {
    let directory = Arc::new(FakeDirectory::new(standard_directory()));
    let store = Arc::new(
        FakeAccountStore::with_admin()
            .with_account("alice", "Alice", "Liddell", "alice@old.example.com", &["org_admin"])
            .with_account("bob", "Robert", "Builder", "bob@example.com", &["monitoring_admin"])
            .with_account("carol", "Carol", "Danvers", "carol@example.com", &["config_admin", "system_group_admin"]),
    );
    let engine = engine(&directory, &store);

    let mut plan = engine.start().await.unwrap();
    store.fail_list_roles_from_now("bob");
    let mark = store.calls().len();
    let report = engine.apply(&mut plan).await;

    assert_eq!(
        calls_since(&store, mark, "bob"),
        vec![Call::ListRoles("bob".to_string())]
    );
    let alice_calls = calls_since(&store, mark, "alice");
    assert!(alice_calls.iter().any(|c| matches!(c, Call::SetDetails(_, _))));
    assert!(matches!(alice_calls.last(), Some(Call::UsePam(_, true))));

    assert_eq!(report.updated, 1);
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].contains("bob"));
    assert_eq!(store.account("bob").unwrap().roles, vec!["monitoring_admin"]);
}
