use shopauth_core::db::open_db_in_memory;
use shopauth_core::{LoginKeyKind, NewUser, SqliteUserStore, StoreError, UserStore};
use std::sync::Arc;
use uuid::Uuid;

fn store() -> SqliteUserStore {
    SqliteUserStore::new(open_db_in_memory().unwrap())
}

fn candidate(key: &str) -> NewUser {
    NewUser {
        key: key.to_string(),
        name: Some("Bob".to_string()),
        email: None,
        password_hash: "pbkdf2$1000$00ff$aabb".to_string(),
    }
}

#[test]
fn store_is_keyed_by_email() {
    assert_eq!(store().key_kind(), LoginKeyKind::Email);
}

#[test]
fn insert_assigns_id_and_timestamp() {
    let store = store();

    let user = store.insert(candidate("Bob@X.com")).unwrap();
    assert_ne!(user.id, Uuid::nil());
    assert!(user.created_at > 0);
    assert_eq!(user.name, "Bob");
    // Emails are normalized to lowercase before persistence.
    assert_eq!(user.email.as_deref(), Some("bob@x.com"));
}

#[test]
fn find_by_key_is_case_insensitive() {
    let store = store();
    let inserted = store.insert(candidate("bob@x.com")).unwrap();

    let found = store.find_by_key("BOB@X.COM").unwrap().unwrap();
    assert_eq!(found.id, inserted.id);
    assert_eq!(found.password_hash, inserted.password_hash);

    assert!(store.find_by_key("carol@x.com").unwrap().is_none());
}

#[test]
fn find_by_id_roundtrip() {
    let store = store();
    let inserted = store.insert(candidate("bob@x.com")).unwrap();

    let found = store.find_by_id(inserted.id).unwrap().unwrap();
    assert_eq!(found, inserted);

    assert!(store.find_by_id(Uuid::new_v4()).unwrap().is_none());
}

#[test]
fn duplicate_email_is_rejected_by_constraint() {
    let store = store();
    store.insert(candidate("bob@x.com")).unwrap();

    let err = store.insert(candidate("Bob@X.COM")).unwrap_err();
    match err {
        StoreError::DuplicateKey(key) => assert_eq!(key, "Bob@X.COM"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn concurrent_inserts_with_same_key_admit_exactly_one() {
    let store = Arc::new(store());
    let mut handles = Vec::new();

    for _ in 0..8 {
        let store = Arc::clone(&store);
        handles.push(std::thread::spawn(move || {
            store.insert(candidate("bob@x.com")).is_ok()
        }));
    }

    let successes = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .filter(|succeeded| *succeeded)
        .count();
    assert_eq!(successes, 1);
}
