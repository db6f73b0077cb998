use super::*;
use crate::test_support::{address, client, count, memory_storage, new_client};
use argon2::{
    password_hash::{PasswordHash, PasswordVerifier},
    Argon2,
};

#[tokio::test]
async fn creates_user_and_client_together() {
    let storage = memory_storage().await;
    let home = address(&storage, "Curitiba", "PR").await;

    let client_id = client(&storage, "Ana Lima", "ana@example.com", home).await;

    let stored = storage
        .find_client(client_id)
        .await
        .expect("find")
        .expect("client exists");
    assert_eq!(stored.name, "Ana Lima");
    assert_eq!(stored.email, "ana@example.com");
    assert_eq!(stored.address_id, home);
    assert_eq!(stored.city, "Curitiba");

    let owner = storage
        .find_user(stored.user_id)
        .await
        .expect("find user")
        .expect("owner exists");
    assert_eq!(owner.email, "ana@example.com");
    assert_eq!(count(&storage, "users").await, 1);
    assert_eq!(count(&storage, "clients").await, 1);
}

#[tokio::test]
async fn stores_the_provisioned_credential() {
    let storage = memory_storage().await;
    let home = address(&storage, "Recife", "PE").await;
    client(&storage, "Bruno Costa", "bruno@example.com", home).await;

    let stored: String = sqlx::query_scalar("SELECT password_hash FROM users WHERE email = ?")
        .bind("bruno@example.com")
        .fetch_one(storage.pool())
        .await
        .expect("password hash");
    let parsed = PasswordHash::new(&stored).expect("phc string");
    assert!(Argon2::default()
        .verify_password(b"s3cret-password", &parsed)
        .is_ok());
    assert!(Argon2::default().verify_password(b"password", &parsed).is_err());
}

#[tokio::test]
async fn unknown_address_rolls_back_the_user_insert() {
    let storage = memory_storage().await;

    let err = storage
        .create_client_aggregate(&new_client("Carla", "carla@example.com", AddressId(404)))
        .await
        .expect_err("foreign key violation");

    assert!(matches!(err, StoreError::AggregateWriteFailed { .. }), "{err:?}");
    assert_eq!(count(&storage, "users").await, 0);
    assert_eq!(count(&storage, "clients").await, 0);
}

#[tokio::test]
async fn failure_after_user_insert_leaves_no_rows() {
    let storage = memory_storage().await;
    let home = address(&storage, "Salvador", "BA").await;
    sqlx::query(
        "CREATE TRIGGER reject_clients BEFORE INSERT ON clients
         BEGIN SELECT RAISE(ABORT, 'client insert rejected'); END",
    )
    .execute(storage.pool())
    .await
    .expect("trigger");

    let err = storage
        .create_client_aggregate(&new_client("Diego", "diego@example.com", home))
        .await
        .expect_err("injected failure");

    assert!(matches!(err, StoreError::AggregateWriteFailed { .. }), "{err:?}");
    assert_eq!(count(&storage, "users").await, 0);
    assert_eq!(count(&storage, "clients").await, 0);
}

#[tokio::test]
async fn duplicate_email_fails_second_aggregate_and_keeps_first() {
    let storage = memory_storage().await;
    let home = address(&storage, "Sao Paulo", "SP").await;
    let first = client(&storage, "Elisa", "shared@example.com", home).await;

    let err = storage
        .create_client_aggregate(&new_client("Fabio", "shared@example.com", home))
        .await
        .expect_err("unique violation");

    assert!(matches!(err, StoreError::AggregateWriteFailed { .. }), "{err:?}");
    assert_eq!(count(&storage, "users").await, 1);
    assert_eq!(count(&storage, "clients").await, 1);
    let kept = storage
        .find_client(first)
        .await
        .expect("find")
        .expect("first client");
    assert_eq!(kept.name, "Elisa");
}

#[tokio::test]
async fn update_changes_user_and_address_together() {
    let storage = memory_storage().await;
    let old_home = address(&storage, "Sao Paulo", "SP").await;
    let new_home = address(&storage, "Porto Alegre", "RS").await;
    let client_id = client(&storage, "Gabriela", "gabi@example.com", old_home).await;

    storage
        .update_client_aggregate(
            client_id,
            &ClientChanges {
                name: "Gabriela Nunes".into(),
                email: "gabriela@example.com".into(),
                address_id: new_home,
            },
        )
        .await
        .expect("update");

    let stored = storage
        .find_client(client_id)
        .await
        .expect("find")
        .expect("client");
    assert_eq!(stored.name, "Gabriela Nunes");
    assert_eq!(stored.email, "gabriela@example.com");
    assert_eq!(stored.address_id, new_home);
    assert_eq!(stored.state, "RS");
}

#[tokio::test]
async fn failed_address_change_keeps_user_fields() {
    let storage = memory_storage().await;
    let home = address(&storage, "Recife", "PE").await;
    let client_id = client(&storage, "Heitor", "heitor@example.com", home).await;

    let err = storage
        .update_client_aggregate(
            client_id,
            &ClientChanges {
                name: "Heitor Gomes".into(),
                email: "heitor.gomes@example.com".into(),
                address_id: AddressId(999),
            },
        )
        .await
        .expect_err("foreign key violation");
    assert!(matches!(err, StoreError::AggregateWriteFailed { .. }), "{err:?}");

    let stored = storage
        .find_client(client_id)
        .await
        .expect("find")
        .expect("client");
    assert_eq!(stored.name, "Heitor");
    assert_eq!(stored.email, "heitor@example.com");
    assert_eq!(stored.address_id, home);
}

#[tokio::test]
async fn taken_email_keeps_address_unchanged() {
    let storage = memory_storage().await;
    let home = address(&storage, "Recife", "PE").await;
    let elsewhere = address(&storage, "Curitiba", "PR").await;
    client(&storage, "Isabela", "isabela@example.com", home).await;
    let client_id = client(&storage, "Joao", "joao@example.com", home).await;

    let err = storage
        .update_client_aggregate(
            client_id,
            &ClientChanges {
                name: "Joao".into(),
                email: "isabela@example.com".into(),
                address_id: elsewhere,
            },
        )
        .await
        .expect_err("unique violation");
    assert!(matches!(err, StoreError::AggregateWriteFailed { .. }), "{err:?}");

    let stored = storage
        .find_client(client_id)
        .await
        .expect("find")
        .expect("client");
    assert_eq!(stored.email, "joao@example.com");
    assert_eq!(stored.address_id, home);
}

#[tokio::test]
async fn updating_missing_client_is_not_found() {
    let storage = memory_storage().await;
    let home = address(&storage, "Recife", "PE").await;

    let err = storage
        .update_client_aggregate(
            ClientId(77),
            &ClientChanges {
                name: "Nobody".into(),
                email: "nobody@example.com".into(),
                address_id: home,
            },
        )
        .await
        .expect_err("missing client");
    assert!(
        matches!(err, StoreError::EntityNotFound { entity: "client", id: 77 }),
        "{err:?}"
    );
}

#[tokio::test]
async fn concurrent_updates_never_mix_aggregates() {
    let suffix = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let temp_root = std::env::temp_dir().join(format!("sales_admin_race_test_{suffix}"));
    let db_path = temp_root.join("race.db");
    let database_url = format!("sqlite://{}", db_path.to_string_lossy().replace('\\', "/"));
    let storage = Storage::new(&database_url).await.expect("db");

    let home = address(&storage, "Sao Paulo", "SP").await;
    let north = address(&storage, "Recife", "PE").await;
    let south = address(&storage, "Porto Alegre", "RS").await;
    let client_id = client(&storage, "Larissa", "larissa@example.com", home).await;

    let to_north = ClientChanges {
        name: "Larissa North".into(),
        email: "north@example.com".into(),
        address_id: north,
    };
    let to_south = ClientChanges {
        name: "Larissa South".into(),
        email: "south@example.com".into(),
        address_id: south,
    };

    let (first, second) = tokio::join!(
        storage.update_client_aggregate(client_id, &to_north),
        storage.update_client_aggregate(client_id, &to_south),
    );
    assert!(first.is_ok() || second.is_ok(), "{first:?} / {second:?}");

    let stored = storage
        .find_client(client_id)
        .await
        .expect("find")
        .expect("client");
    let matches_north = stored.name == to_north.name
        && stored.email == to_north.email
        && stored.address_id == north;
    let matches_south = stored.name == to_south.name
        && stored.email == to_south.email
        && stored.address_id == south;
    assert!(matches_north || matches_south, "mixed aggregate: {stored:?}");

    drop(storage);
    std::fs::remove_dir_all(temp_root).expect("cleanup");
}

#[tokio::test]
async fn deleting_client_removes_owning_user() {
    let storage = memory_storage().await;
    let home = address(&storage, "Recife", "PE").await;
    let client_id = client(&storage, "Marcos", "marcos@example.com", home).await;

    storage.delete_client(client_id).await.expect("delete");

    assert!(storage.find_client(client_id).await.expect("find").is_none());
    assert_eq!(count(&storage, "users").await, 0);

    let err = storage.delete_client(client_id).await.expect_err("gone");
    assert!(err.is_not_found());
}

#[tokio::test]
async fn lists_clients_ten_per_page() {
    let storage = memory_storage().await;
    let home = address(&storage, "Recife", "PE").await;
    for n in 0..12 {
        client(&storage, &format!("Client {n}"), &format!("c{n}@example.com"), home).await;
    }

    let first = storage.list_clients(PageRequest::new(1)).await.expect("page 1");
    assert_eq!(first.items.len(), 10);
    assert_eq!(first.total, 12);
    assert_eq!(first.last_page, 2);
    assert_eq!(first.items[0].name, "Client 0");

    let second = storage.list_clients(PageRequest::new(2)).await.expect("page 2");
    assert_eq!(second.items.len(), 2);
    assert_eq!(second.items[1].name, "Client 11");
}
