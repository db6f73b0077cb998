use super::*;
use chrono::{TimeZone, Utc};
use shared::domain::{AddressId, SaleStatus};
use storage::{NewAddress, NewSale, NewSeller};

use crate::table::default_table_configs;

async fn setup() -> (ApiContext, AddressId) {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let hasher = CredentialHasher::with_cost(1024, 1).expect("hasher");
    let home = storage
        .create_address(&NewAddress {
            street: "Rua da Aurora, 12".into(),
            city: "Recife".into(),
            state: "PE".into(),
            zip_code: "50050-000".into(),
        })
        .await
        .expect("address");
    let ctx = ApiContext::new(storage, hasher, default_table_configs()).expect("context");
    (ctx, home)
}

fn create_request(name: &str, email: &str, address_id: AddressId) -> CreateClientRequest {
    CreateClientRequest {
        name: name.into(),
        email: email.into(),
        password: "correct horse".into(),
        address_id,
    }
}

#[tokio::test]
async fn created_client_is_listed_and_shown() {
    let (ctx, home) = setup().await;

    let client_id = create_client(&ctx, create_request(" Ana ", "ana@example.com", home))
        .await
        .expect("create");

    let page = list_clients(&ctx, 1).await.expect("list");
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].client_id, client_id);

    let shown = show_client(&ctx, client_id).await.expect("show");
    assert_eq!(shown.name, "Ana");
    assert_eq!(shown.address.city, "Recife");
}

#[tokio::test]
async fn invalid_input_never_reaches_the_store() {
    let (ctx, home) = setup().await;

    let mut short = create_request("Ana", "ana@example.com", home);
    short.password = "short".into();
    let err = create_client(&ctx, short).await.expect_err("short password");
    assert_eq!(err.code, ErrorCode::Validation);

    let err = create_client(&ctx, create_request("", "ana@example.com", home))
        .await
        .expect_err("blank name");
    assert_eq!(err.code, ErrorCode::Validation);
    assert_eq!(list_clients(&ctx, 1).await.expect("list").total, 0);
}

#[tokio::test]
async fn duplicate_email_is_a_conflict() {
    let (ctx, home) = setup().await;
    create_client(&ctx, create_request("Ana", "ana@example.com", home))
        .await
        .expect("first");

    let err = create_client(&ctx, create_request("Outra Ana", "ana@example.com", home))
        .await
        .expect_err("duplicate");
    assert_eq!(err.code, ErrorCode::Conflict);
}

#[tokio::test]
async fn update_of_missing_client_is_not_found() {
    let (ctx, home) = setup().await;

    let err = update_client(
        &ctx,
        ClientId(42),
        UpdateClientRequest {
            name: "Nobody".into(),
            email: "nobody@example.com".into(),
            address_id: home,
        },
    )
    .await
    .expect_err("missing");
    assert_eq!(err.code, ErrorCode::NotFound);

    let err = show_client(&ctx, ClientId(42)).await.expect_err("missing");
    assert_eq!(err.code, ErrorCode::NotFound);
}

#[tokio::test]
async fn unknown_table_is_not_found() {
    let (ctx, _) = setup().await;

    assert!(table_names(&ctx).contains(&"clients".to_string()));
    let err = render_table(&ctx, "invoices", 1).await.expect_err("unknown");
    assert_eq!(err.code, ErrorCode::NotFound);
    let err = delete_table_row(&ctx, "invoices", 1).await.expect_err("unknown");
    assert_eq!(err.code, ErrorCode::NotFound);
}

#[tokio::test]
async fn report_lists_commission_per_sale() {
    let (ctx, home) = setup().await;
    let client_id = create_client(&ctx, create_request("Bia", "bia@example.com", home))
        .await
        .expect("client");
    let seller_id = ctx
        .storage
        .create_seller(&NewSeller {
            name: "Caio".into(),
            company: "Loja Azul".into(),
            commission_rate_bps: 1_000,
        })
        .await
        .expect("seller");
    ctx.storage
        .create_sale(&NewSale {
            seller_id,
            client_id,
            sold_at: Utc.with_ymd_and_hms(2023, 5, 1, 12, 0, 0).unwrap(),
            total_amount: 25_000,
            status: SaleStatus::Paid,
        })
        .await
        .expect("sale");

    let page = commission_report(&ctx, 1).await.expect("report");
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].company, "Loja Azul");
    assert_eq!(page.items[0].client, "Bia");
    assert_eq!(page.items[0].commission, 2_500);
    assert_eq!(commission_report_columns().len(), 9);
    assert_eq!(commission_report_columns()[8], "commission");
}

#[tokio::test(flavor = "current_thread")]
async fn hashing_leaves_the_runtime_free() {
    let hasher = CredentialHasher::default();
    let started = std::time::Instant::now();

    let (credential, ticked_at) = tokio::join!(
        async {
            let credential = provision_credential(&hasher, "correct horse".into()).await;
            (credential, started.elapsed())
        },
        async {
            tokio::time::sleep(std::time::Duration::from_millis(1)).await;
            started.elapsed()
        },
    );
    let (credential, hashed_at) = credential;
    assert!(credential.expect("hash").as_str().starts_with("$argon2id$"));
    assert!(
        ticked_at < hashed_at,
        "timer ran at {ticked_at:?}, hash finished at {hashed_at:?}"
    );
}

#[test]
fn store_errors_map_to_wire_codes() {
    let cases = [
        (
            StoreError::EntityNotFound {
                entity: "clients",
                id: 1,
            },
            ErrorCode::NotFound,
        ),
        (
            StoreError::AggregateWriteFailed {
                reason: "UNIQUE constraint failed".into(),
            },
            ErrorCode::Conflict,
        ),
        (
            StoreError::Constraint {
                reason: "FOREIGN KEY constraint failed".into(),
            },
            ErrorCode::Conflict,
        ),
        (
            StoreError::StoreUnavailable(sqlx::Error::PoolClosed),
            ErrorCode::Unavailable,
        ),
        (
            StoreError::Decode {
                what: "sale status",
                reason: "bogus".into(),
            },
            ErrorCode::Internal,
        ),
    ];
    for (err, code) in cases {
        assert_eq!(store_error(err).code, code);
    }
}
