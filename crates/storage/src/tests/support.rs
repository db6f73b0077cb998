use shared::domain::{AddressId, ClientId};

use crate::{CredentialHasher, NewAddress, NewClient, Storage};

pub(crate) async fn memory_storage() -> Storage {
    Storage::new("sqlite::memory:").await.expect("db")
}

pub(crate) fn cheap_hasher() -> CredentialHasher {
    CredentialHasher::with_cost(1024, 1).expect("hasher params")
}

pub(crate) async fn address(storage: &Storage, city: &str, state: &str) -> AddressId {
    storage
        .create_address(&NewAddress {
            street: "Rua Augusta, 100".into(),
            city: city.into(),
            state: state.into(),
            zip_code: "01305-000".into(),
        })
        .await
        .expect("address")
}

pub(crate) fn new_client(name: &str, email: &str, address_id: AddressId) -> NewClient {
    NewClient {
        name: name.into(),
        email: email.into(),
        credential: cheap_hasher().hash("s3cret-password").expect("hash"),
        address_id,
    }
}

pub(crate) async fn client(
    storage: &Storage,
    name: &str,
    email: &str,
    address_id: AddressId,
) -> ClientId {
    storage
        .create_client_aggregate(&new_client(name, email, address_id))
        .await
        .expect("client aggregate")
}

pub(crate) async fn count(storage: &Storage, table: &'static str) -> i64 {
    storage.count_rows(table).await.expect("count")
}
