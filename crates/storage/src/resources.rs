//! Name-keyed registry of listable entity types.
//!
//! Every registered [`Resource`] can list a page, find one row by id and
//! delete one row by id, with rows exposed as JSON objects keyed by the
//! resource's declared field names. The registry is filled once at startup so
//! that unknown resource names are caught before any request is served.

use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use serde::Serialize;
use shared::{
    domain::{AddressId, ClientId, SaleId, SellerId, UserId},
    protocol::Page,
};

use crate::{PageRequest, Storage, StoreError};

/// One row of a resource, keyed by field name.
pub type Record = serde_json::Map<String, serde_json::Value>;

#[async_trait]
pub trait Resource: Send + Sync {
    fn name(&self) -> &'static str;
    /// Singular name used in not-found errors for one row of this resource.
    fn entity(&self) -> &'static str;
    fn fields(&self) -> &'static [&'static str];
    async fn list(&self, request: PageRequest) -> Result<Page<Record>, StoreError>;
    async fn find(&self, id: i64) -> Result<Option<Record>, StoreError>;
    async fn delete(&self, id: i64) -> Result<(), StoreError>;
}

fn to_record<T: Serialize>(value: &T) -> Result<Record, StoreError> {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::Object(map)) => Ok(map),
        Ok(other) => Err(StoreError::decode(
            "record",
            format!("expected an object, got {other}"),
        )),
        Err(e) => Err(StoreError::decode("record", e)),
    }
}

macro_rules! storage_resource {
    (
        $resource:ident, $name:literal, $entity:path, $id:ident,
        fields = [$($field:literal),+ $(,)?],
        list = $list:ident, find = $find:ident, delete = $delete:ident $(,)?
    ) => {
        pub struct $resource {
            storage: Storage,
        }

        impl $resource {
            pub fn new(storage: Storage) -> Self {
                Self { storage }
            }
        }

        #[async_trait]
        impl Resource for $resource {
            fn name(&self) -> &'static str {
                $name
            }

            fn entity(&self) -> &'static str {
                $entity
            }

            fn fields(&self) -> &'static [&'static str] {
                &[$($field),+]
            }

            async fn list(&self, request: PageRequest) -> Result<Page<Record>, StoreError> {
                self.storage
                    .$list(request)
                    .await?
                    .try_map(|row| to_record(&row))
            }

            async fn find(&self, id: i64) -> Result<Option<Record>, StoreError> {
                self.storage
                    .$find($id(id))
                    .await?
                    .as_ref()
                    .map(to_record)
                    .transpose()
            }

            async fn delete(&self, id: i64) -> Result<(), StoreError> {
                self.storage.$delete($id(id)).await
            }
        }
    };
}

storage_resource!(
    UserResource, "users", crate::users::ENTITY, UserId,
    fields = ["id", "name", "email"],
    list = list_users, find = find_user, delete = delete_user,
);

storage_resource!(
    ClientResource, "clients", crate::clients::ENTITY, ClientId,
    fields = ["id", "user_id", "name", "email", "address_id", "street", "city", "state", "zip_code"],
    list = list_clients, find = find_client, delete = delete_client,
);

storage_resource!(
    AddressResource, "addresses", crate::addresses::ENTITY, AddressId,
    fields = ["id", "street", "city", "state", "zip_code"],
    list = list_addresses, find = find_address, delete = delete_address,
);

storage_resource!(
    SellerResource, "sellers", crate::sellers::ENTITY, SellerId,
    fields = ["id", "name", "company", "commission_rate_bps"],
    list = list_sellers, find = find_seller, delete = delete_seller,
);

storage_resource!(
    SaleResource, "sales", crate::sales::ENTITY, SaleId,
    fields = ["id", "seller_id", "client_id", "sold_at", "total_amount", "status"],
    list = list_sales, find = find_sale, delete = delete_sale,
);

#[derive(Clone, Default)]
pub struct ResourceRegistry {
    resources: BTreeMap<&'static str, Arc<dyn Resource>>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every entity type backed by `storage`.
    pub fn with_defaults(storage: &Storage) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(UserResource::new(storage.clone())));
        registry.register(Arc::new(ClientResource::new(storage.clone())));
        registry.register(Arc::new(AddressResource::new(storage.clone())));
        registry.register(Arc::new(SellerResource::new(storage.clone())));
        registry.register(Arc::new(SaleResource::new(storage.clone())));
        registry
    }

    /// Registers `resource` under its name, returning any resource it replaced.
    pub fn register(&mut self, resource: Arc<dyn Resource>) -> Option<Arc<dyn Resource>> {
        self.resources.insert(resource.name(), resource)
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Resource>> {
        self.resources.get(name).cloned()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.resources.keys().copied().collect()
    }
}

#[cfg(test)]
#[path = "tests/resources_tests.rs"]
mod tests;
