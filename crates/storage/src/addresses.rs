use serde::Serialize;
use shared::{domain::AddressId, protocol::Page};
use sqlx::{sqlite::SqliteRow, Row};

use crate::{PageRequest, Storage, StoreError};

/// Name reported when a address row is missing.
pub(crate) const ENTITY: &str = "address";

#[derive(Debug, Clone)]
pub struct NewAddress {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredAddress {
    pub id: AddressId,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
}

fn address_from_row(r: &SqliteRow) -> StoredAddress {
    StoredAddress {
        id: AddressId(r.get::<i64, _>(0)),
        street: r.get::<String, _>(1),
        city: r.get::<String, _>(2),
        state: r.get::<String, _>(3),
        zip_code: r.get::<String, _>(4),
    }
}

impl Storage {
    pub async fn create_address(&self, address: &NewAddress) -> Result<AddressId, StoreError> {
        let rec = sqlx::query(
            "INSERT INTO addresses (street, city, state, zip_code) VALUES (?, ?, ?, ?) RETURNING id",
        )
        .bind(&address.street)
        .bind(&address.city)
        .bind(&address.state)
        .bind(&address.zip_code)
        .fetch_one(&self.pool)
        .await?;
        Ok(AddressId(rec.get::<i64, _>(0)))
    }

    pub async fn find_address(
        &self,
        address_id: AddressId,
    ) -> Result<Option<StoredAddress>, StoreError> {
        let row =
            sqlx::query("SELECT id, street, city, state, zip_code FROM addresses WHERE id = ?")
                .bind(address_id.0)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.as_ref().map(address_from_row))
    }

    pub async fn list_addresses(
        &self,
        request: PageRequest,
    ) -> Result<Page<StoredAddress>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, street, city, state, zip_code FROM addresses ORDER BY id ASC LIMIT ? OFFSET ?",
        )
        .bind(request.limit())
        .bind(request.offset())
        .fetch_all(&self.pool)
        .await?;
        let total = self.count_rows("addresses").await?;
        Ok(request.page_of(rows.iter().map(address_from_row).collect(), total))
    }

    /// Fails with a constraint error while any client still lives at the address.
    pub async fn delete_address(&self, address_id: AddressId) -> Result<(), StoreError> {
        let deleted = sqlx::query("DELETE FROM addresses WHERE id = ?")
            .bind(address_id.0)
            .execute(&self.pool)
            .await?
            .rows_affected();
        if deleted == 0 {
            return Err(StoreError::not_found(ENTITY, address_id.0));
        }
        Ok(())
    }
}
