//! Client aggregate: a `clients` row together with the `users` row that owns it.
//!
//! Both rows are written inside one transaction. When any statement fails the
//! transaction is dropped without commit, which rolls it back, so a user
//! without its client (or the reverse) is never visible to other connections.

use serde::Serialize;
use shared::{
    domain::{AddressId, AddressSummary, ClientId, ClientSummary, UserId},
    protocol::Page,
};
use sqlx::{sqlite::SqliteRow, Row};

use crate::{Credential, PageRequest, Storage, StoreError};

/// Name reported when a client row is missing.
pub(crate) const ENTITY: &str = "client";

#[derive(Debug, Clone)]
pub struct NewClient {
    pub name: String,
    pub email: String,
    pub credential: Credential,
    pub address_id: AddressId,
}

#[derive(Debug, Clone)]
pub struct ClientChanges {
    pub name: String,
    pub email: String,
    pub address_id: AddressId,
}

/// Client joined with its owning user and its address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredClient {
    pub id: ClientId,
    pub user_id: UserId,
    pub name: String,
    pub email: String,
    pub address_id: AddressId,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
}

impl From<StoredClient> for ClientSummary {
    fn from(value: StoredClient) -> Self {
        Self {
            client_id: value.id,
            user_id: value.user_id,
            name: value.name,
            email: value.email,
            address: AddressSummary {
                address_id: value.address_id,
                street: value.street,
                city: value.city,
                state: value.state,
                zip_code: value.zip_code,
            },
        }
    }
}

const CLIENT_COLUMNS: &str = "c.id, c.user_id, u.name, u.email, a.id, a.street, a.city, a.state, a.zip_code
     FROM clients c
     INNER JOIN users u ON u.id = c.user_id
     INNER JOIN addresses a ON a.id = c.address_id";

fn client_from_row(r: &SqliteRow) -> StoredClient {
    StoredClient {
        id: ClientId(r.get::<i64, _>(0)),
        user_id: UserId(r.get::<i64, _>(1)),
        name: r.get::<String, _>(2),
        email: r.get::<String, _>(3),
        address_id: AddressId(r.get::<i64, _>(4)),
        street: r.get::<String, _>(5),
        city: r.get::<String, _>(6),
        state: r.get::<String, _>(7),
        zip_code: r.get::<String, _>(8),
    }
}

impl Storage {
    /// Creates the user and its client profile as one unit of work.
    ///
    /// Constraint failures on either insert (duplicate email, unknown
    /// address) surface as [`StoreError::AggregateWriteFailed`] and leave no
    /// rows behind.
    pub async fn create_client_aggregate(&self, client: &NewClient) -> Result<ClientId, StoreError> {
        self.insert_client_aggregate(client)
            .await
            .map_err(StoreError::into_aggregate_failure)
    }

    async fn insert_client_aggregate(&self, client: &NewClient) -> Result<ClientId, StoreError> {
        let mut tx = self.pool.begin().await?;

        let user = sqlx::query(
            "INSERT INTO users (name, email, password_hash) VALUES (?, ?, ?) RETURNING id",
        )
        .bind(&client.name)
        .bind(&client.email)
        .bind(client.credential.as_str())
        .fetch_one(&mut *tx)
        .await?;
        let user_id = user.get::<i64, _>(0);

        let rec = sqlx::query("INSERT INTO clients (user_id, address_id) VALUES (?, ?) RETURNING id")
            .bind(user_id)
            .bind(client.address_id.0)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(ClientId(rec.get::<i64, _>(0)))
    }

    /// Updates the owning user's name/email and the client's address together.
    pub async fn update_client_aggregate(
        &self,
        client_id: ClientId,
        changes: &ClientChanges,
    ) -> Result<(), StoreError> {
        self.apply_client_changes(client_id, changes)
            .await
            .map_err(StoreError::into_aggregate_failure)
    }

    async fn apply_client_changes(
        &self,
        client_id: ClientId,
        changes: &ClientChanges,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        // First statement writes so the transaction takes the write lock up
        // front instead of upgrading from a read snapshot.
        let users_updated = sqlx::query(
            "UPDATE users SET name = ?, email = ?, updated_at = CURRENT_TIMESTAMP
             WHERE id = (SELECT user_id FROM clients WHERE id = ?)",
        )
        .bind(&changes.name)
        .bind(&changes.email)
        .bind(client_id.0)
        .execute(&mut *tx)
        .await?
        .rows_affected();
        if users_updated == 0 {
            return Err(StoreError::not_found(ENTITY, client_id.0));
        }

        sqlx::query("UPDATE clients SET address_id = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?")
            .bind(changes.address_id.0)
            .bind(client_id.0)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn find_client(&self, client_id: ClientId) -> Result<Option<StoredClient>, StoreError> {
        let row = sqlx::query(&format!("SELECT {CLIENT_COLUMNS} WHERE c.id = ?"))
            .bind(client_id.0)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(client_from_row))
    }

    pub async fn list_clients(&self, request: PageRequest) -> Result<Page<StoredClient>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {CLIENT_COLUMNS} ORDER BY c.id ASC LIMIT ? OFFSET ?"
        ))
        .bind(request.limit())
        .bind(request.offset())
        .fetch_all(&self.pool)
        .await?;
        let total = self.count_rows("clients").await?;
        Ok(request.page_of(rows.iter().map(client_from_row).collect(), total))
    }

    /// Deletes the owning user; the client row follows through
    /// `ON DELETE CASCADE`, so the aggregate disappears in one statement.
    pub async fn delete_client(&self, client_id: ClientId) -> Result<(), StoreError> {
        let deleted = sqlx::query(
            "DELETE FROM users WHERE id = (SELECT user_id FROM clients WHERE id = ?)",
        )
        .bind(client_id.0)
        .execute(&self.pool)
        .await?
        .rows_affected();
        if deleted == 0 {
            return Err(StoreError::not_found(ENTITY, client_id.0));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/clients_tests.rs"]
mod tests;
