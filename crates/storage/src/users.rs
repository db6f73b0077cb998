use serde::Serialize;
use shared::{domain::UserId, protocol::Page};
use sqlx::Row;

use crate::{PageRequest, Storage, StoreError};

/// Name reported when a user row is missing.
pub(crate) const ENTITY: &str = "user";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredUser {
    pub id: UserId,
    pub name: String,
    pub email: String,
}

impl Storage {
    pub async fn find_user(&self, user_id: UserId) -> Result<Option<StoredUser>, StoreError> {
        let row = sqlx::query("SELECT id, name, email FROM users WHERE id = ?")
            .bind(user_id.0)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| StoredUser {
            id: UserId(r.get::<i64, _>(0)),
            name: r.get::<String, _>(1),
            email: r.get::<String, _>(2),
        }))
    }

    pub async fn list_users(&self, request: PageRequest) -> Result<Page<StoredUser>, StoreError> {
        let rows = sqlx::query("SELECT id, name, email FROM users ORDER BY id ASC LIMIT ? OFFSET ?")
            .bind(request.limit())
            .bind(request.offset())
            .fetch_all(&self.pool)
            .await?;
        let total = self.count_rows("users").await?;
        let users = rows
            .into_iter()
            .map(|r| StoredUser {
                id: UserId(r.get::<i64, _>(0)),
                name: r.get::<String, _>(1),
                email: r.get::<String, _>(2),
            })
            .collect();
        Ok(request.page_of(users, total))
    }

    /// Removes the user; its client profile goes with it through the
    /// `ON DELETE CASCADE` reference.
    pub async fn delete_user(&self, user_id: UserId) -> Result<(), StoreError> {
        let deleted = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(user_id.0)
            .execute(&self.pool)
            .await?
            .rows_affected();
        if deleted == 0 {
            return Err(StoreError::not_found(ENTITY, user_id.0));
        }
        Ok(())
    }
}
