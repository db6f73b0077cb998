use serde::Serialize;
use shared::{domain::SellerId, protocol::Page};
use sqlx::{sqlite::SqliteRow, Row};

use crate::{PageRequest, Storage, StoreError};

/// Name reported when a seller row is missing.
pub(crate) const ENTITY: &str = "seller";

#[derive(Debug, Clone)]
pub struct NewSeller {
    pub name: String,
    pub company: String,
    /// Commission in basis points of the sale total (0..=10000).
    pub commission_rate_bps: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredSeller {
    pub id: SellerId,
    pub name: String,
    pub company: String,
    pub commission_rate_bps: i64,
}

fn seller_from_row(r: &SqliteRow) -> StoredSeller {
    StoredSeller {
        id: SellerId(r.get::<i64, _>(0)),
        name: r.get::<String, _>(1),
        company: r.get::<String, _>(2),
        commission_rate_bps: r.get::<i64, _>(3),
    }
}

impl Storage {
    pub async fn create_seller(&self, seller: &NewSeller) -> Result<SellerId, StoreError> {
        let rec = sqlx::query(
            "INSERT INTO sellers (name, company, commission_rate_bps) VALUES (?, ?, ?) RETURNING id",
        )
        .bind(&seller.name)
        .bind(&seller.company)
        .bind(i64::from(seller.commission_rate_bps))
        .fetch_one(&self.pool)
        .await?;
        Ok(SellerId(rec.get::<i64, _>(0)))
    }

    pub async fn find_seller(&self, seller_id: SellerId) -> Result<Option<StoredSeller>, StoreError> {
        let row = sqlx::query(
            "SELECT id, name, company, commission_rate_bps FROM sellers WHERE id = ?",
        )
        .bind(seller_id.0)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(seller_from_row))
    }

    pub async fn list_sellers(&self, request: PageRequest) -> Result<Page<StoredSeller>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, name, company, commission_rate_bps FROM sellers ORDER BY id ASC LIMIT ? OFFSET ?",
        )
        .bind(request.limit())
        .bind(request.offset())
        .fetch_all(&self.pool)
        .await?;
        let total = self.count_rows("sellers").await?;
        Ok(request.page_of(rows.iter().map(seller_from_row).collect(), total))
    }

    pub async fn delete_seller(&self, seller_id: SellerId) -> Result<(), StoreError> {
        let deleted = sqlx::query("DELETE FROM sellers WHERE id = ?")
            .bind(seller_id.0)
            .execute(&self.pool)
            .await?
            .rows_affected();
        if deleted == 0 {
            return Err(StoreError::not_found(ENTITY, seller_id.0));
        }
        Ok(())
    }
}
