use chrono::{DateTime, Utc};
use serde::Serialize;
use shared::{
    domain::{ClientId, SaleId, SaleStatus, SellerId},
    protocol::Page,
};
use sqlx::{sqlite::SqliteRow, Row};

use crate::{PageRequest, Storage, StoreError};

/// Name reported when a sale row is missing.
pub(crate) const ENTITY: &str = "sale";

#[derive(Debug, Clone)]
pub struct NewSale {
    pub seller_id: SellerId,
    pub client_id: ClientId,
    pub sold_at: DateTime<Utc>,
    /// Amount in cents.
    pub total_amount: i64,
    pub status: SaleStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredSale {
    pub id: SaleId,
    pub seller_id: SellerId,
    pub client_id: ClientId,
    pub sold_at: DateTime<Utc>,
    pub total_amount: i64,
    pub status: SaleStatus,
}

fn sale_from_row(r: &SqliteRow) -> Result<StoredSale, StoreError> {
    let status = r
        .get::<String, _>(5)
        .parse::<SaleStatus>()
        .map_err(|e| StoreError::decode("sale status", e))?;
    Ok(StoredSale {
        id: SaleId(r.get::<i64, _>(0)),
        seller_id: SellerId(r.get::<i64, _>(1)),
        client_id: ClientId(r.get::<i64, _>(2)),
        sold_at: r.get::<DateTime<Utc>, _>(3),
        total_amount: r.get::<i64, _>(4),
        status,
    })
}

impl Storage {
    pub async fn create_sale(&self, sale: &NewSale) -> Result<SaleId, StoreError> {
        let rec = sqlx::query(
            "INSERT INTO sales (seller_id, client_id, sold_at, total_amount, status)
             VALUES (?, ?, ?, ?, ?) RETURNING id",
        )
        .bind(sale.seller_id.0)
        .bind(sale.client_id.0)
        .bind(sale.sold_at)
        .bind(sale.total_amount)
        .bind(sale.status.as_str())
        .fetch_one(&self.pool)
        .await?;
        Ok(SaleId(rec.get::<i64, _>(0)))
    }

    pub async fn find_sale(&self, sale_id: SaleId) -> Result<Option<StoredSale>, StoreError> {
        let row = sqlx::query(
            "SELECT id, seller_id, client_id, sold_at, total_amount, status FROM sales WHERE id = ?",
        )
        .bind(sale_id.0)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(sale_from_row).transpose()
    }

    pub async fn list_sales(&self, request: PageRequest) -> Result<Page<StoredSale>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, seller_id, client_id, sold_at, total_amount, status
             FROM sales
             ORDER BY id ASC
             LIMIT ? OFFSET ?",
        )
        .bind(request.limit())
        .bind(request.offset())
        .fetch_all(&self.pool)
        .await?;
        let total = self.count_rows("sales").await?;
        let sales = rows
            .iter()
            .map(sale_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(request.page_of(sales, total))
    }

    pub async fn delete_sale(&self, sale_id: SaleId) -> Result<(), StoreError> {
        let deleted = sqlx::query("DELETE FROM sales WHERE id = ?")
            .bind(sale_id.0)
            .execute(&self.pool)
            .await?
            .rows_affected();
        if deleted == 0 {
            return Err(StoreError::not_found(ENTITY, sale_id.0));
        }
        Ok(())
    }
}
