//! Commission report read from the `sales_commission_view` database view.
//!
//! Rows have no identity and no timestamps; the view derives them from sales,
//! sellers, clients and addresses. Nothing in this crate writes to it.

use chrono::{DateTime, Utc};
use shared::{
    domain::SaleStatus,
    protocol::{CommissionReportRow, Page},
};
use sqlx::{sqlite::SqliteRow, Row};

use crate::{PageRequest, Storage, StoreError};

const COMMISSION_REPORT_COLUMNS: [&str; 9] = [
    "company",
    "seller",
    "client",
    "city",
    "state",
    "sold_at",
    "status",
    "total_amount",
    "commission",
];

/// Read-only projection over the commission view.
pub struct SalesCommission;

impl SalesCommission {
    pub const VIEW: &'static str = "sales_commission_view";

    /// Display columns, always in this order.
    pub fn columns() -> &'static [&'static str] {
        &COMMISSION_REPORT_COLUMNS
    }
}

fn report_row_from_row(r: &SqliteRow) -> Result<CommissionReportRow, StoreError> {
    let status = r
        .get::<String, _>("status")
        .parse::<SaleStatus>()
        .map_err(|e| StoreError::decode("commission report status", e))?;
    Ok(CommissionReportRow {
        company: r.get::<String, _>("company"),
        seller: r.get::<String, _>("seller"),
        client: r.get::<String, _>("client"),
        city: r.get::<String, _>("city"),
        state: r.get::<String, _>("state"),
        sold_at: r.get::<DateTime<Utc>, _>("sold_at"),
        status,
        total_amount: r.get::<i64, _>("total_amount"),
        commission: r.get::<i64, _>("commission"),
    })
}

impl Storage {
    /// Newest sales first.
    pub async fn list_commission_report(
        &self,
        request: PageRequest,
    ) -> Result<Page<CommissionReportRow>, StoreError> {
        let rows = sqlx::query(
            "SELECT company, seller, client, city, state, sold_at, status, total_amount, commission
             FROM sales_commission_view
             ORDER BY sold_at DESC
             LIMIT ? OFFSET ?",
        )
        .bind(request.limit())
        .bind(request.offset())
        .fetch_all(&self.pool)
        .await?;
        let total = self.count_rows(SalesCommission::VIEW).await?;
        let items = rows
            .iter()
            .map(report_row_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(request.page_of(items, total))
    }
}

#[cfg(test)]
#[path = "tests/reports_tests.rs"]
mod tests;
