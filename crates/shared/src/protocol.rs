use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{AddressId, ClientId, SaleStatus};

/// Rows per page for every paginated listing.
pub const DEFAULT_PER_PAGE: u32 = 10;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub page: Option<u32>,
}

/// One page of an ordered listing. `page` is 1-based.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
    pub last_page: u32,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, page: u32, per_page: u32, total: u64) -> Self {
        let per_page = per_page.max(1);
        let last_page = total.div_ceil(u64::from(per_page)).max(1);
        Self {
            items,
            page,
            per_page,
            total,
            last_page: u32::try_from(last_page).unwrap_or(u32::MAX),
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            per_page: self.per_page,
            total: self.total,
            last_page: self.last_page,
        }
    }

    pub fn try_map<U, E>(self, f: impl FnMut(T) -> Result<U, E>) -> Result<Page<U>, E> {
        Ok(Page {
            items: self.items.into_iter().map(f).collect::<Result<_, _>>()?,
            page: self.page,
            per_page: self.per_page,
            total: self.total,
            last_page: self.last_page,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateClientRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub address_id: AddressId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateClientRequest {
    pub name: String,
    pub email: String,
    pub address_id: AddressId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientCreated {
    pub client_id: ClientId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableCell {
    pub column: String,
    pub value: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    pub id: i64,
    pub cells: Vec<TableCell>,
    pub edit_target: String,
    pub delete_target: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableView {
    pub table: String,
    pub resource: String,
    pub columns: Vec<String>,
    pub rows: Page<TableRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionReportRow {
    pub company: String,
    pub seller: String,
    pub client: String,
    pub city: String,
    pub state: String,
    pub sold_at: DateTime<Utc>,
    pub status: SaleStatus,
    pub total_amount: i64,
    pub commission: i64,
}
