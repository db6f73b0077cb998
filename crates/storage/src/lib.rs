use anyhow::{Context, Result};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use shared::protocol::{Page, DEFAULT_PER_PAGE};

mod addresses;
mod clients;
pub mod credentials;
mod error;
pub mod factories;
pub mod reports;
pub mod resources;
mod sales;
mod sellers;
mod users;

pub use addresses::{NewAddress, StoredAddress};
pub use clients::{ClientChanges, NewClient, StoredClient};
pub use credentials::{Credential, CredentialHasher};
pub use error::StoreError;
pub use reports::SalesCommission;
pub use resources::{Record, Resource, ResourceRegistry};
pub use sales::{NewSale, StoredSale};
pub use sellers::{NewSeller, StoredSeller};
pub use users::StoredUser;

const MAX_PER_PAGE: u32 = 100;

/// Handle to the relational store. Cloning shares the underlying pool.
#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

/// 1-based page selector used by every listing query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub per_page: u32,
}

impl PageRequest {
    pub fn new(page: u32) -> Self {
        Self::with_per_page(page, DEFAULT_PER_PAGE)
    }

    pub fn with_per_page(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, MAX_PER_PAGE),
        }
    }

    pub(crate) fn limit(&self) -> i64 {
        i64::from(self.per_page)
    }

    pub(crate) fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.per_page)
    }

    pub(crate) fn page_of<T>(&self, items: Vec<T>, total: i64) -> Page<T> {
        Page::new(
            items,
            self.page,
            self.per_page,
            u64::try_from(total).unwrap_or_default(),
        )
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1)
    }
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("failed to apply schema migrations")?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    /// Counts rows of a fixed table name. Never called with user input.
    pub(crate) async fn count_rows(&self, table: &'static str) -> Result<i64, StoreError> {
        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.starts_with("sqlite::memory:") || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;
