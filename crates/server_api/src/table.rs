//! Generic paginated table bound to a registered resource by name.
//!
//! A [`Table`] is built once from a [`TableConfig`]; the resource name and
//! every column are checked against the [`ResourceRegistry`] at that point, so
//! misconfigured tables fail at startup rather than on first request.

use std::{collections::BTreeMap, sync::Arc};

use serde::{Deserialize, Serialize};
use shared::protocol::{TableCell, TableRow, TableView};
use storage::{PageRequest, Record, Resource, ResourceRegistry, StoreError};
use thiserror::Error;

/// Placeholder substituted with the row id in edit and delete targets.
pub const ID_PLACEHOLDER: &str = "{id}";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableConfig {
    /// Key the table is addressed by.
    pub name: String,
    /// Registered resource the rows come from.
    pub resource: String,
    pub columns: Vec<String>,
    pub edit_target: String,
    pub delete_target: String,
}

impl TableConfig {
    pub fn new(
        name: impl Into<String>,
        resource: impl Into<String>,
        columns: &[&str],
        edit_target: impl Into<String>,
        delete_target: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            resource: resource.into(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            edit_target: edit_target.into(),
            delete_target: delete_target.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableConfigError {
    #[error("table '{table}' refers to unregistered resource '{resource}'")]
    UnknownResource { table: String, resource: String },
    #[error("table '{table}' column '{column}' is not a field of resource '{resource}'")]
    UnknownColumn {
        table: String,
        resource: String,
        column: String,
    },
    #[error("table '{table}' has no columns")]
    NoColumns { table: String },
    #[error("table '{table}' is configured more than once")]
    Duplicate { table: String },
}

#[derive(Clone)]
pub struct Table {
    config: TableConfig,
    resource: Arc<dyn Resource>,
}

impl std::fmt::Debug for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table").field("config", &self.config).finish()
    }
}

impl Table {
    pub fn new(registry: &ResourceRegistry, config: TableConfig) -> Result<Self, TableConfigError> {
        let resource =
            registry
                .get(&config.resource)
                .ok_or_else(|| TableConfigError::UnknownResource {
                    table: config.name.clone(),
                    resource: config.resource.clone(),
                })?;

        if config.columns.is_empty() {
            return Err(TableConfigError::NoColumns {
                table: config.name.clone(),
            });
        }
        if let Some(column) = config
            .columns
            .iter()
            .find(|column| !resource.fields().contains(&column.as_str()))
        {
            return Err(TableConfigError::UnknownColumn {
                table: config.name.clone(),
                resource: config.resource.clone(),
                column: column.clone(),
            });
        }

        Ok(Self { config, resource })
    }

    /// One page of rows, ten per page, projected to the configured columns.
    pub async fn render(&self, page: u32) -> Result<TableView, StoreError> {
        let records = self.resource.list(PageRequest::new(page)).await?;
        let rows = records.try_map(|record| self.project(&record))?;
        Ok(TableView {
            table: self.config.name.clone(),
            resource: self.config.resource.clone(),
            columns: self.config.columns.clone(),
            rows,
        })
    }

    /// Removes the row with `id`. A missing row is reported, never ignored.
    pub async fn delete(&self, id: i64) -> Result<(), StoreError> {
        if self.resource.find(id).await?.is_none() {
            return Err(StoreError::EntityNotFound {
                entity: self.resource.entity(),
                id,
            });
        }
        self.resource.delete(id).await
    }

    fn project(&self, record: &Record) -> Result<TableRow, StoreError> {
        let id = record
            .get("id")
            .and_then(serde_json::Value::as_i64)
            .ok_or_else(|| StoreError::Decode {
                what: "table row",
                reason: format!("resource '{}' row has no numeric id", self.resource.name()),
            })?;
        let cells = self
            .config
            .columns
            .iter()
            .map(|column| TableCell {
                column: column.clone(),
                value: record
                    .get(column)
                    .cloned()
                    .unwrap_or(serde_json::Value::Null),
            })
            .collect();
        let id_text = id.to_string();
        Ok(TableRow {
            id,
            cells,
            edit_target: self.config.edit_target.replace(ID_PLACEHOLDER, &id_text),
            delete_target: self.config.delete_target.replace(ID_PLACEHOLDER, &id_text),
        })
    }
}

/// Every configured table, keyed by table name.
#[derive(Debug, Clone, Default)]
pub struct TableSet {
    tables: BTreeMap<String, Table>,
}

impl TableSet {
    pub fn build(
        registry: &ResourceRegistry,
        configs: impl IntoIterator<Item = TableConfig>,
    ) -> Result<Self, TableConfigError> {
        let mut tables = BTreeMap::new();
        for config in configs {
            let name = config.name.clone();
            if tables.contains_key(&name) {
                return Err(TableConfigError::Duplicate { table: name });
            }
            tables.insert(name, Table::new(registry, config)?);
        }
        Ok(Self { tables })
    }

    pub fn get(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.tables.keys().cloned().collect()
    }
}

/// Tables served when the configuration does not list any.
pub fn default_table_configs() -> Vec<TableConfig> {
    vec![
        TableConfig::new(
            "clients",
            "clients",
            &["name", "email", "city", "state"],
            "/clients/{id}",
            "/tables/clients/{id}",
        ),
        TableConfig::new(
            "users",
            "users",
            &["name", "email"],
            "/users/{id}",
            "/tables/users/{id}",
        ),
        TableConfig::new(
            "addresses",
            "addresses",
            &["street", "city", "state", "zip_code"],
            "/addresses/{id}",
            "/tables/addresses/{id}",
        ),
        TableConfig::new(
            "sellers",
            "sellers",
            &["name", "company", "commission_rate_bps"],
            "/sellers/{id}",
            "/tables/sellers/{id}",
        ),
        TableConfig::new(
            "sales",
            "sales",
            &["seller_id", "client_id", "sold_at", "total_amount", "status"],
            "/sales/{id}",
            "/tables/sales/{id}",
        ),
    ]
}

#[cfg(test)]
#[path = "tests/table_tests.rs"]
mod tests;
