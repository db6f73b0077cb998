use shared::{
    domain::{ClientId, ClientSummary},
    error::{ApiError, ErrorCode},
    protocol::{CommissionReportRow, CreateClientRequest, Page, TableView, UpdateClientRequest},
};
use storage::{
    ClientChanges, Credential, CredentialHasher, NewClient, PageRequest, ResourceRegistry,
    SalesCommission, Storage, StoreError,
};
use tracing::{error, warn};

pub mod table;
pub mod validation;

use table::{TableConfig, TableConfigError, TableSet};

#[derive(Clone)]
pub struct ApiContext {
    pub storage: Storage,
    pub hasher: CredentialHasher,
    pub tables: TableSet,
}

impl ApiContext {
    /// Registers every storage-backed resource and binds `tables` to them.
    pub fn new(
        storage: Storage,
        hasher: CredentialHasher,
        tables: impl IntoIterator<Item = TableConfig>,
    ) -> Result<Self, TableConfigError> {
        let registry = ResourceRegistry::with_defaults(&storage);
        let tables = TableSet::build(&registry, tables)?;
        Ok(Self {
            storage,
            hasher,
            tables,
        })
    }
}

pub async fn list_clients(ctx: &ApiContext, page: u32) -> Result<Page<ClientSummary>, ApiError> {
    let clients = ctx
        .storage
        .list_clients(PageRequest::new(page))
        .await
        .map_err(store_error)?;
    Ok(clients.map(ClientSummary::from))
}

pub async fn show_client(ctx: &ApiContext, client_id: ClientId) -> Result<ClientSummary, ApiError> {
    ctx.storage
        .find_client(client_id)
        .await
        .map_err(store_error)?
        .map(ClientSummary::from)
        .ok_or_else(|| ApiError::not_found(format!("client {} not found", client_id.0)))
}

pub async fn create_client(
    ctx: &ApiContext,
    request: CreateClientRequest,
) -> Result<ClientId, ApiError> {
    let fields = validation::client_fields(&request.name, &request.email, request.address_id)?;
    validation::password(&request.password)?;
    let credential = provision_credential(&ctx.hasher, request.password).await?;

    ctx.storage
        .create_client_aggregate(&NewClient {
            name: fields.name,
            email: fields.email,
            credential,
            address_id: request.address_id,
        })
        .await
        .map_err(store_error)
}

/// Hashes `password` on the blocking pool, off the async workers.
async fn provision_credential(
    hasher: &CredentialHasher,
    password: String,
) -> Result<Credential, ApiError> {
    let hasher = hasher.clone();
    tokio::task::spawn_blocking(move || hasher.hash(&password))
        .await
        .map_err(|e| {
            error!(error = %e, "credential hashing task failed");
            ApiError::new(ErrorCode::Internal, "internal error")
        })?
        .map_err(store_error)
}

pub async fn update_client(
    ctx: &ApiContext,
    client_id: ClientId,
    request: UpdateClientRequest,
) -> Result<(), ApiError> {
    let fields = validation::client_fields(&request.name, &request.email, request.address_id)?;
    ctx.storage
        .update_client_aggregate(
            client_id,
            &ClientChanges {
                name: fields.name,
                email: fields.email,
                address_id: request.address_id,
            },
        )
        .await
        .map_err(store_error)
}

pub fn table_names(ctx: &ApiContext) -> Vec<String> {
    ctx.tables.names()
}

pub async fn render_table(ctx: &ApiContext, table: &str, page: u32) -> Result<TableView, ApiError> {
    let table = ctx
        .tables
        .get(table)
        .ok_or_else(|| ApiError::not_found(format!("table '{table}' is not configured")))?;
    table.render(page).await.map_err(store_error)
}

pub async fn delete_table_row(ctx: &ApiContext, table: &str, id: i64) -> Result<(), ApiError> {
    let table = ctx
        .tables
        .get(table)
        .ok_or_else(|| ApiError::not_found(format!("table '{table}' is not configured")))?;
    table.delete(id).await.map_err(store_error)
}

pub async fn commission_report(
    ctx: &ApiContext,
    page: u32,
) -> Result<Page<CommissionReportRow>, ApiError> {
    ctx.storage
        .list_commission_report(PageRequest::new(page))
        .await
        .map_err(store_error)
}

pub fn commission_report_columns() -> Vec<String> {
    SalesCommission::columns()
        .iter()
        .map(|column| column.to_string())
        .collect()
}

/// Maps a store failure to its wire error. Details of unavailable or
/// undecodable store state are logged, not returned.
pub fn store_error(err: StoreError) -> ApiError {
    match err {
        StoreError::EntityNotFound { .. } => ApiError::not_found(err.to_string()),
        StoreError::AggregateWriteFailed { .. } | StoreError::Constraint { .. } => {
            warn!(error = %err, "write rejected by store");
            ApiError::new(ErrorCode::Conflict, err.to_string())
        }
        StoreError::StoreUnavailable(_) => {
            error!(error = %err, "store unavailable");
            ApiError::new(ErrorCode::Unavailable, "store unavailable")
        }
        StoreError::Credential { .. } | StoreError::Decode { .. } => {
            error!(error = %err, "store operation failed");
            ApiError::new(ErrorCode::Internal, "internal error")
        }
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
