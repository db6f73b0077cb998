use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Redirect},
    routing::{delete, get},
    Json, Router,
};
use server_api::{
    commission_report, commission_report_columns, create_client, delete_table_row, list_clients,
    render_table, show_client, table_names, update_client, ApiContext,
};
use shared::{
    domain::{ClientId, ClientSummary},
    error::{ApiError, ErrorCode},
    protocol::{
        ClientCreated, CommissionReportRow, CreateClientRequest, Page, PageQuery, TableView,
        UpdateClientRequest,
    },
};
use storage::{CredentialHasher, Storage};
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod config;

use config::load_settings;

const CLIENTS_INDEX: &str = "/clients";

struct AppState {
    api: ApiContext,
}

type HttpError = (StatusCode, Json<ApiError>);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = load_settings()?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let database_url = settings.normalized_database_url();
    let storage = Storage::new(&database_url).await.map_err(|error| {
        error!(
            %database_url,
            %error,
            "failed to open SQLite database; verify parent directory exists and permissions are correct"
        );
        error
    })?;
    let api = ApiContext::new(storage, CredentialHasher::default(), settings.table_configs())?;
    info!(tables = ?api.tables.names(), "tables configured");

    let app = build_router(Arc::new(AppState { api }), settings.max_body_bytes);

    let addr: SocketAddr = settings.bind_addr.parse()?;
    info!(%addr, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/clients", get(http_list_clients).post(http_create_client))
        .route("/clients/:client_id", get(http_show_client).put(http_update_client))
        .route("/tables", get(http_table_names))
        .route("/tables/:table", get(http_render_table))
        .route("/tables/:table/:id", delete(http_delete_table_row))
        .route("/reports/commissions", get(http_commission_report))
        .route("/reports/commissions/columns", get(http_commission_columns))
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .with_state(state)
}

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::Validation => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Conflict => StatusCode::CONFLICT,
        ErrorCode::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn http_error(err: ApiError) -> HttpError {
    (status_for(err.code), Json(err))
}

/// Oversized bodies keep 413; any other unreadable body is a validation failure.
fn json_payload<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, HttpError> {
    payload.map(|Json(value)| value).map_err(|rejection| {
        let status = match rejection.status() {
            StatusCode::PAYLOAD_TOO_LARGE => StatusCode::PAYLOAD_TOO_LARGE,
            _ => status_for(ErrorCode::Validation),
        };
        (status, Json(ApiError::validation(rejection.body_text())))
    })
}

async fn healthz(State(state): State<Arc<AppState>>) -> Result<&'static str, HttpError> {
    state.api.storage.health_check().await.map_err(|e| {
        error!(error = %e, "health check failed");
        http_error(ApiError::new(ErrorCode::Unavailable, "store unavailable"))
    })?;
    Ok("ok")
}

async fn http_list_clients(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<ClientSummary>>, HttpError> {
    let page = list_clients(&state.api, query.page.unwrap_or(1))
        .await
        .map_err(http_error)?;
    Ok(Json(page))
}

async fn http_create_client(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateClientRequest>, JsonRejection>,
) -> Result<impl IntoResponse, HttpError> {
    let req = json_payload(payload)?;
    let client_id = create_client(&state.api, req).await.map_err(http_error)?;
    info!(client_id = client_id.0, "client created");
    Ok((
        StatusCode::SEE_OTHER,
        [(header::LOCATION, CLIENTS_INDEX)],
        Json(ClientCreated { client_id }),
    ))
}

async fn http_show_client(
    State(state): State<Arc<AppState>>,
    Path(client_id): Path<i64>,
) -> Result<Json<ClientSummary>, HttpError> {
    let client = show_client(&state.api, ClientId(client_id))
        .await
        .map_err(http_error)?;
    Ok(Json(client))
}

async fn http_update_client(
    State(state): State<Arc<AppState>>,
    Path(client_id): Path<i64>,
    payload: Result<Json<UpdateClientRequest>, JsonRejection>,
) -> Result<Redirect, HttpError> {
    let req = json_payload(payload)?;
    update_client(&state.api, ClientId(client_id), req)
        .await
        .map_err(http_error)?;
    info!(client_id, "client updated");
    Ok(Redirect::to(CLIENTS_INDEX))
}

async fn http_table_names(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    Json(table_names(&state.api))
}

async fn http_render_table(
    State(state): State<Arc<AppState>>,
    Path(table): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<TableView>, HttpError> {
    let view = render_table(&state.api, &table, query.page.unwrap_or(1))
        .await
        .map_err(http_error)?;
    Ok(Json(view))
}

async fn http_delete_table_row(
    State(state): State<Arc<AppState>>,
    Path((table, id)): Path<(String, i64)>,
) -> Result<StatusCode, HttpError> {
    delete_table_row(&state.api, &table, id)
        .await
        .map_err(http_error)?;
    info!(%table, id, "row deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn http_commission_report(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<CommissionReportRow>>, HttpError> {
    let page = commission_report(&state.api, query.page.unwrap_or(1))
        .await
        .map_err(http_error)?;
    Ok(Json(page))
}

async fn http_commission_columns() -> Json<Vec<String>> {
    Json(commission_report_columns())
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
