// HTTP request handlers
use crate::application::dashboard_service::{NewWidget, WidgetChanges};
use crate::domain::dashboard::DashboardUpdate;
use crate::domain::date_range::DateRange;
use crate::domain::layout::LayoutItem;
use crate::domain::record::Record;
use crate::presentation::app_state::AppState;
use crate::presentation::error::ApiError;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

type ApiResult = Result<Response, ApiError>;

#[derive(Deserialize)]
pub struct CreateDatasetRequest {
    pub name: String,
    #[serde(default)]
    pub rows: Vec<Record>,
}

#[derive(Deserialize)]
pub struct RowsQuery {
    pub limit: Option<usize>,
}

#[derive(Deserialize)]
pub struct RenderQuery {
    pub range: Option<String>,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Widget archetypes grouped as Charts, Tables, KPIs
pub async fn get_palette(State(state): State<Arc<AppState>>) -> Response {
    Json(state.dashboard_service.palette().sections()).into_response()
}

pub async fn list_datasets(State(state): State<Arc<AppState>>) -> ApiResult {
    let datasets = state.dataset_service.list_datasets().await?;
    Ok(Json(datasets).into_response())
}

pub async fn create_dataset(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateDatasetRequest>,
) -> ApiResult {
    if request.name.trim().is_empty() {
        return Err(ApiError::BadRequest("dataset name must not be empty".to_string()));
    }

    let info = state
        .dataset_service
        .create_dataset(&request.name, request.rows)
        .await?;
    Ok((StatusCode::CREATED, Json(info)).into_response())
}

/// Dataset metadata plus a preview of the first rows
pub async fn get_dataset(Path(id): Path<String>, State(state): State<Arc<AppState>>) -> ApiResult {
    let dataset = state
        .dataset_service
        .get_dataset(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("dataset not found: {}", id)))?;
    Ok(Json(dataset.preview()).into_response())
}

/// Full rows, or the first `limit` of them
pub async fn get_dataset_rows(
    Path(id): Path<String>,
    Query(query): Query<RowsQuery>,
    State(state): State<Arc<AppState>>,
) -> ApiResult {
    let dataset = state
        .dataset_service
        .get_dataset(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("dataset not found: {}", id)))?;

    let rows = dataset.rows(query.limit.unwrap_or(0));
    Ok(Json(json!({ "rows": rows, "rowCount": dataset.records.len() })).into_response())
}

pub async fn get_dashboard(
    Path(dataset_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult {
    let dashboard = state.dashboard_service.get_dashboard(&dataset_id).await?;
    Ok(Json(dashboard).into_response())
}

pub async fn save_dashboard(
    Path(dataset_id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(update): Json<DashboardUpdate>,
) -> ApiResult {
    let dashboard = state
        .dashboard_service
        .save_dashboard(&dataset_id, update)
        .await?;
    Ok(Json(dashboard).into_response())
}

pub async fn add_widget(
    Path(dataset_id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<NewWidget>,
) -> ApiResult {
    let widget = state
        .dashboard_service
        .add_widget(&dataset_id, &request)
        .await?;
    Ok((StatusCode::CREATED, Json(widget)).into_response())
}

pub async fn update_widget(
    Path((dataset_id, widget_id)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
    Json(changes): Json<WidgetChanges>,
) -> ApiResult {
    let dashboard = state
        .dashboard_service
        .update_widget(&dataset_id, &widget_id, changes)
        .await?;
    Ok(Json(dashboard).into_response())
}

pub async fn delete_widget(
    Path((dataset_id, widget_id)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
) -> ApiResult {
    let dashboard = state
        .dashboard_service
        .delete_widget(&dataset_id, &widget_id)
        .await?;
    Ok(Json(dashboard).into_response())
}

/// Positions reported by the grid after a drag or resize
pub async fn save_layout(
    Path(dataset_id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(items): Json<Vec<LayoutItem>>,
) -> ApiResult {
    let dashboard = state
        .dashboard_service
        .apply_layout(&dataset_id, &items)
        .await?;
    Ok(Json(dashboard).into_response())
}

pub async fn render_dashboard(
    Path(dataset_id): Path<String>,
    Query(query): Query<RenderQuery>,
    State(state): State<Arc<AppState>>,
) -> ApiResult {
    let range = query
        .range
        .as_deref()
        .map(str::parse::<DateRange>)
        .transpose()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let rendered = state.dashboard_service.render(&dataset_id, range).await?;
    Ok(Json(rendered).into_response())
}

/// Widget rectangles plus the free cells of the background guide
pub async fn get_grid(
    Path(dataset_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult {
    let grid = state.dashboard_service.grid(&dataset_id).await?;
    Ok(Json(grid).into_response())
}
