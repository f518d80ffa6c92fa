// Route table - binds handlers to paths and wraps them in tracing and compression
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    add_widget, create_dataset, delete_widget, get_dashboard, get_dataset, get_dataset_rows,
    get_grid, get_palette, health_check, list_datasets, render_dashboard, save_dashboard,
    save_layout, update_widget,
};
use axum::{
    routing::{get, patch, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, trace::TraceLayer};

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .route("/palette", get(get_palette))
        .route("/datasets", get(list_datasets).post(create_dataset))
        .route("/datasets/:id", get(get_dataset))
        .route("/datasets/:id/rows", get(get_dataset_rows))
        .route("/dashboards/:dataset_id", get(get_dashboard).put(save_dashboard))
        .route("/dashboards/:dataset_id/widgets", post(add_widget))
        .route(
            "/dashboards/:dataset_id/widgets/:widget_id",
            patch(update_widget).delete(delete_widget),
        )
        .route("/dashboards/:dataset_id/layout", put(save_layout))
        .route("/dashboards/:dataset_id/render", get(render_dashboard))
        .route("/dashboards/:dataset_id/grid", get(get_grid))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::clock::FixedClock;
    use crate::application::dashboard_service::DashboardService;
    use crate::application::dataset_service::DatasetService;
    use crate::infrastructure::config::{builtin_palette, EngineConfig};
    use crate::infrastructure::memory_repository::MemoryRepository;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request, StatusCode};
    use chrono::DateTime;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app() -> Router {
        let repository = Arc::new(MemoryRepository::new());
        let clock = Arc::new(FixedClock(
            DateTime::parse_from_rfc3339("2024-06-15T12:00:00+00:00").unwrap(),
        ));

        let state = Arc::new(AppState {
            dashboard_service: DashboardService::new(
                repository.clone(),
                repository.clone(),
                clock.clone(),
                Arc::new(builtin_palette().unwrap()),
                EngineConfig::default(),
            ),
            dataset_service: DatasetService::new(repository, clock),
        });
        build_router(state)
    }

    async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn upload_orders(app: &Router) -> String {
        let (status, body) = call(
            app,
            Method::POST,
            "/datasets",
            Some(json!({
                "name": "Orders",
                "rows": [
                    {"product": "A", "status": "Pending", "totalAmount": 5, "orderDate": "2024-06-14"},
                    {"product": "A", "status": "Pending", "totalAmount": 7, "orderDate": "2024-06-13"},
                    {"product": "B", "status": "Completed", "totalAmount": 3, "orderDate": "2023-01-01"}
                ]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health_and_palette() {
        let app = app();
        let response = app
            .clone()
            .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let (status, palette) = call(&app, Method::GET, "/palette", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(palette[0]["group"], json!("Charts"));
        assert_eq!(palette[2]["items"][0]["label"], json!("KPI Value"));
    }

    #[tokio::test]
    async fn test_dataset_endpoints() {
        let app = app();
        let id = upload_orders(&app).await;

        let (_, listed) = call(&app, Method::GET, "/datasets", None).await;
        assert_eq!(listed[0]["rowCount"], json!(3));

        let (_, preview) = call(&app, Method::GET, &format!("/datasets/{}", id), None).await;
        assert_eq!(preview["sampleRows"].as_array().unwrap().len(), 3);

        let (_, rows) = call(&app, Method::GET, &format!("/datasets/{}/rows?limit=2", id), None).await;
        assert_eq!(rows["rows"].as_array().unwrap().len(), 2);
        assert_eq!(rows["rowCount"], json!(3));

        let (status, body) = call(&app, Method::GET, "/datasets/missing", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("missing"));

        let (status, _) = call(&app, Method::POST, "/datasets", Some(json!({"name": " "}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_widget_lifecycle_and_render() {
        let app = app();
        let id = upload_orders(&app).await;
        let base = format!("/dashboards/{}", id);

        let (status, dashboard) = call(&app, Method::GET, &base, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(dashboard, json!({"name": "Default Dashboard", "dateRange": "all", "widgets": []}));

        let (status, bar) = call(&app, Method::POST, &format!("{}/widgets", base), Some(json!({"type": "bar"}))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(bar["layout"], json!({"x": 0, "y": 0, "w": 5, "h": 5}));
        let widget_id = bar["widgetId"].as_str().unwrap().to_string();

        let (status, _) = call(&app, Method::POST, &format!("{}/widgets", base), Some(json!({"type": "gauge"}))).await;
        assert!(status.is_client_error());

        let (_, patched) = call(
            &app,
            Method::PATCH,
            &format!("{}/widgets/{}", base, widget_id),
            Some(json!({"title": "Revenue", "layout": {"w": 20}})),
        )
        .await;
        assert_eq!(patched["widgets"][0]["title"], json!("Revenue"));
        assert_eq!(patched["widgets"][0]["layout"]["w"], json!(12));

        let (_, saved) = call(&app, Method::PUT, &base, Some(json!({"dateRange": "last7"}))).await;
        assert_eq!(saved["dateRange"], json!("last7"));

        let (status, rendered) = call(&app, Method::GET, &format!("{}/render", base), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(rendered["recordCount"], json!(2));
        assert_eq!(rendered["widgets"][0]["output"]["kind"], json!("cartesian"));
        assert_eq!(rendered["widgets"][0]["output"]["points"], json!([{"x": "A", "y": 12.0}]));

        let (_, all) = call(&app, Method::GET, &format!("{}/render?range=all", base), None).await;
        assert_eq!(all["recordCount"], json!(3));
        let (status, _) = call(&app, Method::GET, &format!("{}/render?range=yesterday", base), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, unchanged) = call(&app, Method::DELETE, &format!("{}/widgets/nope", base), None).await;
        assert_eq!(unchanged["widgets"].as_array().unwrap().len(), 1);
        let (_, emptied) = call(&app, Method::DELETE, &format!("{}/widgets/{}", base, widget_id), None).await;
        assert_eq!(emptied["widgets"], json!([]));
    }

    #[tokio::test]
    async fn test_layout_and_grid() {
        let app = app();
        let id = upload_orders(&app).await;
        let base = format!("/dashboards/{}", id);

        let (_, kpi) = call(&app, Method::POST, &format!("{}/widgets", base), Some(json!({"label": "KPI Value"}))).await;
        let widget_id = kpi["widgetId"].as_str().unwrap();

        let (_, moved) = call(
            &app,
            Method::PUT,
            &format!("{}/layout", base),
            Some(json!([{"i": widget_id, "x": 3, "y": 2, "w": 2, "h": 2}, {"i": "ghost", "x": 0, "y": 0, "w": 1, "h": 1}])),
        )
        .await;
        assert_eq!(moved["widgets"][0]["layout"], json!({"x": 3, "y": 2, "w": 2, "h": 2}));

        let (_, grid) = call(&app, Method::GET, &format!("{}/grid", base), None).await;
        assert_eq!(grid["columns"], json!(12));
        assert_eq!(grid["freeCells"].as_array().unwrap().len(), 32 * 12 - 4);

        let (status, _) = call(&app, Method::GET, "/dashboards/unknown/grid", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
