//! HTTP request handlers for API endpoints
//!
//! Every chart endpoint recomputes its series from the current snapshot on
//! each request; nothing derived is cached between requests.

use axum::{
    extract::{Path, State},
    response::Html,
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

use super::error::ApiError;
use super::state::AppState;
use crate::aggregation::{Panel, PanelKind};
use crate::render::{Figure, FigureRenderer, DASHBOARD_TITLE};
use crate::snapshot::{Snapshot, SnapshotInfo};

const INDEX_HTML: &str = include_str!("index.html");

/// Health check endpoint
///
/// Returns a simple status response to verify the server is running
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok"
    }))
}

/// GET / - Browser dashboard that draws the figures from `/dashboard`
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// Response for the full dashboard
#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub title: &'static str,
    pub snapshot: SnapshotInfo,
    pub figures: Vec<Figure>,
}

/// GET /dashboard - All three figures from one snapshot
pub async fn get_dashboard(State(state): State<Arc<AppState>>) -> Json<DashboardResponse> {
    let snapshot = state.current().await;
    let view = snapshot.view();
    let renderer = FigureRenderer::new();
    let figures = view
        .panels()
        .into_iter()
        .map(|panel| renderer.figure(panel))
        .collect();

    Json(DashboardResponse {
        title: DASHBOARD_TITLE,
        snapshot: snapshot.info(),
        figures,
    })
}

/// GET /charts/{chart} - Recompute and render a single chart
pub async fn get_chart(
    State(state): State<Arc<AppState>>,
    Path(chart): Path<String>,
) -> Result<Json<Figure>, ApiError> {
    let kind: PanelKind = chart.parse()?;
    let panel = state.current().await.panel(kind);
    tracing::debug!(chart = %kind, points = panel.len(), "rendered chart");
    Ok(Json(FigureRenderer::new().figure(&panel)))
}

/// GET /series/{chart} - Raw derived series of a single chart
pub async fn get_series(
    State(state): State<Arc<AppState>>,
    Path(chart): Path<String>,
) -> Result<Json<Panel>, ApiError> {
    let kind: PanelKind = chart.parse()?;
    Ok(Json(state.current().await.panel(kind)))
}

/// GET /snapshot - Identity and size of the current snapshot
pub async fn get_snapshot(State(state): State<Arc<AppState>>) -> Json<SnapshotInfo> {
    Json(state.current().await.info())
}

/// POST /refresh - Reload both tables and swap in a new snapshot
///
/// The read runs on the blocking pool; requests already holding the old
/// snapshot finish against it.
pub async fn refresh(State(state): State<Arc<AppState>>) -> Result<Json<SnapshotInfo>, ApiError> {
    let source = Arc::clone(&state.source);
    let snapshot = tokio::task::spawn_blocking(move || {
        let source = source.blocking_lock();
        Snapshot::refresh(&**source)
    })
    .await?;

    let snapshot = state.replace(snapshot).await;
    tracing::info!(
        snapshot = %snapshot.id(),
        records = snapshot.records().len(),
        "snapshot refreshed"
    );
    Ok(Json(snapshot.info()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{ActivityFact, FeatureCounters, UserDimension};
    use crate::render::ChartKind;
    use crate::source::{InMemoryDataSource, UnavailableDataSource};

    fn state() -> Arc<AppState> {
        let source = InMemoryDataSource::with_rows(
            vec![
                ActivityFact::from_date_str("1", "2024-01-01", FeatureCounters::new(1, 0, 0, 0))
                    .unwrap(),
                ActivityFact::from_date_str("2", "2024-01-02", FeatureCounters::new(0, 1, 0, 0))
                    .unwrap(),
            ],
            vec![
                UserDimension::new("1", Some("US")),
                UserDimension::new("2", Some("CA")),
            ],
        );
        Arc::new(AppState::new(source))
    }

    #[tokio::test]
    async fn dashboard_returns_three_figures() {
        let Json(response) = get_dashboard(State(state())).await;
        assert_eq!(response.title, DASHBOARD_TITLE);
        assert_eq!(response.snapshot.record_count, 2);
        let kinds: Vec<_> = response.figures.iter().map(|f| f.kind).collect();
        assert_eq!(kinds, vec![ChartKind::Line, ChartKind::Bar, ChartKind::Bar]);
    }

    #[tokio::test]
    async fn chart_endpoint_renders_requested_panel() {
        let Json(figure) = get_chart(State(state()), Path("adoption".to_string()))
            .await
            .unwrap();
        assert_eq!(figure.panel, PanelKind::Adoption);
        assert_eq!(figure.y, vec![0.5, 0.5, 0.0, 0.0]);
    }

    #[tokio::test]
    async fn unknown_chart_is_rejected() {
        let result = get_chart(State(state()), Path("mau".to_string())).await;
        assert!(matches!(result, Err(ApiError::InvalidParameter(_))));
    }

    #[tokio::test]
    async fn series_endpoint_returns_raw_panel() {
        let Json(panel) = get_series(State(state()), Path("countries".to_string()))
            .await
            .unwrap();
        assert_eq!(panel.kind(), PanelKind::Countries);
        assert_eq!(panel.len(), 2);
    }

    #[tokio::test]
    async fn refresh_swaps_snapshot() {
        let state = state();
        let Json(before) = get_snapshot(State(Arc::clone(&state))).await;
        let Json(after) = refresh(State(Arc::clone(&state))).await.unwrap();
        assert_ne!(before.id, after.id);
        assert_eq!(after.record_count, 2);
        assert_eq!(state.current().await.id(), after.id);
    }

    #[tokio::test]
    async fn unavailable_source_serves_empty_figures() {
        let state = Arc::new(AppState::new(UnavailableDataSource::new("db down")));
        let Json(response) = get_dashboard(State(state)).await;
        assert_eq!(response.snapshot.record_count, 0);
        assert!(response.figures.iter().all(|f| f.empty));
    }
}
