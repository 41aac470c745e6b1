//! Render API routes.
//!
//! One POST runs one full render pass (the dashboard re-renders top to
//! bottom per interaction); the GET endpoints feed the dashboard's fixed
//! menus. The pass itself is blocking by contract, so it runs on a blocking
//! task.

use axum::{extract::State, Json};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::AppError;
use crate::AppState;
use corridor_view::{
    render, RecordingHost, Region, RenderReport, RenderRequest, VariantConfig,
};

/// Render request from the dashboard.
#[derive(Debug, Clone, Deserialize)]
pub struct RenderApiRequest {
    /// Anchor date (YYYY-MM-DD); today when omitted.
    pub anchor: Option<NaiveDate>,
    /// Deployment variant id; the first deployment when omitted.
    pub variant: Option<String>,
    /// Region menu choice id.
    #[serde(default = "default_region")]
    pub region: String,
    /// Distance-to-trees checkbox.
    #[serde(default)]
    pub show_distance: bool,
}

fn default_region() -> String {
    "global".to_string()
}

/// Everything the map needs to draw one pass.
#[derive(Debug, Clone, Serialize)]
pub struct RenderResponse {
    pub report: RenderReport,
    pub map: RecordingHost,
}

#[derive(Serialize)]
pub struct RegionInfo {
    pub id: &'static str,
    pub label: &'static str,
    pub description: &'static str,
    pub zoom: u8,
}

#[derive(Serialize)]
pub struct VariantInfo {
    pub id: &'static str,
    pub window_days: u32,
    pub join: &'static str,
    pub distance_overlay: bool,
}

pub async fn run_render(
    State(state): State<AppState>,
    Json(req): Json<RenderApiRequest>,
) -> Result<Json<RenderResponse>, AppError> {
    let variant_id = req.variant.as_deref().unwrap_or("scene-5d");
    let variant = VariantConfig::by_id(variant_id)
        .ok_or_else(|| AppError::BadRequest(format!("unknown variant {variant_id:?}")))?;
    let region = Region::from_id(&req.region)
        .ok_or_else(|| AppError::BadRequest(format!("unknown region {:?}", req.region)))?;

    let request = RenderRequest {
        anchor: req.anchor.unwrap_or_else(|| Utc::now().date_naive()),
        region,
        show_distance: req.show_distance,
    };

    let evaluator = state.evaluator.clone();
    let (report, host) = tokio::task::spawn_blocking(move || {
        let mut host = RecordingHost::new();
        render(&request, &variant, evaluator.as_ref(), &mut host).map(|report| (report, host))
    })
    .await
    .map_err(|e| AppError::Internal(format!("render task failed: {e}")))??;

    info!(
        variant = %report.variant,
        imagery_count = report.imagery_count,
        warnings = report.warnings.len(),
        "render pass served"
    );
    Ok(Json(RenderResponse { report, map: host }))
}

pub async fn list_regions() -> Json<Vec<RegionInfo>> {
    let regions = Region::ALL
        .into_iter()
        .map(|r| {
            let view = r.view();
            RegionInfo {
                id: r.id(),
                label: r.label(),
                description: view.description,
                zoom: view.zoom,
            }
        })
        .collect();
    Json(regions)
}

pub async fn list_variants() -> Json<Vec<VariantInfo>> {
    let variants = VariantConfig::all()
        .into_iter()
        .map(|v| VariantInfo {
            id: v.id,
            window_days: v.window_days,
            join: match v.join {
                corridor_view::JoinStrategy::SceneId => "scene_id",
                corridor_view::JoinStrategy::ModeComposite { .. } => "mode_composite",
            },
            distance_overlay: v.distance_overlay,
        })
        .collect();
    Json(variants)
}
