//! The render pass: fetch imagery, join classification, composite layers.
//!
//! Runs top to bottom once per interaction. Inputs are explicit immutable
//! parameters; the only outputs are host registrations and the returned
//! report. Data flows strictly forward, with no retry or persistence.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};

use crate::classes::LandCover;
use crate::layers::{ColorBarSpec, LayerData, MapHost, VisParams};
use crate::regions::Region;
use crate::variant::{JoinStrategy, VariantConfig};
use crate::window::DateWindow;
use crate::{
    RenderError, Result, CLOUD_ATTR, CLOUD_CEILING_PCT, DISTANCE_RANGE, DISTANCE_SEARCH_RADIUS,
    DYNAMIC_WORLD_DATASET, LABEL_BAND, SCENE_ID_KEY, SENTINEL2_DATASET,
};
use raster_query::{Collection, Evaluator, Image};

/// User input for one render pass: anchor date, region choice, and the
/// distance-overlay checkbox. No hidden widget state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RenderRequest {
    pub anchor: NaiveDate,
    pub region: Region,
    pub show_distance: bool,
}

/// Non-fatal conditions reported alongside the rendered layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "warning", rename_all = "snake_case")]
pub enum RenderWarning {
    /// The imagery query matched nothing; classification and masks were
    /// skipped and only the (empty) imagery layer was registered.
    EmptyImagery { window: DateWindow },
}

impl fmt::Display for RenderWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderWarning::EmptyImagery { window } => {
                write!(f, "no imagery found for the selected window {window}")
            }
        }
    }
}

/// Summary of one render pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderReport {
    pub variant: String,
    pub window: DateWindow,
    pub region: Region,
    /// Number of Sentinel-2 scenes matching the query.
    pub imagery_count: usize,
    /// Scene id joined on, in single-scene mode.
    pub scene_id: Option<String>,
    pub warnings: Vec<RenderWarning>,
}

/// Run the Corridor View Builder pipeline once.
pub fn render(
    req: &RenderRequest,
    variant: &VariantConfig,
    evaluator: &dyn Evaluator,
    host: &mut dyn MapHost,
) -> Result<RenderReport> {
    host.set_basemap("HYBRID");
    apply_region(req.region, host);

    // 1. Date window.
    let window = DateWindow::from_anchor(req.anchor, variant.window_days);
    debug!(variant = variant.id, %window, "starting render pass");

    // 2. Imagery fetch: date filter, then cloud filter.
    let s2 = Collection::source(SENTINEL2_DATASET)
        .filter_date(window.start_string(), window.end_string())
        .filter_lt(CLOUD_ATTR, CLOUD_CEILING_PCT);

    // The raw true-color layer is registered before the emptiness check;
    // an empty window still gets its (empty) imagery layer.
    host.add_layer(
        LayerData::Collection {
            plan: s2.plan().clone(),
        },
        VisParams::true_color(),
        "Sentinel-2",
        true,
    );

    let imagery_count = evaluator.collection_size(s2.plan())?;
    let mut report = RenderReport {
        variant: variant.id.to_string(),
        window,
        region: req.region,
        imagery_count,
        scene_id: None,
        warnings: Vec::new(),
    };

    if imagery_count == 0 {
        warn!(%window, "no imagery found for the selected window");
        report.warnings.push(RenderWarning::EmptyImagery { window });
        return Ok(report);
    }
    info!(imagery_count, %window, "imagery fetched");

    // 3. Classification join.
    let classification = match &variant.join {
        JoinStrategy::SceneId => {
            let s2_image = s2.first();
            let scene_id = evaluator
                .image_metadata(s2_image.plan(), SCENE_ID_KEY)?
                .ok_or_else(|| RenderError::MissingCompanionData {
                    scene_id: format!("<no {SCENE_ID_KEY}>"),
                })?;
            let dw = Collection::source(DYNAMIC_WORLD_DATASET)
                .filter_eq(SCENE_ID_KEY, scene_id.clone());
            if evaluator.collection_size(dw.plan())? == 0 {
                return Err(RenderError::MissingCompanionData { scene_id });
            }
            debug!(%scene_id, "joined companion classification scene");
            report.scene_id = Some(scene_id);
            dw.first().select(LABEL_BAND)
        }
        JoinStrategy::ModeComposite { window } => {
            // The classification window is a fixed constant, independent of
            // the imagery window and of any scene identifier.
            Collection::source(DYNAMIC_WORLD_DATASET)
                .filter_date(window.start_string(), window.end_string())
                .mode(LABEL_BAND)
        }
    };

    host.add_layer(
        LayerData::Image {
            plan: classification.plan().clone(),
        },
        VisParams::classification(),
        "Classified Image",
        true,
    );

    // 4. Per-class masks.
    add_class_layer(&classification, LandCover::Trees, "Trees", variant, host);
    add_class_layer(&classification, LandCover::Crops, "Cropland", variant, host);

    // Distance overlay works from the un-eroded tree mask.
    if variant.distance_overlay && req.show_distance {
        let distance = classification
            .clone()
            .eq(LandCover::Trees.class_value())
            .distance(DISTANCE_SEARCH_RADIUS)
            .clip(req.region.view().bounds)
            .rename("distance_to_trees");
        host.add_layer(
            LayerData::Image {
                plan: distance.into_plan(),
            },
            VisParams::distance(),
            "Distance to trees",
            true,
        );
        host.add_color_bar(ColorBarSpec {
            label: "Distance to trees (pixels)".to_string(),
            palette: VisParams::distance().palette,
            min: DISTANCE_RANGE.0,
            max: DISTANCE_RANGE.1,
        });
    }

    Ok(report)
}

/// Boolean class mask: eq, optional erosion-then-dilation, self-mask so
/// non-matching pixels are absent rather than false.
fn add_class_layer(
    classification: &Image,
    class: LandCover,
    name: &str,
    variant: &VariantConfig,
    host: &mut dyn MapHost,
) {
    let mut mask = classification.clone().eq(class.class_value());
    if let Some(m) = variant.cleanup {
        mask = mask
            .focal_min(m.kernel_radius, m.iterations)
            .focal_max(m.kernel_radius, m.iterations);
    }
    host.add_layer(
        LayerData::Image {
            plan: mask.self_mask().into_plan(),
        },
        VisParams::class_mask(class),
        name,
        true,
    );
}

/// Recenter the view and overlay the study-area boundary, both pure
/// functions of the region choice.
fn apply_region(region: Region, host: &mut dyn MapHost) {
    let view = region.view();
    match &view.boundary {
        Some(boundary) => {
            host.set_center_to_feature(boundary.dataset, view.zoom);
            host.add_layer(
                LayerData::FeatureDataset {
                    dataset: boundary.dataset.to_string(),
                },
                VisParams::outline(boundary.outline_color, boundary.outline_width),
                region.label(),
                true,
            );
        }
        None => host.set_center(view.center_lat, view.center_lon, view.zoom),
    }
}
