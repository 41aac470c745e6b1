//! Corridor View Builder
//!
//! One parameterized render pipeline replacing four near-duplicate dashboard
//! scripts. A render pass runs top to bottom once per page interaction:
//!
//! 1. Date window: anchor date + fixed 5/7/10-day offset (per variant)
//! 2. Imagery fetch: Sentinel-2 filtered by window and cloud cover
//! 3. Classification join: companion Dynamic World scene by `system:index`,
//!    or a mode-reduced composite over a fixed window (per variant)
//! 4. Layer compositing: per-class masks (trees, cropland), optional
//!    morphological clean-up, optional distance-to-trees overlay
//! 5. Region selection: global view or one of two named study regions
//!
//! All remote-service work goes through `raster_query` plans evaluated by an
//! injected [`raster_query::Evaluator`]; all map output goes through the
//! [`MapHost`] trait. The pipeline itself owns no pixel data and keeps no
//! state between passes.

use thiserror::Error;

pub mod classes;
pub mod demo;
pub mod layers;
pub mod pipeline;
pub mod regions;
pub mod variant;
pub mod window;

pub use classes::{LandCover, DISTANCE_RAMP, DW_PALETTE};
pub use layers::{CenterSpec, ColorBarSpec, LayerData, LayerSpec, MapHost, RecordingHost, VisParams};
pub use pipeline::{render, RenderReport, RenderRequest, RenderWarning};
pub use regions::{BoundaryOverlay, Region, RegionView};
pub use variant::{JoinStrategy, Morphology, VariantConfig};
pub use window::DateWindow;

use raster_query::QueryError;

/// Sentinel-2 surface reflectance catalogue id.
pub const SENTINEL2_DATASET: &str = "COPERNICUS/S2_HARMONIZED";
/// Dynamic World land-cover catalogue id.
pub const DYNAMIC_WORLD_DATASET: &str = "GOOGLE/DYNAMICWORLD/V1";

/// True-color band mapping for the raw imagery layer.
pub const TRUE_COLOR_BANDS: [&str; 3] = ["B4", "B3", "B2"];
/// Fixed intensity scaling for the true-color layer.
pub const TRUE_COLOR_MIN: f64 = 0.0;
pub const TRUE_COLOR_MAX: f64 = 3000.0;

/// Cloud-cover attribute on Sentinel-2 scenes.
pub const CLOUD_ATTR: &str = "CLOUDY_PIXEL_PERCENTAGE";
/// Scenes at or above this cloud percentage are excluded (strict less-than).
pub const CLOUD_CEILING_PCT: f64 = 35.0;

/// Join key shared between Sentinel-2 and Dynamic World products.
pub const SCENE_ID_KEY: &str = "system:index";
/// Categorical land-cover band on Dynamic World images.
pub const LABEL_BAND: &str = "label";

/// Search radius (pixels) for the distance-to-trees transform.
pub const DISTANCE_SEARCH_RADIUS: u32 = 100;
/// Display range for the distance overlay and its color bar.
pub const DISTANCE_RANGE: (f64, f64) = (0.0, 15.0);

#[derive(Error, Debug)]
pub enum RenderError {
    /// Single-scene mode found no Dynamic World scene sharing the imagery's
    /// scene identifier. Surfaced explicitly rather than producing a silent
    /// undefined layer.
    #[error("no companion classification scene for {scene_id}")]
    MissingCompanionData { scene_id: String },
    /// The remote service failed; fatal for the render pass.
    #[error(transparent)]
    Query(#[from] QueryError),
}

pub type Result<T> = std::result::Result<T, RenderError>;
