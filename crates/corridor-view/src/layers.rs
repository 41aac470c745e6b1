//! Map host seam: layer specs, styling, and the recording host.
//!
//! The pipeline never renders anything itself. It hands unevaluated plans
//! plus style specs to a [`MapHost`]; the dashboard's map widget is one
//! implementation, [`RecordingHost`] (used by tests, the CLI, and the
//! gateway JSON response) is another.

use serde::{Deserialize, Serialize};

use crate::classes::{LandCover, DISTANCE_RAMP, DW_PALETTE};
use crate::{DISTANCE_RANGE, TRUE_COLOR_BANDS, TRUE_COLOR_MAX, TRUE_COLOR_MIN};
use raster_query::{CollectionPlan, ImagePlan};

/// Fixed display styling for one layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisParams {
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub bands: Vec<String>,
    pub min: f64,
    pub max: f64,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub palette: Vec<String>,
    /// 0 transparent - 1 opaque.
    pub opacity: f64,
    /// Stroke width for vector outlines; unset for raster layers.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub width: Option<u8>,
}

impl VisParams {
    /// True-color Sentinel-2 styling (B4/B3/B2, 0-3000).
    pub fn true_color() -> Self {
        Self {
            bands: TRUE_COLOR_BANDS.iter().map(|b| b.to_string()).collect(),
            min: TRUE_COLOR_MIN,
            max: TRUE_COLOR_MAX,
            palette: Vec::new(),
            opacity: 1.0,
            width: None,
        }
    }

    /// Categorical styling for the whole classification raster.
    pub fn classification() -> Self {
        Self {
            bands: Vec::new(),
            min: 0.0,
            max: 8.0,
            palette: DW_PALETTE.iter().map(|c| c.to_string()).collect(),
            opacity: 1.0,
            width: None,
        }
    }

    /// Two-color styling for a single-class mask: background plus the
    /// class's palette color, with fixed transparency. Only matching pixels
    /// are present (self-masked), so the background entry never shows.
    pub fn class_mask(class: LandCover) -> Self {
        Self {
            bands: Vec::new(),
            min: 0.0,
            max: 1.0,
            palette: vec!["#000000".to_string(), class.color().to_string()],
            opacity: 0.65,
            width: None,
        }
    }

    /// Six-stop ramp for the distance overlay, fixed 0-15 range.
    pub fn distance() -> Self {
        Self {
            bands: Vec::new(),
            min: DISTANCE_RANGE.0,
            max: DISTANCE_RANGE.1,
            palette: DISTANCE_RAMP.iter().map(|c| c.to_string()).collect(),
            opacity: 0.8,
            width: None,
        }
    }

    /// Outline styling for a vector boundary overlay.
    pub fn outline(color: &str, width: u8) -> Self {
        Self {
            bands: Vec::new(),
            min: 0.0,
            max: 1.0,
            palette: vec![color.to_string()],
            opacity: 1.0,
            width: Some(width),
        }
    }
}

/// What a layer draws: a lazy collection or image plan, or a named remote
/// vector dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LayerData {
    Collection { plan: CollectionPlan },
    Image { plan: ImagePlan },
    FeatureDataset { dataset: String },
}

/// One registered map layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSpec {
    pub name: String,
    pub data: LayerData,
    pub vis: VisParams,
    pub visible: bool,
}

/// Color-bar legend accompanying a ramped layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorBarSpec {
    pub label: String,
    pub palette: Vec<String>,
    pub min: f64,
    pub max: f64,
}

/// Where the map is centered after the render pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CenterSpec {
    Point { lat: f64, lon: f64, zoom: u8 },
    Feature { dataset: String, zoom: u8 },
}

/// The dashboard map widget, reduced to the calls the pipeline makes.
pub trait MapHost {
    fn set_basemap(&mut self, name: &str);
    fn add_layer(&mut self, data: LayerData, vis: VisParams, name: &str, visible: bool);
    fn set_center(&mut self, lat: f64, lon: f64, zoom: u8);
    fn set_center_to_feature(&mut self, dataset: &str, zoom: u8);
    fn add_color_bar(&mut self, spec: ColorBarSpec);
}

/// Host that records everything it is told; serializes as the gateway's
/// render response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordingHost {
    pub basemap: Option<String>,
    pub center: Option<CenterSpec>,
    pub layers: Vec<LayerSpec>,
    pub color_bars: Vec<ColorBarSpec>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn layer(&self, name: &str) -> Option<&LayerSpec> {
        self.layers.iter().find(|l| l.name == name)
    }
}

impl MapHost for RecordingHost {
    fn set_basemap(&mut self, name: &str) {
        self.basemap = Some(name.to_string());
    }

    fn add_layer(&mut self, data: LayerData, vis: VisParams, name: &str, visible: bool) {
        self.layers.push(LayerSpec {
            name: name.to_string(),
            data,
            vis,
            visible,
        });
    }

    fn set_center(&mut self, lat: f64, lon: f64, zoom: u8) {
        self.center = Some(CenterSpec::Point { lat, lon, zoom });
    }

    fn set_center_to_feature(&mut self, dataset: &str, zoom: u8) {
        self.center = Some(CenterSpec::Feature {
            dataset: dataset.to_string(),
            zoom,
        });
    }

    fn add_color_bar(&mut self, spec: ColorBarSpec) {
        self.color_bars.push(spec);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_mask_palette_is_background_plus_class_color() {
        let vis = VisParams::class_mask(LandCover::Trees);
        assert_eq!(vis.palette.len(), 2);
        assert_eq!(vis.palette[1], "#397D49");
        assert!(vis.opacity < 1.0);
    }

    #[test]
    fn outline_carries_the_overlay_stroke_width() {
        let vis = VisParams::outline("#ffcc00", 2);
        assert_eq!(vis.width, Some(2));
        assert_eq!(vis.palette, vec!["#ffcc00".to_string()]);
        assert!(VisParams::true_color().width.is_none());
    }

    #[test]
    fn recording_host_keeps_layer_registration_order() {
        let mut host = RecordingHost::new();
        host.add_layer(
            LayerData::FeatureDataset {
                dataset: "a".into(),
            },
            VisParams::outline("#ffcc00", 2),
            "first",
            true,
        );
        host.add_layer(
            LayerData::FeatureDataset {
                dataset: "b".into(),
            },
            VisParams::outline("#ffcc00", 2),
            "second",
            false,
        );
        assert_eq!(host.layers[0].name, "first");
        assert_eq!(host.layers[1].name, "second");
        assert!(!host.layer("second").unwrap().visible);
    }
}
