//! Region selection.
//!
//! A fixed three-entry menu. Selection is a pure function: the same choice
//! always yields the same center, zoom, explanatory text, and (for the two
//! study regions) static boundary overlay.

use serde::{Deserialize, Serialize};

use raster_query::GeoBounds;

/// The fixed region menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    GlobalView,
    CornwallHedgerows,
    BelgiumFieldBoundaries,
}

/// Static outline style for a boundary overlay.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundaryOverlay {
    /// Named remote vector dataset holding the study-area polygon.
    pub dataset: &'static str,
    pub outline_color: &'static str,
    pub outline_width: u8,
}

/// Everything a region choice determines.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionView {
    pub center_lat: f64,
    pub center_lon: f64,
    pub zoom: u8,
    pub description: &'static str,
    /// Present for the two study regions, absent for the global view.
    pub boundary: Option<BoundaryOverlay>,
    /// Clip extent for region-bound overlays such as the distance field.
    pub bounds: GeoBounds,
}

impl Region {
    pub const ALL: [Region; 3] = [
        Region::GlobalView,
        Region::CornwallHedgerows,
        Region::BelgiumFieldBoundaries,
    ];

    /// Stable id used by the CLI, the gateway API, and the region menu.
    pub fn id(self) -> &'static str {
        match self {
            Region::GlobalView => "global",
            Region::CornwallHedgerows => "cornwall-hedgerows",
            Region::BelgiumFieldBoundaries => "belgium-field-boundaries",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Region::GlobalView => "Global view",
            Region::CornwallHedgerows => "Hedgerows in Cornwall",
            Region::BelgiumFieldBoundaries => "Field boundaries in Belgium",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Region::ALL.into_iter().find(|r| r.id() == id)
    }

    /// The deterministic view for this choice.
    pub fn view(self) -> RegionView {
        match self {
            Region::GlobalView => RegionView {
                center_lat: 20.0,
                center_lon: 0.0,
                zoom: 3,
                description: "Worldwide Sentinel-2 coverage; pick a study region for corridor detail.",
                boundary: None,
                bounds: GeoBounds {
                    min_lon: -180.0,
                    max_lon: 180.0,
                    min_lat: -90.0,
                    max_lat: 90.0,
                },
            },
            Region::CornwallHedgerows => RegionView {
                center_lat: 50.45,
                center_lon: -4.9,
                zoom: 12,
                description: "Hedgerow corridors between Cornish field parcels; tree masks trace the hedge network.",
                boundary: Some(BoundaryOverlay {
                    dataset: "projects/corridor-monitoring/assets/cornwall_hedgerow_aoi",
                    outline_color: "#ffcc00",
                    outline_width: 2,
                }),
                bounds: GeoBounds {
                    min_lon: -5.6,
                    max_lon: -4.2,
                    min_lat: 50.0,
                    max_lat: 50.9,
                },
            },
            Region::BelgiumFieldBoundaries => RegionView {
                center_lat: 50.75,
                center_lon: 4.6,
                zoom: 13,
                description: "Flemish parcel boundaries; cropland masks separate fields from boundary vegetation.",
                boundary: Some(BoundaryOverlay {
                    dataset: "projects/corridor-monitoring/assets/belgium_parcel_aoi",
                    outline_color: "#ffcc00",
                    outline_width: 2,
                }),
                bounds: GeoBounds {
                    min_lon: 4.2,
                    max_lon: 5.0,
                    min_lat: 50.5,
                    max_lat: 51.0,
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_view_is_deterministic() {
        for region in Region::ALL {
            assert_eq!(region.view(), region.view());
        }
    }

    #[test]
    fn study_regions_carry_boundaries_global_does_not() {
        assert!(Region::GlobalView.view().boundary.is_none());
        assert!(Region::CornwallHedgerows.view().boundary.is_some());
        assert!(Region::BelgiumFieldBoundaries.view().boundary.is_some());
    }

    #[test]
    fn ids_round_trip() {
        for region in Region::ALL {
            assert_eq!(Region::from_id(region.id()), Some(region));
        }
        assert_eq!(Region::from_id("atlantis"), None);
    }
}
