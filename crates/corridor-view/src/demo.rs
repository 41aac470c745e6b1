//! Deterministic demo catalogue.
//!
//! Seeds an [`InMemoryEvaluator`] with synthetic Sentinel-2 and Dynamic
//! World scenes around a reference date, so the CLI and the gateway can run
//! full render passes without the live backend. Grids are small (16x16 over
//! the Cornwall study area) but exercise every pipeline operation: cloud
//! filtering, scene-id joins, the composite window, masks, and distance.

use chrono::{Duration, NaiveDate};

use crate::{CLOUD_ATTR, DYNAMIC_WORLD_DATASET, LABEL_BAND, SENTINEL2_DATASET};
use raster_query::{GeoBounds, GridImage, InMemoryEvaluator, Scene};

const GRID: usize = 16;

fn demo_bounds() -> GeoBounds {
    // Cornwall study area; the named regions clip against this footprint.
    GeoBounds {
        min_lon: -5.6,
        max_lon: -4.2,
        min_lat: 50.0,
        max_lat: 50.9,
    }
}

fn scene_id(date: NaiveDate, tile: &str) -> String {
    format!("{}T110621_{tile}", date.format("%Y%m%d"))
}

/// Synthetic surface reflectance: brighter towards the south-east so the
/// true-color layer is visibly non-uniform.
fn s2_image() -> GridImage {
    let mut img = GridImage::new(GRID, GRID, demo_bounds());
    for band in ["B4", "B3", "B2"] {
        let values = (0..GRID * GRID)
            .map(|i| {
                let (row, col) = (i / GRID, i % GRID);
                Some(600.0 + (row + col) as f64 * 60.0)
            })
            .collect();
        img.bands.insert(band.to_string(), values);
    }
    img
}

/// Synthetic land cover: a vertical hedgerow of trees through cropland,
/// water in the north-west corner, grass elsewhere.
fn dw_image(hedge_col: usize) -> GridImage {
    let labels: Vec<f64> = (0..GRID * GRID)
        .map(|i| {
            let (row, col) = (i / GRID, i % GRID);
            if row < 3 && col < 3 {
                0.0 // water
            } else if col == hedge_col || col == hedge_col + 1 {
                1.0 // trees
            } else if col > hedge_col {
                4.0 // crops
            } else {
                2.0 // grass
            }
        })
        .collect();
    GridImage::single_band(LABEL_BAND, GRID, GRID, demo_bounds(), labels)
}

/// Build the demo catalogue around `reference` (normally "today").
///
/// The dashboard's default window runs forward from the anchor, so the
/// scenes sit one and three days after `reference`: one clear and one
/// too-cloudy Sentinel-2 capture, matching Dynamic World companions, and
/// extra classification scenes inside the fixed composite window
/// (April 2022).
pub fn demo_evaluator(reference: NaiveDate) -> InMemoryEvaluator {
    let first_pass = reference + Duration::days(1);
    let second_pass = reference + Duration::days(3);

    let s2_scenes = vec![
        Scene::new(scene_id(first_pass, "T30UVA"), first_pass, s2_image())
            .with_property(CLOUD_ATTR, 18.0),
        Scene::new(scene_id(second_pass, "T30UVA"), second_pass, s2_image()).with_property(CLOUD_ATTR, 27.0),
        // Excluded by the 35% ceiling; present so the cloud filter matters.
        Scene::new(scene_id(first_pass, "T30UVB"), first_pass, s2_image())
            .with_property(CLOUD_ATTR, 82.0),
    ];

    let mut dw_scenes = vec![
        Scene::new(scene_id(first_pass, "T30UVA"), first_pass, dw_image(7)),
        Scene::new(scene_id(second_pass, "T30UVA"), second_pass, dw_image(7)),
    ];
    // Composite-window scenes: the hedgerow drifts by a column so the mode
    // reducer has disagreement to resolve.
    for (day, col) in [(2, 7), (12, 7), (22, 8)] {
        let captured = NaiveDate::from_ymd_opt(2022, 4, day).expect("valid date");
        dw_scenes.push(Scene::new(
            scene_id(captured, "T30UVA"),
            captured,
            dw_image(col),
        ));
    }

    InMemoryEvaluator::new()
        .with_dataset(SENTINEL2_DATASET, s2_scenes)
        .with_dataset(DYNAMIC_WORLD_DATASET, dw_scenes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::RecordingHost;
    use crate::pipeline::{render, RenderRequest};
    use crate::regions::Region;
    use crate::variant::VariantConfig;

    #[test]
    fn every_variant_renders_against_the_demo_catalogue() {
        let reference = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        let eval = demo_evaluator(reference);
        let req = RenderRequest {
            anchor: reference,
            region: Region::CornwallHedgerows,
            show_distance: true,
        };

        for variant in VariantConfig::all() {
            let mut host = RecordingHost::new();
            let report = render(&req, &variant, &eval, &mut host)
                .unwrap_or_else(|e| panic!("variant {} failed: {e}", variant.id));
            assert!(report.imagery_count > 0, "variant {} saw no imagery", variant.id);
            assert!(host.layer("Trees").is_some());
        }
    }
}
