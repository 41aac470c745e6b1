//! Materialized pixel grids.
//!
//! A `GridImage` is what an [`crate::Evaluator`] hands back when a plan is
//! evaluated: one or more named bands over a common row-major grid. `None`
//! marks a masked (absent) pixel, which is how self-masked layers and
//! out-of-range distance pixels come back from the service.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::plan::GeoBounds;

/// One band: row-major pixel values, `None` = masked.
pub type Band = Vec<Option<f64>>;

/// A multi-band raster materialized from an image plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridImage {
    pub width: usize,
    pub height: usize,
    /// Geographic footprint of the grid.
    pub bounds: GeoBounds,
    /// Bands keyed by name, each `width * height` long.
    pub bands: BTreeMap<String, Band>,
}

impl GridImage {
    pub fn new(width: usize, height: usize, bounds: GeoBounds) -> Self {
        Self {
            width,
            height,
            bounds,
            bands: BTreeMap::new(),
        }
    }

    /// Grid with a single band filled from `values` (no masked pixels).
    pub fn single_band(
        name: impl Into<String>,
        width: usize,
        height: usize,
        bounds: GeoBounds,
        values: Vec<f64>,
    ) -> Self {
        let mut img = Self::new(width, height, bounds);
        img.bands
            .insert(name.into(), values.into_iter().map(Some).collect());
        img
    }

    pub fn band(&self, name: &str) -> Option<&Band> {
        self.bands.get(name)
    }

    /// Apply `f` to every pixel of every band.
    pub fn map_pixels(mut self, f: impl Fn(Option<f64>) -> Option<f64>) -> Self {
        for band in self.bands.values_mut() {
            for px in band.iter_mut() {
                *px = f(*px);
            }
        }
        self
    }

    /// Count unmasked pixels in the named band.
    pub fn unmasked_count(&self, band: &str) -> usize {
        self.band(band)
            .map(|b| b.iter().filter(|px| px.is_some()).count())
            .unwrap_or(0)
    }

    /// Lon/lat center of a pixel, used by bbox clipping.
    pub fn pixel_center(&self, row: usize, col: usize) -> (f64, f64) {
        let b = &self.bounds;
        let lon = b.min_lon + (col as f64 + 0.5) / self.width as f64 * (b.max_lon - b.min_lon);
        // Row 0 is the northern edge.
        let lat = b.max_lat - (row as f64 + 0.5) / self.height as f64 * (b.max_lat - b.min_lat);
        (lon, lat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds() -> GeoBounds {
        GeoBounds {
            min_lon: 0.0,
            max_lon: 4.0,
            min_lat: 0.0,
            max_lat: 4.0,
        }
    }

    #[test]
    fn single_band_has_no_masked_pixels() {
        let img = GridImage::single_band("label", 2, 2, bounds(), vec![0.0, 1.0, 1.0, 4.0]);
        assert_eq!(img.unmasked_count("label"), 4);
        assert_eq!(img.band("label").unwrap()[3], Some(4.0));
    }

    #[test]
    fn pixel_center_row_zero_is_north() {
        let img = GridImage::new(4, 4, bounds());
        let (_, lat_top) = img.pixel_center(0, 0);
        let (_, lat_bottom) = img.pixel_center(3, 0);
        assert!(lat_top > lat_bottom);
    }
}
