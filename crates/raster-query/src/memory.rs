//! Fixture-backed evaluator.
//!
//! Holds whole datasets in memory as [`Scene`] records and interprets query
//! plans against them. This is the evaluator the tests, the CLI, and the
//! demo gateway run against; it implements the same per-pixel semantics the
//! live backend advertises (mode reduce, focal morphology, neighborhood-
//! limited distance) on small grids.

use chrono::NaiveDate;
use std::collections::HashMap;

use crate::grid::{Band, GridImage};
use crate::plan::{AttrValue, CmpOp, CollectionPlan, ImagePlan, Reducer};
use crate::{Evaluator, QueryError, Result};

/// One catalogued satellite product: scene id, capture date, numeric
/// metadata, and its pixel grid.
#[derive(Debug, Clone)]
pub struct Scene {
    /// The `system:index` join key.
    pub scene_id: String,
    pub captured: NaiveDate,
    pub properties: HashMap<String, f64>,
    pub image: GridImage,
}

impl Scene {
    pub fn new(scene_id: impl Into<String>, captured: NaiveDate, image: GridImage) -> Self {
        Self {
            scene_id: scene_id.into(),
            captured,
            properties: HashMap::new(),
            image,
        }
    }

    pub fn with_property(mut self, name: impl Into<String>, value: f64) -> Self {
        self.properties.insert(name.into(), value);
        self
    }
}

/// In-memory [`Evaluator`] over named datasets.
#[derive(Debug, Default)]
pub struct InMemoryEvaluator {
    datasets: HashMap<String, Vec<Scene>>,
}

impl InMemoryEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a dataset under its catalogue id. Scene order is the
    /// collection's natural order (what `first()` sees).
    pub fn with_dataset(mut self, dataset: impl Into<String>, scenes: Vec<Scene>) -> Self {
        self.datasets.insert(dataset.into(), scenes);
        self
    }

    fn resolve_collection(&self, plan: &CollectionPlan) -> Result<Vec<&Scene>> {
        match plan {
            CollectionPlan::Source { dataset } => self
                .datasets
                .get(dataset)
                .map(|scenes| scenes.iter().collect())
                .ok_or_else(|| QueryError::UnknownDataset(dataset.clone())),
            CollectionPlan::FilterDate { input, start, end } => {
                let start = parse_date(start)?;
                let end = parse_date(end)?;
                Ok(self
                    .resolve_collection(input)?
                    .into_iter()
                    .filter(|s| s.captured >= start && s.captured < end)
                    .collect())
            }
            CollectionPlan::FilterAttr {
                input,
                name,
                cmp,
                value,
            } => {
                let scenes = self.resolve_collection(input)?;
                Ok(scenes
                    .into_iter()
                    .filter(|s| attr_matches(s, name, *cmp, value))
                    .collect())
            }
        }
    }

    fn resolve_image(&self, plan: &ImagePlan) -> Result<GridImage> {
        match plan {
            ImagePlan::First { input } => {
                let scenes = self.resolve_collection(input)?;
                scenes
                    .first()
                    .map(|s| s.image.clone())
                    .ok_or(QueryError::EmptyCollection)
            }
            ImagePlan::Reduce {
                input,
                band,
                reducer: Reducer::Mode,
            } => {
                let scenes = self.resolve_collection(input)?;
                mode_reduce(&scenes, band)
            }
            ImagePlan::Select { input, band } => {
                let img = self.resolve_image(input)?;
                let values = img
                    .band(band)
                    .cloned()
                    .ok_or_else(|| QueryError::BandNotFound(band.clone()))?;
                let mut out = GridImage::new(img.width, img.height, img.bounds);
                out.bands.insert(band.clone(), values);
                Ok(out)
            }
            ImagePlan::Eq { input, value } => Ok(self
                .resolve_image(input)?
                .map_pixels(|px| px.map(|v| if v == *value { 1.0 } else { 0.0 }))),
            ImagePlan::SelfMask { input } => Ok(self
                .resolve_image(input)?
                .map_pixels(|px| px.filter(|v| *v != 0.0))),
            ImagePlan::FocalMin {
                input,
                radius,
                iterations,
            } => Ok(focal(self.resolve_image(input)?, *radius, *iterations, f64::min)),
            ImagePlan::FocalMax {
                input,
                radius,
                iterations,
            } => Ok(focal(self.resolve_image(input)?, *radius, *iterations, f64::max)),
            ImagePlan::Distance { input, radius } => {
                Ok(distance_transform(self.resolve_image(input)?, *radius))
            }
            ImagePlan::Clip { input, region } => {
                let mut img = self.resolve_image(input)?;
                let region = *region;
                let (width, height) = (img.width, img.height);
                let centers: Vec<(f64, f64)> = (0..height)
                    .flat_map(|r| (0..width).map(move |c| (r, c)))
                    .map(|(r, c)| img.pixel_center(r, c))
                    .collect();
                for band in img.bands.values_mut() {
                    for (i, px) in band.iter_mut().enumerate() {
                        let (lon, lat) = centers[i];
                        let inside = lon >= region.min_lon
                            && lon <= region.max_lon
                            && lat >= region.min_lat
                            && lat <= region.max_lat;
                        if !inside {
                            *px = None;
                        }
                    }
                }
                Ok(img)
            }
            ImagePlan::Rename { input, band } => {
                let img = self.resolve_image(input)?;
                if img.bands.len() != 1 {
                    return Err(QueryError::InvalidPlan(format!(
                        "rename expects a single-band image, got {} bands",
                        img.bands.len()
                    )));
                }
                let values = img.bands.into_values().next().unwrap();
                let mut out = GridImage::new(img.width, img.height, img.bounds);
                out.bands.insert(band.clone(), values);
                Ok(out)
            }
        }
    }

    /// Scene metadata survives band math; walk down to the source image.
    fn resolve_scene(&self, plan: &ImagePlan) -> Result<Option<&Scene>> {
        match plan {
            ImagePlan::First { input } => Ok(self.resolve_collection(input)?.into_iter().next()),
            // A reduced composite has no single source scene.
            ImagePlan::Reduce { .. } => Ok(None),
            ImagePlan::Select { input, .. }
            | ImagePlan::Eq { input, .. }
            | ImagePlan::SelfMask { input }
            | ImagePlan::FocalMin { input, .. }
            | ImagePlan::FocalMax { input, .. }
            | ImagePlan::Distance { input, .. }
            | ImagePlan::Clip { input, .. }
            | ImagePlan::Rename { input, .. } => self.resolve_scene(input),
        }
    }
}

impl Evaluator for InMemoryEvaluator {
    fn collection_size(&self, plan: &CollectionPlan) -> Result<usize> {
        let size = self.resolve_collection(plan)?.len();
        tracing::debug!(size, "resolved collection plan");
        Ok(size)
    }

    fn image_metadata(&self, plan: &ImagePlan, key: &str) -> Result<Option<String>> {
        let Some(scene) = self.resolve_scene(plan)? else {
            return Ok(None);
        };
        if key == "system:index" {
            return Ok(Some(scene.scene_id.clone()));
        }
        Ok(scene.properties.get(key).map(|v| v.to_string()))
    }

    fn evaluate_image(&self, plan: &ImagePlan) -> Result<GridImage> {
        self.resolve_image(plan)
    }
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| QueryError::InvalidPlan(format!("bad date {s:?}: {e}")))
}

fn attr_matches(scene: &Scene, name: &str, cmp: CmpOp, value: &AttrValue) -> bool {
    match value {
        AttrValue::Text(wanted) => {
            // Only the scene id is queryable as text.
            name == "system:index" && cmp == CmpOp::Eq && scene.scene_id == *wanted
        }
        AttrValue::Number(wanted) => {
            let Some(actual) = scene.properties.get(name) else {
                return false;
            };
            match cmp {
                CmpOp::Lt => actual < wanted,
                CmpOp::Eq => actual == wanted,
                CmpOp::Gt => actual > wanted,
            }
        }
    }
}

/// Per-pixel majority vote of `band` across the scenes. Ties resolve to the
/// smallest value; pixels with no valid observation stay masked.
fn mode_reduce(scenes: &[&Scene], band: &str) -> Result<GridImage> {
    let first = scenes.first().ok_or(QueryError::EmptyCollection)?;
    let (width, height, bounds) = (first.image.width, first.image.height, first.image.bounds);

    let mut stacks: Vec<&Band> = Vec::with_capacity(scenes.len());
    for scene in scenes {
        if scene.image.width != width || scene.image.height != height {
            return Err(QueryError::InvalidPlan(
                "mode reduce over mixed grid shapes".into(),
            ));
        }
        stacks.push(
            scene
                .image
                .band(band)
                .ok_or_else(|| QueryError::BandNotFound(band.to_string()))?,
        );
    }

    let mut out: Band = vec![None; width * height];
    let mut votes: HashMap<i64, usize> = HashMap::new();
    for (i, px) in out.iter_mut().enumerate() {
        votes.clear();
        for stack in &stacks {
            if let Some(v) = stack[i] {
                // Categorical bands carry integer class ids.
                *votes.entry(v.round() as i64).or_insert(0) += 1;
            }
        }
        *px = votes
            .iter()
            .max_by_key(|(class, count)| (**count, std::cmp::Reverse(**class)))
            .map(|(class, _)| *class as f64);
    }

    let mut img = GridImage::new(width, height, bounds);
    img.bands.insert(band.to_string(), out);
    Ok(img)
}

/// One focal pass combines each pixel with its square neighborhood of the
/// given radius; masked neighbors are skipped, fully-masked windows stay
/// masked. Applied `iterations` times per band.
fn focal(mut img: GridImage, radius: u32, iterations: u32, combine: fn(f64, f64) -> f64) -> GridImage {
    let (width, height) = (img.width, img.height);
    let r = radius as isize;
    for band in img.bands.values_mut() {
        for _ in 0..iterations {
            let prev = band.clone();
            for row in 0..height as isize {
                for col in 0..width as isize {
                    let mut acc: Option<f64> = None;
                    for dr in -r..=r {
                        for dc in -r..=r {
                            let (nr, nc) = (row + dr, col + dc);
                            if nr < 0 || nc < 0 || nr >= height as isize || nc >= width as isize {
                                continue;
                            }
                            if let Some(v) = prev[nr as usize * width + nc as usize] {
                                acc = Some(acc.map_or(v, |a| combine(a, v)));
                            }
                        }
                    }
                    band[row as usize * width + col as usize] = acc;
                }
            }
        }
    }
    img
}

/// Euclidean distance (pixels) to the nearest non-zero unmasked pixel,
/// searched within `radius`. Source pixels get 0; pixels with no source in
/// range stay masked.
fn distance_transform(img: GridImage, radius: u32) -> GridImage {
    let (width, height, bounds) = (img.width, img.height, img.bounds);
    let r = radius as isize;
    let mut out = GridImage::new(width, height, bounds);

    for (name, band) in &img.bands {
        let truthy: Vec<bool> = band.iter().map(|px| matches!(px, Some(v) if *v != 0.0)).collect();
        let mut dist: Band = vec![None; width * height];
        for row in 0..height as isize {
            for col in 0..width as isize {
                let mut best: Option<f64> = None;
                for dr in -r..=r {
                    for dc in -r..=r {
                        let (nr, nc) = (row + dr, col + dc);
                        if nr < 0 || nc < 0 || nr >= height as isize || nc >= width as isize {
                            continue;
                        }
                        if !truthy[nr as usize * width + nc as usize] {
                            continue;
                        }
                        let d = ((dr * dr + dc * dc) as f64).sqrt();
                        if d <= radius as f64 && best.map_or(true, |b| d < b) {
                            best = Some(d);
                        }
                    }
                }
                dist[row as usize * width + col as usize] = best;
            }
        }
        out.bands.insert(name.clone(), dist);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{Collection, GeoBounds};
    use proptest::prelude::*;

    fn bounds() -> GeoBounds {
        GeoBounds {
            min_lon: 0.0,
            max_lon: 6.0,
            min_lat: 0.0,
            max_lat: 1.0,
        }
    }

    fn label_scene(id: &str, date: &str, values: Vec<f64>) -> Scene {
        let width = values.len();
        Scene::new(
            id,
            NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            GridImage::single_band("label", width, 1, bounds(), values),
        )
    }

    fn fixture() -> InMemoryEvaluator {
        InMemoryEvaluator::new().with_dataset(
            "GOOGLE/DYNAMICWORLD/V1",
            vec![label_scene("20220401T110621", "2022-04-01", vec![0.0, 1.0, 1.0, 4.0, 4.0, 4.0])],
        )
    }

    #[test]
    fn class_masks_select_only_matching_pixels() {
        let eval = fixture();
        let dw = Collection::source("GOOGLE/DYNAMICWORLD/V1").first().select("label");

        let trees = eval
            .evaluate_image(dw.clone().eq(1.0).self_mask().plan())
            .unwrap();
        let crops = eval.evaluate_image(dw.eq(4.0).self_mask().plan()).unwrap();

        let mask = |img: &GridImage| -> Vec<bool> {
            img.band("label").unwrap().iter().map(|px| px.is_some()).collect()
        };
        assert_eq!(mask(&trees), vec![false, true, true, false, false, false]);
        assert_eq!(mask(&crops), vec![false, false, false, true, true, true]);
    }

    #[test]
    fn first_on_empty_collection_is_an_error() {
        let eval = fixture();
        let plan = Collection::source("GOOGLE/DYNAMICWORLD/V1")
            .filter_date("1999-01-01", "1999-01-02")
            .first();
        assert!(matches!(
            eval.evaluate_image(plan.plan()),
            Err(QueryError::EmptyCollection)
        ));
    }

    #[test]
    fn scene_id_filter_joins_companion_scene() {
        let eval = fixture();
        let size = eval
            .collection_size(
                Collection::source("GOOGLE/DYNAMICWORLD/V1")
                    .filter_eq("system:index", "20220401T110621")
                    .plan(),
            )
            .unwrap();
        assert_eq!(size, 1);

        let miss = eval
            .collection_size(
                Collection::source("GOOGLE/DYNAMICWORLD/V1")
                    .filter_eq("system:index", "20990101T000000")
                    .plan(),
            )
            .unwrap();
        assert_eq!(miss, 0);
    }

    #[test]
    fn mode_reduce_takes_per_pixel_majority() {
        let eval = InMemoryEvaluator::new().with_dataset(
            "GOOGLE/DYNAMICWORLD/V1",
            vec![
                label_scene("a", "2022-04-01", vec![1.0, 4.0, 1.0, 1.0, 4.0, 4.0]),
                label_scene("b", "2022-04-02", vec![1.0, 4.0, 4.0, 1.0, 4.0, 1.0]),
                label_scene("c", "2022-04-03", vec![1.0, 1.0, 4.0, 1.0, 4.0, 4.0]),
            ],
        );
        let composite = eval
            .evaluate_image(Collection::source("GOOGLE/DYNAMICWORLD/V1").mode("label").plan())
            .unwrap();
        let values: Vec<f64> = composite.band("label").unwrap().iter().map(|px| px.unwrap()).collect();
        assert_eq!(values, vec![1.0, 4.0, 4.0, 1.0, 4.0, 4.0]);
    }

    #[test]
    fn mode_reduce_tie_resolves_to_smallest_class() {
        let eval = InMemoryEvaluator::new().with_dataset(
            "GOOGLE/DYNAMICWORLD/V1",
            vec![
                label_scene("a", "2022-04-01", vec![6.0]),
                label_scene("b", "2022-04-02", vec![2.0]),
            ],
        );
        let composite = eval
            .evaluate_image(Collection::source("GOOGLE/DYNAMICWORLD/V1").mode("label").plan())
            .unwrap();
        assert_eq!(composite.band("label").unwrap()[0], Some(2.0));
    }

    #[test]
    fn distance_is_zero_on_sources_and_masked_out_of_range() {
        // 8x1 strip with a single tree pixel at col 0.
        let tree_mask = GridImage::single_band(
            "label",
            8,
            1,
            bounds(),
            vec![1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        );
        let eval = InMemoryEvaluator::new().with_dataset(
            "GOOGLE/DYNAMICWORLD/V1",
            vec![Scene::new(
                "a",
                NaiveDate::from_ymd_opt(2022, 4, 1).unwrap(),
                tree_mask,
            )],
        );
        let plan = Collection::source("GOOGLE/DYNAMICWORLD/V1")
            .first()
            .distance(3)
            .rename("trees_distance");
        let d = eval.evaluate_image(plan.plan()).unwrap();
        let band = d.band("trees_distance").unwrap();
        assert_eq!(band[0], Some(0.0));
        assert_eq!(band[3], Some(3.0));
        assert_eq!(band[4], None); // beyond the search radius
    }

    #[test]
    fn clip_masks_pixels_outside_the_region() {
        let eval = fixture();
        let half = GeoBounds {
            min_lon: 0.0,
            max_lon: 3.0,
            min_lat: 0.0,
            max_lat: 1.0,
        };
        let img = eval
            .evaluate_image(
                Collection::source("GOOGLE/DYNAMICWORLD/V1")
                    .first()
                    .clip(half)
                    .plan(),
            )
            .unwrap();
        assert_eq!(img.unmasked_count("label"), 3);
    }

    proptest! {
        /// Erosion then dilation with the same kernel never reaches outside
        /// the envelope of dilating the original mask once.
        #[test]
        fn erode_dilate_stays_inside_dilation_envelope(
            mask in proptest::collection::vec(any::<bool>(), 36),
            radius in 1u32..3,
        ) {
            let values: Vec<f64> = mask.iter().map(|&b| if b { 1.0 } else { 0.0 }).collect();
            let img = GridImage::single_band("label", 6, 6, GeoBounds {
                min_lon: 0.0, max_lon: 6.0, min_lat: 0.0, max_lat: 6.0,
            }, values);
            let eval = InMemoryEvaluator::new().with_dataset(
                "d",
                vec![Scene::new("s", NaiveDate::from_ymd_opt(2022, 4, 1).unwrap(), img)],
            );
            let base = Collection::source("d").first();

            let cleaned = eval
                .evaluate_image(base.clone().focal_min(radius, 1).focal_max(radius, 1).plan())
                .unwrap();
            let envelope = eval
                .evaluate_image(base.focal_max(radius, 1).plan())
                .unwrap();

            let cleaned = cleaned.band("label").unwrap();
            let envelope = envelope.band("label").unwrap();
            for (c, e) in cleaned.iter().zip(envelope.iter()) {
                if c.unwrap_or(0.0) != 0.0 {
                    prop_assert!(e.unwrap_or(0.0) != 0.0);
                }
            }
        }
    }
}
