//! Unevaluated expression graphs for collections and images.
//!
//! Builders ([`Collection`], [`Image`]) are cheap value types: every method
//! wraps the previous plan in a new node and returns a new value. Plans
//! serialize to JSON, which is also the wire format the remote evaluator
//! posts to the analysis backend.

use serde::{Deserialize, Serialize};

/// Attribute value in a collection filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Number(f64),
    Text(String),
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        AttrValue::Number(v)
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        AttrValue::Text(v.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        AttrValue::Text(v)
    }
}

/// Comparison operator for attribute filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CmpOp {
    Lt,
    Eq,
    Gt,
}

/// Per-pixel reduction across the images of a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reducer {
    /// Majority vote. Ties resolve to the smallest value; pixels with no
    /// valid observation stay masked.
    Mode,
}

/// Axis-aligned lon/lat bounding box used for clipping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub min_lon: f64,
    pub max_lon: f64,
    pub min_lat: f64,
    pub max_lat: f64,
}

/// Expression graph over an image collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum CollectionPlan {
    Source {
        dataset: String,
    },
    FilterDate {
        input: Box<CollectionPlan>,
        /// Inclusive start, ISO `YYYY-MM-DD`.
        start: String,
        /// Exclusive end, ISO `YYYY-MM-DD`.
        end: String,
    },
    FilterAttr {
        input: Box<CollectionPlan>,
        name: String,
        cmp: CmpOp,
        value: AttrValue,
    },
}

/// Expression graph over a single image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ImagePlan {
    /// First image of a collection in its natural order.
    First { input: Box<CollectionPlan> },
    /// Per-pixel reduction of one band across all images of a collection.
    Reduce {
        input: Box<CollectionPlan>,
        band: String,
        reducer: Reducer,
    },
    Select { input: Box<ImagePlan>, band: String },
    /// Per-pixel equality test; yields 1.0 / 0.0.
    Eq { input: Box<ImagePlan>, value: f64 },
    /// Hide (mask out) all zero-valued pixels, leaving only matches visible.
    SelfMask { input: Box<ImagePlan> },
    /// Morphological erosion: minimum over a square kernel of the given
    /// radius (pixels), applied `iterations` times.
    FocalMin {
        input: Box<ImagePlan>,
        radius: u32,
        iterations: u32,
    },
    /// Morphological dilation, counterpart of `FocalMin`.
    FocalMax {
        input: Box<ImagePlan>,
        radius: u32,
        iterations: u32,
    },
    /// Euclidean distance (pixels) to the nearest non-zero unmasked pixel,
    /// searched within `radius`; pixels with no match in range stay masked.
    Distance { input: Box<ImagePlan>, radius: u32 },
    Clip {
        input: Box<ImagePlan>,
        region: GeoBounds,
    },
    Rename { input: Box<ImagePlan>, band: String },
}

/// Fluent builder over [`CollectionPlan`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection(CollectionPlan);

impl Collection {
    pub fn source(dataset: impl Into<String>) -> Self {
        Collection(CollectionPlan::Source {
            dataset: dataset.into(),
        })
    }

    /// Keep images captured in `[start, end)`.
    pub fn filter_date(self, start: impl Into<String>, end: impl Into<String>) -> Self {
        Collection(CollectionPlan::FilterDate {
            input: Box::new(self.0),
            start: start.into(),
            end: end.into(),
        })
    }

    pub fn filter_lt(self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.filter(name, CmpOp::Lt, value)
    }

    pub fn filter_eq(self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.filter(name, CmpOp::Eq, value)
    }

    pub fn filter(
        self,
        name: impl Into<String>,
        cmp: CmpOp,
        value: impl Into<AttrValue>,
    ) -> Self {
        Collection(CollectionPlan::FilterAttr {
            input: Box::new(self.0),
            name: name.into(),
            cmp,
            value: value.into(),
        })
    }

    pub fn first(self) -> Image {
        Image(ImagePlan::First {
            input: Box::new(self.0),
        })
    }

    /// Per-pixel majority vote of `band` across all matching images.
    pub fn mode(self, band: impl Into<String>) -> Image {
        Image(ImagePlan::Reduce {
            input: Box::new(self.0),
            band: band.into(),
            reducer: Reducer::Mode,
        })
    }

    pub fn plan(&self) -> &CollectionPlan {
        &self.0
    }

    pub fn into_plan(self) -> CollectionPlan {
        self.0
    }
}

/// Fluent builder over [`ImagePlan`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image(ImagePlan);

impl Image {
    pub fn select(self, band: impl Into<String>) -> Self {
        Image(ImagePlan::Select {
            input: Box::new(self.0),
            band: band.into(),
        })
    }

    pub fn eq(self, value: f64) -> Self {
        Image(ImagePlan::Eq {
            input: Box::new(self.0),
            value,
        })
    }

    pub fn self_mask(self) -> Self {
        Image(ImagePlan::SelfMask {
            input: Box::new(self.0),
        })
    }

    pub fn focal_min(self, radius: u32, iterations: u32) -> Self {
        Image(ImagePlan::FocalMin {
            input: Box::new(self.0),
            radius,
            iterations,
        })
    }

    pub fn focal_max(self, radius: u32, iterations: u32) -> Self {
        Image(ImagePlan::FocalMax {
            input: Box::new(self.0),
            radius,
            iterations,
        })
    }

    pub fn distance(self, radius: u32) -> Self {
        Image(ImagePlan::Distance {
            input: Box::new(self.0),
            radius,
        })
    }

    pub fn clip(self, region: GeoBounds) -> Self {
        Image(ImagePlan::Clip {
            input: Box::new(self.0),
            region,
        })
    }

    pub fn rename(self, band: impl Into<String>) -> Self {
        Image(ImagePlan::Rename {
            input: Box::new(self.0),
            band: band.into(),
        })
    }

    pub fn plan(&self) -> &ImagePlan {
        &self.0
    }

    pub fn into_plan(self) -> ImagePlan {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_are_pure_values() {
        let base = Collection::source("COPERNICUS/S2_HARMONIZED");
        let filtered = base.clone().filter_lt("CLOUDY_PIXEL_PERCENTAGE", 35.0);

        // The base plan is untouched by deriving a filtered one.
        assert_eq!(
            base.plan(),
            &CollectionPlan::Source {
                dataset: "COPERNICUS/S2_HARMONIZED".into()
            }
        );
        assert_ne!(base.plan(), filtered.plan());
    }

    #[test]
    fn plan_roundtrips_through_json() {
        let img = Collection::source("GOOGLE/DYNAMICWORLD/V1")
            .filter_date("2022-04-01", "2022-04-08")
            .mode("label")
            .eq(1.0)
            .self_mask();

        let json = serde_json::to_string(img.plan()).unwrap();
        let back: ImagePlan = serde_json::from_str(&json).unwrap();
        assert_eq!(&back, img.plan());
    }

    #[test]
    fn filter_order_is_preserved_in_the_graph() {
        let c = Collection::source("COPERNICUS/S2_HARMONIZED")
            .filter_date("2022-04-01", "2022-04-08")
            .filter_lt("CLOUDY_PIXEL_PERCENTAGE", 35.0);

        // Outermost node is the cloud filter, wrapping the date filter.
        match c.plan() {
            CollectionPlan::FilterAttr { input, name, .. } => {
                assert_eq!(name, "CLOUDY_PIXEL_PERCENTAGE");
                assert!(matches!(**input, CollectionPlan::FilterDate { .. }));
            }
            other => panic!("unexpected outer node: {other:?}"),
        }
    }
}
