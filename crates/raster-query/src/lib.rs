//! Lazy Raster Query Plans
//!
//! Client contract for a remote geospatial-analysis service. Operations
//! (filter by date, filter by attribute, select band, reduce, mask, focal
//! morphology, distance transform, clip) compose into an unevaluated
//! expression graph; evaluation is a separate, explicit, blocking call
//! through the [`Evaluator`] trait.
//!
//! Two evaluators ship with the crate:
//! - [`InMemoryEvaluator`]: deterministic fixture-backed evaluator for
//!   tests, demos, and the CLI (no network).
//! - `RemoteEvaluator` (feature `remote-api`): posts serialized plans to
//!   the live analysis backend.
//!
//! # Usage
//!
//! ```rust,ignore
//! let s2 = Collection::source("COPERNICUS/S2_HARMONIZED")
//!     .filter_date("2022-04-01", "2022-04-08")
//!     .filter_lt("CLOUDY_PIXEL_PERCENTAGE", 35.0);
//! let count = evaluator.collection_size(s2.plan())?;
//! ```

use thiserror::Error;

pub mod grid;
pub mod memory;
pub mod plan;

#[cfg(feature = "remote-api")]
pub mod remote;

pub use grid::GridImage;
pub use memory::{InMemoryEvaluator, Scene};
pub use plan::{AttrValue, CmpOp, Collection, CollectionPlan, GeoBounds, Image, ImagePlan, Reducer};

#[cfg(feature = "remote-api")]
pub use remote::{RemoteEvaluator, RemoteEvaluatorConfig};

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("remote service rejected the request: {0}")]
    Remote(String),
    #[cfg(feature = "remote-api")]
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unknown dataset: {0}")]
    UnknownDataset(String),
    #[error("band not found: {0}")]
    BandNotFound(String),
    #[error("collection is empty, cannot take first image")]
    EmptyCollection,
    #[error("plan not evaluable: {0}")]
    InvalidPlan(String),
}

pub type Result<T> = std::result::Result<T, QueryError>;

/// Blocking evaluation seam for query plans.
///
/// Plans are value types; nothing touches the backend until one of these
/// methods runs. A slow or failing call stalls the whole render pass, which
/// is the contract the dashboard host expects (one synchronous pass per
/// interaction, no retry or timeout policy in the core).
pub trait Evaluator: Send + Sync {
    /// Number of images matching a collection plan.
    fn collection_size(&self, plan: &CollectionPlan) -> Result<usize>;

    /// Metadata value for an image plan (e.g. the `system:index` scene id).
    /// `Ok(None)` means the image exists but carries no such key.
    fn image_metadata(&self, plan: &ImagePlan, key: &str) -> Result<Option<String>>;

    /// Materialize an image plan as a pixel grid.
    ///
    /// The map host normally renders plans server-side; materialization is
    /// for tests, the CLI, and gateway preview statistics.
    fn evaluate_image(&self, plan: &ImagePlan) -> Result<GridImage>;
}
