//! Deployment variants.
//!
//! The four original dashboard scripts differed only in window length, join
//! strategy, morphology constants, and whether the distance overlay was
//! offered. They collapse into one configuration record selected by id.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::window::DateWindow;

/// How the classification companion is obtained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum JoinStrategy {
    /// Look up the Dynamic World scene sharing the Sentinel-2 scene id.
    /// A missing companion is an explicit error.
    SceneId,
    /// Mode-reduce the `label` band over a fixed window of the
    /// classification collection. Deliberately independent of the imagery
    /// window (two named strategies, not unified; see DESIGN.md).
    ModeComposite { window: DateWindow },
}

/// Fixed morphological clean-up constants (erosion then dilation, same
/// square kernel).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Morphology {
    pub kernel_radius: u32,
    pub iterations: u32,
}

/// One deployment variant of the corridor dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariantConfig {
    pub id: &'static str,
    /// Imagery window length in days (5, 7, or 10).
    pub window_days: u32,
    pub join: JoinStrategy,
    /// Clean-up applied to class masks; `None` renders raw masks.
    pub cleanup: Option<Morphology>,
    /// Whether this deployment offers the distance-to-trees checkbox.
    pub distance_overlay: bool,
}

/// Fixed classification window used by the composite variants.
fn composite_window() -> DateWindow {
    DateWindow {
        start: NaiveDate::from_ymd_opt(2022, 4, 1).expect("valid date"),
        end: NaiveDate::from_ymd_opt(2022, 5, 1).expect("valid date"),
    }
}

impl VariantConfig {
    /// The four deployments, by their dashboard ids.
    pub fn all() -> Vec<VariantConfig> {
        vec![
            VariantConfig {
                id: "scene-5d",
                window_days: 5,
                join: JoinStrategy::SceneId,
                cleanup: None,
                distance_overlay: true,
            },
            VariantConfig {
                id: "scene-7d",
                window_days: 7,
                join: JoinStrategy::SceneId,
                cleanup: Some(Morphology {
                    kernel_radius: 1,
                    iterations: 1,
                }),
                distance_overlay: false,
            },
            VariantConfig {
                id: "composite-7d",
                window_days: 7,
                join: JoinStrategy::ModeComposite {
                    window: composite_window(),
                },
                cleanup: Some(Morphology {
                    kernel_radius: 1,
                    iterations: 1,
                }),
                distance_overlay: false,
            },
            VariantConfig {
                id: "composite-10d",
                window_days: 10,
                join: JoinStrategy::ModeComposite {
                    window: composite_window(),
                },
                cleanup: Some(Morphology {
                    kernel_radius: 1,
                    iterations: 2,
                }),
                distance_overlay: true,
            },
        ]
    }

    pub fn by_id(id: &str) -> Option<VariantConfig> {
        Self::all().into_iter().find(|v| v.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variant_ids_are_unique_and_resolvable() {
        let all = VariantConfig::all();
        for v in &all {
            assert_eq!(VariantConfig::by_id(v.id).as_ref(), Some(v));
        }
        let mut ids: Vec<_> = all.iter().map(|v| v.id).collect();
        ids.dedup();
        assert_eq!(ids.len(), all.len());
    }

    #[test]
    fn window_lengths_match_the_deployments() {
        let lengths: Vec<u32> = VariantConfig::all().iter().map(|v| v.window_days).collect();
        assert_eq!(lengths, vec![5, 7, 7, 10]);
    }

    #[test]
    fn composite_window_does_not_depend_on_the_imagery_window() {
        let v = VariantConfig::by_id("composite-7d").unwrap();
        match v.join {
            JoinStrategy::ModeComposite { window } => {
                assert_eq!(window.start_string(), "2022-04-01");
                assert_eq!(window.end_string(), "2022-05-01");
            }
            JoinStrategy::SceneId => panic!("composite variant must not join by scene id"),
        }
    }
}
