//! Dynamic World land-cover classes and fixed display palettes.

use serde::{Deserialize, Serialize};

/// The nine Dynamic World classes, categorical values 0-8 of the `label`
/// band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LandCover {
    Water = 0,
    Trees = 1,
    Grass = 2,
    FloodedVegetation = 3,
    Crops = 4,
    ShrubAndScrub = 5,
    Built = 6,
    Bare = 7,
    SnowAndIce = 8,
}

/// Fixed 9-entry palette for the classification layer, indexed by class id.
pub const DW_PALETTE: [&str; 9] = [
    "#419BDF", "#397D49", "#88B053", "#7A87C6", "#E49635", "#DFC35A", "#C4281B", "#A59B8F",
    "#B39FE1",
];

/// Six-stop ramp for the distance-to-trees overlay (near to far).
pub const DISTANCE_RAMP: [&str; 6] = [
    "#ffffcc", "#c7e9b4", "#7fcdbb", "#41b6c4", "#2c7fb8", "#253494",
];

impl LandCover {
    pub const ALL: [LandCover; 9] = [
        LandCover::Water,
        LandCover::Trees,
        LandCover::Grass,
        LandCover::FloodedVegetation,
        LandCover::Crops,
        LandCover::ShrubAndScrub,
        LandCover::Built,
        LandCover::Bare,
        LandCover::SnowAndIce,
    ];

    /// Categorical value of this class in the `label` band.
    pub fn class_id(self) -> u8 {
        self as u8
    }

    pub fn class_value(self) -> f64 {
        f64::from(self as u8)
    }

    pub fn name(self) -> &'static str {
        match self {
            LandCover::Water => "water",
            LandCover::Trees => "trees",
            LandCover::Grass => "grass",
            LandCover::FloodedVegetation => "flooded_vegetation",
            LandCover::Crops => "crops",
            LandCover::ShrubAndScrub => "shrub_and_scrub",
            LandCover::Built => "built",
            LandCover::Bare => "bare",
            LandCover::SnowAndIce => "snow_and_ice",
        }
    }

    /// Display color, shared with the classification palette.
    pub fn color(self) -> &'static str {
        DW_PALETTE[self as usize]
    }
}
