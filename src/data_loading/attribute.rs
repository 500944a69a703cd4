use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// How a column's values are to be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKind {
    Continuous,
    /// Ordered category codes (height, glazing area).
    Ordinal,
    /// Unordered, opaque category codes (orientation, glazing distribution).
    Nominal,
    /// Candidate regression target.
    Target,
}

impl AttributeKind {
    pub fn is_categorical(self) -> bool {
        matches!(self, AttributeKind::Ordinal | AttributeKind::Nominal)
    }
}

/// The ten columns of the building dataset, in file order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    RelativeCompactness,
    SurfaceArea,
    WallArea,
    RoofArea,
    OverallHeight,
    Orientation,
    GlazingArea,
    GlazingDistribution,
    HeatingLoad,
    CoolingLoad,
}

impl Attribute {
    pub const COUNT: usize = 10;

    /// All columns in file order.
    pub const ALL: [Attribute; Attribute::COUNT] = [
        Attribute::RelativeCompactness,
        Attribute::SurfaceArea,
        Attribute::WallArea,
        Attribute::RoofArea,
        Attribute::OverallHeight,
        Attribute::Orientation,
        Attribute::GlazingArea,
        Attribute::GlazingDistribution,
        Attribute::HeatingLoad,
        Attribute::CoolingLoad,
    ];

    /// The eight physical building properties.
    pub const PREDICTORS: [Attribute; 8] = [
        Attribute::RelativeCompactness,
        Attribute::SurfaceArea,
        Attribute::WallArea,
        Attribute::RoofArea,
        Attribute::OverallHeight,
        Attribute::Orientation,
        Attribute::GlazingArea,
        Attribute::GlazingDistribution,
    ];

    /// Position in the cleaned record.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Short code used in reports, specs and on the command line.
    pub fn code(self) -> &'static str {
        match self {
            Attribute::RelativeCompactness => "rc",
            Attribute::SurfaceArea => "sa",
            Attribute::WallArea => "wa",
            Attribute::RoofArea => "ra",
            Attribute::OverallHeight => "oh",
            Attribute::Orientation => "orient",
            Attribute::GlazingArea => "ga",
            Attribute::GlazingDistribution => "gad",
            Attribute::HeatingLoad => "hl",
            Attribute::CoolingLoad => "cl",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Attribute::RelativeCompactness => "relative compactness",
            Attribute::SurfaceArea => "surface area",
            Attribute::WallArea => "wall area",
            Attribute::RoofArea => "roof area",
            Attribute::OverallHeight => "overall height",
            Attribute::Orientation => "orientation",
            Attribute::GlazingArea => "glazing area",
            Attribute::GlazingDistribution => "glazing area distribution",
            Attribute::HeatingLoad => "heating load",
            Attribute::CoolingLoad => "cooling load",
        }
    }

    pub fn kind(self) -> AttributeKind {
        match self {
            Attribute::RelativeCompactness
            | Attribute::SurfaceArea
            | Attribute::WallArea
            | Attribute::RoofArea => AttributeKind::Continuous,
            Attribute::OverallHeight | Attribute::GlazingArea => AttributeKind::Ordinal,
            Attribute::Orientation | Attribute::GlazingDistribution => AttributeKind::Nominal,
            Attribute::HeatingLoad | Attribute::CoolingLoad => AttributeKind::Target,
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Attribute {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_lowercase();
        Attribute::ALL
            .iter()
            .copied()
            .find(|a| a.code() == code)
            .ok_or_else(|| AnalysisError::InvalidSpec(format!("unknown attribute '{}'", s)))
    }
}
