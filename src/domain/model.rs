use serde::{Deserialize, Serialize};
use std::fmt;

/// A well, addressed by plate name and well label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WellId {
    pub plate: String,
    pub well: String,
}

impl WellId {
    pub fn new(plate: impl Into<String>, well: impl Into<String>) -> Self {
        Self {
            plate: plate.into(),
            well: well.into(),
        }
    }
}

impl fmt::Display for WellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.plate, self.well)
    }
}

/// Which side of a transfer a plate is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlateRole {
    Source,
    Destination,
}

impl fmt::Display for PlateRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlateRole::Source => write!(f, "Source"),
            PlateRole::Destination => write!(f, "Destination"),
        }
    }
}

/// Registered usage of a plate type on the instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlateUsage {
    #[serde(rename = "SRC")]
    Src,
    #[serde(rename = "DEST")]
    Dest,
}

impl PlateUsage {
    pub fn expected_for(role: PlateRole) -> Self {
        match role {
            PlateRole::Source => PlateUsage::Src,
            PlateRole::Destination => PlateUsage::Dest,
        }
    }
}

impl fmt::Display for PlateUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlateUsage::Src => write!(f, "SRC"),
            PlateUsage::Dest => write!(f, "DEST"),
        }
    }
}

/// Geometry facts about a plate type that matter for validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlateSpec {
    pub usage: PlateUsage,
    pub drop_volume: Option<f64>,
}

/// One physical liquid movement from a pick list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferRecord {
    pub sample_name: Option<String>,
    pub source_plate: String,
    pub source_well: String,
    pub source_plate_type: String,
    pub destination_plate: String,
    pub destination_well: String,
    pub destination_plate_type: String,
    pub transfer_volume: f64,
    pub source_concentration: Option<f64>,
    pub destination_sample_name: Option<String>,
}

impl TransferRecord {
    pub fn source(&self) -> WellId {
        WellId::new(&self.source_plate, &self.source_well)
    }

    pub fn destination(&self) -> WellId {
        WellId::new(&self.destination_plate, &self.destination_well)
    }

    pub fn plate_name(&self, role: PlateRole) -> &str {
        match role {
            PlateRole::Source => &self.source_plate,
            PlateRole::Destination => &self.destination_plate,
        }
    }

    pub fn plate_type(&self, role: PlateRole) -> &str {
        match role {
            PlateRole::Source => &self.source_plate_type,
            PlateRole::Destination => &self.destination_plate_type,
        }
    }

    pub(crate) fn has_valid_volume(&self) -> bool {
        self.transfer_volume.is_finite() && self.transfer_volume > 0.0
    }
}

/// Multiplies an optional concentration by a ratio; an unknown concentration stays unknown.
pub fn scale_concentration(concentration: Option<f64>, ratio: f64) -> Option<f64> {
    concentration.map(|c| c * ratio)
}

/// Share of a destination well's final volume traced back to one ultimate source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedContribution {
    #[serde(rename = "Sample Name")]
    pub sample_name: Option<String>,
    #[serde(rename = "Source Plate Name")]
    pub source_plate: String,
    #[serde(rename = "Source Well")]
    pub source_well: String,
    #[serde(rename = "Source Concentration")]
    pub source_concentration: Option<f64>,
    #[serde(rename = "Destination Concentration")]
    pub destination_concentration: Option<f64>,
    #[serde(rename = "Contribution Ratio")]
    pub contribution_ratio: f64,
}

impl ResolvedContribution {
    pub fn source(&self) -> WellId {
        WellId::new(&self.source_plate, &self.source_well)
    }
}

/// Contributions summed per ultimate source well.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceTotal {
    #[serde(rename = "Source Plate Name")]
    pub source_plate: String,
    #[serde(rename = "Source Well")]
    pub source_well: String,
    #[serde(rename = "Destination Concentration")]
    pub destination_concentration: Option<f64>,
    #[serde(rename = "Contribution Ratio")]
    pub contribution_ratio: f64,
    #[serde(rename = "Branches")]
    pub branches: usize,
}
