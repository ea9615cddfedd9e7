use crate::domain::model::{PlateRole, WellId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PickListError {
    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Invalid query: {reason}")]
    InvalidQuery { reason: String },

    #[error("{role} plate '{plate_name}' appears with multiple plate types: {}", .plate_types.join(", "))]
    InconsistentPlateType {
        plate_name: String,
        role: PlateRole,
        plate_types: Vec<String>,
    },

    #[error("Transfer at row {row} ({source_well} -> {destination}) has invalid volume {volume}")]
    InvalidTransferVolume {
        row: usize,
        source_well: WellId,
        destination: WellId,
        volume: f64,
    },

    #[error("Total incoming volume of {well} is zero")]
    ZeroVolume { well: WellId },

    #[error("Cyclic provenance at {well}: {}", format_path(.path))]
    CyclicProvenance { well: WellId, path: Vec<WellId> },

    #[error("Lineage through {well} exceeds the maximum resolution depth of {max_depth}")]
    ResolutionDepthExceeded { well: WellId, max_depth: usize },
}

pub type Result<T> = std::result::Result<T, PickListError>;

fn format_path(path: &[WellId]) -> String {
    path.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" <- ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Io,
    Configuration,
    Query,
    DataQuality,
    Resolution,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl PickListError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            PickListError::CsvError(_)
            | PickListError::IoError(_)
            | PickListError::SerializationError(_) => ErrorCategory::Io,
            PickListError::ConfigValidationError { .. }
            | PickListError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            PickListError::InvalidQuery { .. } => ErrorCategory::Query,
            PickListError::InconsistentPlateType { .. }
            | PickListError::InvalidTransferVolume { .. } => ErrorCategory::DataQuality,
            PickListError::ZeroVolume { .. }
            | PickListError::CyclicProvenance { .. }
            | PickListError::ResolutionDepthExceeded { .. } => ErrorCategory::Resolution,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Query => ErrorSeverity::Medium,
            ErrorCategory::Configuration | ErrorCategory::DataQuality => ErrorSeverity::High,
            ErrorCategory::Resolution => ErrorSeverity::High,
            ErrorCategory::Io => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            PickListError::CsvError(_) => {
                "Check that the pick list is a CSV file with the expected column headers"
            }
            PickListError::IoError(_) => "Check that the file exists and is readable",
            PickListError::SerializationError(_) => "Check the output destination and format",
            PickListError::ConfigValidationError { .. }
            | PickListError::InvalidConfigValueError { .. } => {
                "Review the configuration file and command-line arguments"
            }
            PickListError::InvalidQuery { .. } => {
                "Query either a destination plate and well together, or a sample name"
            }
            PickListError::InconsistentPlateType { .. } => {
                "Give each physical plate a unique name, or correct the plate type column"
            }
            PickListError::InvalidTransferVolume { .. } => {
                "Remove or correct transfers whose volume is not a positive number"
            }
            PickListError::ZeroVolume { .. } => {
                "Check the transfers into this well; executed transfers always carry volume"
            }
            PickListError::CyclicProvenance { .. } => {
                "The pick list moves liquid in a loop; check for swapped source and destination columns"
            }
            PickListError::ResolutionDepthExceeded { .. } => {
                "Raise the resolver max_depth setting if the dilution chain is genuinely this long"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            PickListError::CyclicProvenance { well, .. } => {
                format!("Well {} feeds back into its own lineage", well)
            }
            PickListError::InconsistentPlateType { plate_name, .. } => {
                format!("Plate '{}' is used with more than one plate type", plate_name)
            }
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn well(plate: &str, well: &str) -> WellId {
        WellId::new(plate, well)
    }

    #[test]
    fn test_cyclic_error_message_lists_path() {
        let err = PickListError::CyclicProvenance {
            well: well("A", "A1"),
            path: vec![well("B", "A1"), well("A", "A1"), well("B", "A1")],
        };
        assert_eq!(
            err.to_string(),
            "Cyclic provenance at A:A1: B:A1 <- A:A1 <- B:A1"
        );
        assert_eq!(err.category(), ErrorCategory::Resolution);
    }

    #[test]
    fn test_inconsistent_plate_type_message() {
        let err = PickListError::InconsistentPlateType {
            plate_name: "dest1".to_string(),
            role: PlateRole::Destination,
            plate_types: vec!["1536LDV_Dest".to_string(), "384PP_Dest".to_string()],
        };
        assert!(err.to_string().contains("1536LDV_Dest, 384PP_Dest"));
        assert_eq!(err.severity(), ErrorSeverity::High);
    }

    #[test]
    fn test_query_errors_are_medium_severity() {
        let err = PickListError::InvalidQuery {
            reason: "empty".to_string(),
        };
        assert_eq!(err.severity(), ErrorSeverity::Medium);
    }
}
