use crate::core::table::TransferTable;
use crate::domain::model::{PlateRole, PlateUsage, TransferRecord};
use crate::domain::ports::PlateGeometryLookup;
use crate::utils::error::{PickListError, Result};
use std::collections::BTreeSet;
use std::fmt;

// 液滴體積倍數的浮點容差
const DROP_VOLUME_TOLERANCE: f64 = 1e-6;

/// A transfer whose volume is not a whole number of drops.
#[derive(Debug, Clone, PartialEq)]
pub struct DropVolumeViolation {
    pub row: usize,
    pub role: PlateRole,
    pub plate_type: String,
    pub drop_volume: f64,
    pub record: TransferRecord,
}

impl fmt::Display for DropVolumeViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "row {}: {}:{} -> {}:{} volume {} is not a multiple of {} drop volume {} ({})",
            self.row,
            self.record.source_plate,
            self.record.source_well,
            self.record.destination_plate,
            self.record.destination_well,
            self.record.transfer_volume,
            self.role.to_string().to_lowercase(),
            self.drop_volume,
            self.plate_type
        )
    }
}

/// A data-quality finding reported back to the caller rather than raised.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    UnregisteredPlateType {
        plate_type: String,
        role: PlateRole,
    },
    WrongUsage {
        plate_type: String,
        role: PlateRole,
        expected: PlateUsage,
        actual: PlateUsage,
    },
    DropVolumeViolations {
        violations: Vec<DropVolumeViolation>,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::UnregisteredPlateType { plate_type, role } => write!(
                f,
                "{} plate type '{}' not found in labware definition",
                role, plate_type
            ),
            Diagnostic::WrongUsage {
                plate_type,
                role,
                expected,
                actual,
            } => write!(
                f,
                "{} plate type '{}' is registered as a {} plate, expected {}",
                role, plate_type, actual, expected
            ),
            Diagnostic::DropVolumeViolations { violations } => {
                write!(
                    f,
                    "{} transfer volume(s) are not multiples of drop volume",
                    violations.len()
                )?;
                for violation in violations {
                    write!(f, "\n  {}", violation)?;
                }
                Ok(())
            }
        }
    }
}

/// Runs every consistency check over the pick list.
///
/// Plate-type consistency is fail-fast: a plate name reported with two plate types
/// returns `InconsistentPlateType`, since all downstream volume math assumes a
/// single type per name. Registration and drop-volume findings are collected and
/// returned together. Without a geometry lookup those two checks are skipped.
pub fn validate(
    table: &TransferTable,
    geometry: Option<&dyn PlateGeometryLookup>,
) -> Result<Vec<Diagnostic>> {
    check_plate_type_consistency(table)?;

    let Some(geometry) = geometry else {
        tracing::warn!(
            "No plate geometry supplied, skipping labware registration and drop volume checks"
        );
        return Ok(Vec::new());
    };

    let mut diagnostics = check_registration(table, geometry);
    if let Some(violations) = check_drop_volumes(table, geometry) {
        diagnostics.push(violations);
    }

    tracing::debug!(
        "Validated {} transfers: {} diagnostic(s)",
        table.len(),
        diagnostics.len()
    );
    Ok(diagnostics)
}

/// [`validate`], with the findings rendered as messages.
pub fn validate_messages(
    table: &TransferTable,
    geometry: Option<&dyn PlateGeometryLookup>,
) -> Result<Vec<String>> {
    Ok(validate(table, geometry)?
        .iter()
        .map(ToString::to_string)
        .collect())
}

pub fn check_plate_type_consistency(table: &TransferTable) -> Result<()> {
    for role in [PlateRole::Destination, PlateRole::Source] {
        if let Some((name, types)) = table
            .plate_types(role)
            .into_iter()
            .find(|(_, types)| types.len() > 1)
        {
            return Err(PickListError::InconsistentPlateType {
                plate_name: name.to_string(),
                role,
                plate_types: types.into_iter().map(str::to_string).collect(),
            });
        }
    }
    Ok(())
}

fn check_registration(
    table: &TransferTable,
    geometry: &dyn PlateGeometryLookup,
) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    for role in [PlateRole::Destination, PlateRole::Source] {
        let plate_types: BTreeSet<&str> = table.iter().map(|r| r.plate_type(role)).collect();
        let expected = PlateUsage::expected_for(role);

        for plate_type in plate_types {
            match geometry.plate_spec(plate_type) {
                None => diagnostics.push(Diagnostic::UnregisteredPlateType {
                    plate_type: plate_type.to_string(),
                    role,
                }),
                Some(spec) if spec.usage != expected => diagnostics.push(Diagnostic::WrongUsage {
                    plate_type: plate_type.to_string(),
                    role,
                    expected,
                    actual: spec.usage,
                }),
                Some(_) => {}
            }
        }
    }

    diagnostics
}

fn check_drop_volumes(
    table: &TransferTable,
    geometry: &dyn PlateGeometryLookup,
) -> Option<Diagnostic> {
    let mut violations = Vec::new();

    for (row, record) in table.iter().enumerate() {
        for role in [PlateRole::Source, PlateRole::Destination] {
            let plate_type = record.plate_type(role);
            let Some(drop_volume) = geometry
                .plate_spec(plate_type)
                .and_then(|spec| spec.drop_volume)
            else {
                continue;
            };

            if !is_multiple_of(record.transfer_volume, drop_volume) {
                violations.push(DropVolumeViolation {
                    row,
                    role,
                    plate_type: plate_type.to_string(),
                    drop_volume,
                    record: record.clone(),
                });
            }
        }
    }

    if violations.is_empty() {
        None
    } else {
        Some(Diagnostic::DropVolumeViolations { violations })
    }
}

fn is_multiple_of(volume: f64, drop_volume: f64) -> bool {
    if drop_volume <= 0.0 || !drop_volume.is_finite() {
        return false;
    }
    let drops = volume / drop_volume;
    (drops - drops.round()).abs() <= DROP_VOLUME_TOLERANCE * drops.abs().max(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::table::test_support::transfer;
    use crate::domain::model::PlateSpec;
    use std::collections::HashMap;

    fn labware() -> HashMap<String, PlateSpec> {
        HashMap::from([
            (
                "384PP_DMSO2".to_string(),
                PlateSpec {
                    usage: PlateUsage::Src,
                    drop_volume: Some(2.5),
                },
            ),
            (
                "384LDV_Dest".to_string(),
                PlateSpec {
                    usage: PlateUsage::Dest,
                    drop_volume: None,
                },
            ),
        ])
    }

    #[test]
    fn test_is_multiple_of() {
        assert!(is_multiple_of(10.0, 2.5));
        assert!(is_multiple_of(7.5, 2.5));
        assert!(is_multiple_of(0.3, 0.1));
        assert!(!is_multiple_of(11.0, 2.5));
        assert!(!is_multiple_of(10.0, 0.0));
    }

    #[test]
    fn test_clean_table_has_no_diagnostics() {
        let table = TransferTable::new(vec![
            transfer("src:A1", "dst:A1", 10.0, None),
            transfer("src:A2", "dst:A1", 2.5, None),
        ]);
        let geometry = labware();
        assert!(validate(&table, Some(&geometry)).unwrap().is_empty());
    }

    #[test]
    fn test_inconsistent_destination_type_fails_fast() {
        let mut odd = transfer("src:A2", "dst:A2", 10.0, None);
        odd.destination_plate_type = "1536LDV_Dest".to_string();
        let table = TransferTable::new(vec![transfer("src:A1", "dst:A1", 10.0, None), odd]);

        let err = validate(&table, None).unwrap_err();
        match err {
            PickListError::InconsistentPlateType {
                plate_name,
                role,
                plate_types,
            } => {
                assert_eq!(plate_name, "dst");
                assert_eq!(role, PlateRole::Destination);
                assert_eq!(plate_types, vec!["1536LDV_Dest", "384LDV_Dest"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_inconsistent_source_type_fails_fast() {
        let mut odd = transfer("src:A2", "dst:A2", 10.0, None);
        odd.source_plate_type = "6RES_AQ_BP2".to_string();
        let table = TransferTable::new(vec![transfer("src:A1", "dst:A1", 10.0, None), odd]);

        assert!(matches!(
            check_plate_type_consistency(&table),
            Err(PickListError::InconsistentPlateType {
                role: PlateRole::Source,
                ..
            })
        ));
    }

    #[test]
    fn test_registration_and_usage_are_accumulated() {
        let mut unknown = transfer("src:A1", "dst:A1", 10.0, None);
        unknown.source_plate = "src2".to_string();
        unknown.source_plate_type = "1536LDV_DMSO".to_string();
        let mut misused = transfer("src:A1", "dst2:A1", 10.0, None);
        misused.destination_plate_type = "384PP_DMSO2".to_string();
        let table = TransferTable::new(vec![
            transfer("src:A1", "dst:A1", 10.0, None),
            unknown,
            misused,
        ]);
        let geometry = labware();

        let diagnostics = validate(&table, Some(&geometry)).unwrap();
        assert_eq!(diagnostics.len(), 2);
        assert_eq!(
            diagnostics[0],
            Diagnostic::WrongUsage {
                plate_type: "384PP_DMSO2".to_string(),
                role: PlateRole::Destination,
                expected: PlateUsage::Dest,
                actual: PlateUsage::Src,
            }
        );
        assert_eq!(
            diagnostics[1],
            Diagnostic::UnregisteredPlateType {
                plate_type: "1536LDV_DMSO".to_string(),
                role: PlateRole::Source,
            }
        );
    }

    #[test]
    fn test_drop_volume_violations_are_one_aggregate() {
        let table = TransferTable::new(vec![
            transfer("src:A1", "dst:A1", 10.0, None),
            transfer("src:A2", "dst:A2", 3.0, None),
            transfer("src:A3", "dst:A3", 4.0, None),
        ]);
        let geometry = labware();

        let messages = validate_messages(&table, Some(&geometry)).unwrap();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].starts_with("2 transfer volume(s) are not multiples of drop volume"));
        assert!(messages[0].contains("row 1: src:A2 -> dst:A2 volume 3"));
        assert!(messages[0].contains("row 2: src:A3 -> dst:A3 volume 4"));
    }

    #[test]
    fn test_no_geometry_skips_registration() {
        let mut unknown = transfer("src:A1", "dst:A1", 3.0, None);
        unknown.source_plate_type = "mystery".to_string();
        let table = TransferTable::new(vec![unknown]);
        assert!(validate(&table, None).unwrap().is_empty());
    }
}
