use picklist_provenance::domain::model::PlateRole;
use picklist_provenance::utils::validation::Validate;
use picklist_provenance::{
    validate, validate_messages, Diagnostic, PickListError, PlateUsage, RunConfig, TransferRecord,
    TransferTable,
};

const LABWARE: &str = r#"
[resolver]
max_depth = 8

[labware."384PP_DMSO2"]
usage = "SRC"
drop_volume = 2.5

[labware."6RES_AQ_BP2"]
usage = "SRC"
drop_volume = 25.0

[labware."1536LDV_Dest"]
usage = "DEST"
"#;

fn row(src: (&str, &str, &str), dst: (&str, &str, &str), volume: f64) -> TransferRecord {
    TransferRecord {
        sample_name: None,
        source_plate: src.0.to_string(),
        source_well: src.1.to_string(),
        source_plate_type: src.2.to_string(),
        destination_plate: dst.0.to_string(),
        destination_well: dst.1.to_string(),
        destination_plate_type: dst.2.to_string(),
        transfer_volume: volume,
        source_concentration: None,
        destination_sample_name: None,
    }
}

fn config() -> RunConfig {
    let config = RunConfig::from_toml_str(LABWARE).unwrap();
    config.validate().unwrap();
    config
}

#[test]
fn test_registered_labware_passes() {
    let table = TransferTable::new(vec![
        row(("stock", "A1", "384PP_DMSO2"), ("assay", "A1", "1536LDV_Dest"), 5.0),
        row(("water", "A1", "6RES_AQ_BP2"), ("assay", "A1", "1536LDV_Dest"), 50.0),
    ]);

    let diagnostics = validate(&table, config().geometry()).unwrap();
    assert!(diagnostics.is_empty(), "{diagnostics:?}");
}

#[test]
fn test_mixed_plate_types_abort_validation() {
    let table = TransferTable::new(vec![
        row(("stock", "A1", "384PP_DMSO2"), ("assay", "A1", "1536LDV_Dest"), 5.0),
        row(("stock", "A2", "6RES_AQ_BP2"), ("assay", "A2", "1536LDV_Dest"), 5.0),
    ]);

    let err = validate(&table, config().geometry()).unwrap_err();
    assert!(matches!(err, PickListError::InconsistentPlateType { .. }));
    assert!(err.to_string().contains("stock"));
}

#[test]
fn test_unregistered_and_misused_types_are_reported_together() {
    let table = TransferTable::new(vec![
        row(("stock", "A1", "384PP_DMSO2"), ("assay", "A1", "1536LDV_Dest"), 5.0),
        row(("odd", "A1", "384LDV_DMSO"), ("assay", "A2", "1536LDV_Dest"), 5.0),
        // 1536LDV_Dest is a destination type used here as a source.
        row(("assay", "A1", "1536LDV_Dest"), ("backfill", "A1", "384PP_DMSO2"), 5.0),
    ]);

    let diagnostics = validate(&table, config().geometry()).unwrap();
    assert!(diagnostics.contains(&Diagnostic::WrongUsage {
        plate_type: "384PP_DMSO2".to_string(),
        role: PlateRole::Destination,
        expected: PlateUsage::Dest,
        actual: PlateUsage::Src,
    }));
    assert!(diagnostics.contains(&Diagnostic::UnregisteredPlateType {
        plate_type: "384LDV_DMSO".to_string(),
        role: PlateRole::Source,
    }));
    assert!(diagnostics.iter().any(|d| matches!(
        d,
        Diagnostic::WrongUsage { plate_type, .. } if plate_type == "1536LDV_Dest"
    )));
}

#[test]
fn test_drop_volume_findings_collapse_into_one_message() {
    let table = TransferTable::new(vec![
        row(("stock", "A1", "384PP_DMSO2"), ("assay", "A1", "1536LDV_Dest"), 5.0),
        row(("stock", "A2", "384PP_DMSO2"), ("assay", "A2", "1536LDV_Dest"), 6.0),
        row(("water", "A1", "6RES_AQ_BP2"), ("assay", "A3", "1536LDV_Dest"), 30.0),
    ]);

    let messages = validate_messages(&table, config().geometry()).unwrap();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].starts_with("2 transfer volume(s)"));
    assert!(messages[0].contains("stock:A2"));
    assert!(messages[0].contains("water:A1"));
}

#[test]
fn test_disabled_geometry_only_checks_consistency() {
    let content = format!("{}\n[validation]\ncheck_geometry = false\n", LABWARE);
    let config = RunConfig::from_toml_str(&content).unwrap();

    let table = TransferTable::new(vec![row(
        ("stock", "A1", "unknown_type"),
        ("assay", "A1", "1536LDV_Dest"),
        3.0,
    )]);

    assert!(config.geometry().is_none());
    assert!(validate(&table, config.geometry()).unwrap().is_empty());
}
