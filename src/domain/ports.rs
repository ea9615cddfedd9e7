use crate::core::table::TransferTable;
use crate::domain::model::PlateSpec;
use crate::utils::error::Result;
use std::collections::{BTreeMap, HashMap};

/// Anything that can hand over a pick list as a transfer table.
pub trait TransferSource {
    fn load(&self) -> Result<TransferTable>;
}

/// Plate-type registry, normally backed by the instrument's labware definitions.
pub trait PlateGeometryLookup: Send + Sync {
    fn plate_spec(&self, plate_type: &str) -> Option<&PlateSpec>;
}

impl PlateGeometryLookup for HashMap<String, PlateSpec> {
    fn plate_spec(&self, plate_type: &str) -> Option<&PlateSpec> {
        self.get(plate_type)
    }
}

impl PlateGeometryLookup for BTreeMap<String, PlateSpec> {
    fn plate_spec(&self, plate_type: &str) -> Option<&PlateSpec> {
        self.get(plate_type)
    }
}
