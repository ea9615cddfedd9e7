use crate::core::table::TransferTable;
use crate::domain::model::TransferRecord;
use crate::domain::ports::TransferSource;
use crate::utils::error::Result;
use serde::Deserialize;
use std::io::Read;
use std::path::{Path, PathBuf};

/// One row of an instrument pick-list CSV. Unknown columns are ignored.
#[derive(Debug, Deserialize)]
struct PickListRow {
    #[serde(rename = "Sample Name", default)]
    sample_name: Option<String>,
    #[serde(rename = "Source Plate Name")]
    source_plate: String,
    #[serde(rename = "Source Plate Type")]
    source_plate_type: String,
    #[serde(rename = "Source Well")]
    source_well: String,
    #[serde(rename = "Destination Plate Name")]
    destination_plate: String,
    #[serde(rename = "Destination Plate Type")]
    destination_plate_type: String,
    #[serde(rename = "Destination Well")]
    destination_well: String,
    #[serde(rename = "Transfer Volume")]
    transfer_volume: f64,
    #[serde(rename = "Source Concentration", default)]
    source_concentration: Option<f64>,
    #[serde(rename = "Destination Sample Name", default)]
    destination_sample_name: Option<String>,
}

impl From<PickListRow> for TransferRecord {
    fn from(row: PickListRow) -> Self {
        TransferRecord {
            sample_name: row.sample_name.filter(|s| !s.trim().is_empty()),
            source_plate: row.source_plate,
            source_well: row.source_well,
            source_plate_type: row.source_plate_type,
            destination_plate: row.destination_plate,
            destination_well: row.destination_well,
            destination_plate_type: row.destination_plate_type,
            transfer_volume: row.transfer_volume,
            source_concentration: row.source_concentration,
            destination_sample_name: row.destination_sample_name.filter(|s| !s.trim().is_empty()),
        }
    }
}

/// Reads a pick list from CSV text. Volumes are checked as the table is built.
pub fn read_picklist<R: Read>(reader: R) -> Result<TransferTable> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut records = Vec::new();
    for row in csv_reader.deserialize::<PickListRow>() {
        records.push(TransferRecord::from(row?));
    }

    tracing::debug!("Read {} transfers from pick list", records.len());
    TransferTable::try_new(records)
}

/// Pick list stored as a CSV file on disk.
#[derive(Debug, Clone)]
pub struct CsvPickList {
    path: PathBuf,
}

impl CsvPickList {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl TransferSource for CsvPickList {
    fn load(&self) -> Result<TransferTable> {
        tracing::info!("📁 Loading pick list from: {}", self.path.display());
        let file = std::fs::File::open(&self.path)?;
        read_picklist(std::io::BufReader::new(file))
    }
}
