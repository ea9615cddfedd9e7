// Adapters layer: concrete collaborators around the core (pick-list reader, report writers).

pub mod csv_loader;
pub mod report;

pub use csv_loader::{read_picklist, CsvPickList};
pub use report::{write_csv, write_json, OutputFormat, ProvenanceReport};
