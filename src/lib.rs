pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{CliConfig, Commands};

pub use adapters::CsvPickList;
pub use config::RunConfig;
pub use core::graph::{build_plate_graph, build_well_graph, is_acyclic, PlateGraph, WellGraph};
pub use core::resolver::{aggregate_by_source, resolve, ProvenanceResolver, Query, ResolverOptions};
pub use core::table::TransferTable;
pub use core::validator::{validate, validate_messages, Diagnostic};
pub use domain::model::{PlateSpec, PlateUsage, ResolvedContribution, TransferRecord, WellId};
pub use utils::error::{PickListError, Result};
