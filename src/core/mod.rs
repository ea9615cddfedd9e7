pub mod graph;
pub mod resolver;
pub mod table;
pub mod validator;

pub use crate::domain::model::{ResolvedContribution, SourceTotal, TransferRecord, WellId};
pub use crate::domain::ports::{PlateGeometryLookup, TransferSource};
pub use crate::utils::error::Result;
