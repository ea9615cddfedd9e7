//! Backward provenance resolution.
//!
//! Starting from the transfers that match a [`Query`], the resolver walks the well
//! graph upstream until every lineage branch ends at a root well (one that never
//! received liquid). Each branch carries the product of the volume fractions along
//! its path, so the final rows say how much of the queried well's volume came from
//! each ultimate source, and at what concentration.
//!
//! The walk is an explicit worklist. Every pending entry remembers the wells already
//! expanded on its own branch; meeting one of them again means the pick list moves
//! liquid in a loop, which is reported as [`PickListError::CyclicProvenance`]
//! instead of looping forever.

use crate::core::table::{invalid_volume, TransferTable};
use crate::domain::model::{
    scale_concentration, ResolvedContribution, SourceTotal, TransferRecord, WellId,
};
use crate::utils::error::{PickListError, Result};
use std::collections::HashMap;
use std::fmt;

/// Which transfers to start resolving from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    /// Every transfer into one destination well.
    Well { plate: String, well: String },
    /// Every transfer whose `sample_name` matches.
    Sample(String),
    /// Every transfer whose `destination_sample_name` matches.
    DestinationSample(String),
}

impl Query {
    pub fn well(plate: impl Into<String>, well: impl Into<String>) -> Self {
        Query::Well {
            plate: plate.into(),
            well: well.into(),
        }
    }

    pub fn sample(name: impl Into<String>) -> Self {
        Query::Sample(name.into())
    }

    /// Builds a query from optional selectors. Exactly one form must be supplied:
    /// plate and well together, or a sample name.
    pub fn from_parts(
        plate: Option<&str>,
        well: Option<&str>,
        sample: Option<&str>,
    ) -> Result<Self> {
        match (plate, well, sample) {
            (Some(plate), Some(well), None) => Ok(Query::well(plate, well)),
            (None, None, Some(sample)) => Ok(Query::sample(sample)),
            (None, None, None) => Err(invalid_query("no well or sample selector given")),
            (Some(_), None, None) | (None, Some(_), None) => Err(invalid_query(
                "destination plate and well must be given together",
            )),
            _ => Err(invalid_query(
                "give either a destination plate and well, or a sample name, not both",
            )),
        }
    }

    fn select<'a>(&'a self, table: &'a TransferTable) -> Vec<(usize, &'a TransferRecord)> {
        table
            .iter()
            .enumerate()
            .filter(|(_, record)| match self {
                Query::Well { plate, well } => {
                    record.destination_plate == *plate && record.destination_well == *well
                }
                Query::Sample(name) => record.sample_name.as_deref() == Some(name.as_str()),
                Query::DestinationSample(name) => {
                    record.destination_sample_name.as_deref() == Some(name.as_str())
                }
            })
            .collect()
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Query::Well { plate, well } => write!(f, "well {}:{}", plate, well),
            Query::Sample(name) => write!(f, "sample '{}'", name),
            Query::DestinationSample(name) => write!(f, "destination sample '{}'", name),
        }
    }
}

fn invalid_query(reason: impl Into<String>) -> PickListError {
    PickListError::InvalidQuery {
        reason: reason.into(),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolverOptions {
    /// Longest lineage (in hops) a branch may reach before resolution is abandoned.
    /// Defaults to the number of distinct wells in the table.
    pub max_depth: Option<usize>,
}

/// One lineage branch: the current transfer's source well plus the path behind it.
#[derive(Debug, Clone)]
struct Branch {
    row: ResolvedContribution,
    // Wells from the queried destination back to (excluding) `row`'s source.
    lineage: Vec<WellId>,
}

#[derive(Debug)]
enum Frontier {
    Pending(Branch),
    Resolved(ResolvedContribution),
}

pub struct ProvenanceResolver<'a> {
    table: &'a TransferTable,
    options: ResolverOptions,
}

impl<'a> ProvenanceResolver<'a> {
    pub fn new(table: &'a TransferTable) -> Self {
        Self {
            table,
            options: ResolverOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ResolverOptions) -> Self {
        self.options = options;
        self
    }

    fn max_depth(&self) -> usize {
        self.options
            .max_depth
            .unwrap_or_else(|| self.table.distinct_well_count())
    }

    /// Traces the selected transfers back to their ultimate sources.
    ///
    /// Returns one row per lineage branch. Rows are not merged when several branches
    /// end at the same source well; use [`aggregate_by_source`] for totals.
    pub fn resolve(&self, query: &Query) -> Result<Vec<ResolvedContribution>> {
        let selected = query.select(self.table);
        if selected.is_empty() {
            return Err(invalid_query(format!("no transfers found for {}", query)));
        }

        let totals = self.table.total_volumes();
        let incoming = self.table.incoming();
        let max_depth = self.max_depth();

        tracing::debug!(
            "Resolving {}: {} initial transfer(s), max depth {}",
            query,
            selected.len(),
            max_depth
        );

        let mut stack: Vec<Frontier> = Vec::with_capacity(selected.len());
        for &(_, record) in selected.iter().rev() {
            let ratio = fraction_of_destination(record, &totals, &incoming)?;
            stack.push(Frontier::Pending(Branch {
                row: contribution(record, ratio),
                lineage: vec![record.destination()],
            }));
        }

        let mut resolved = Vec::new();
        let mut expansions = 0usize;

        while let Some(entry) = stack.pop() {
            let branch = match entry {
                Frontier::Resolved(row) => {
                    resolved.push(row);
                    continue;
                }
                Frontier::Pending(branch) => branch,
            };

            let source = branch.row.source();
            let Some(parents) = incoming.get(&source) else {
                stack.push(Frontier::Resolved(branch.row));
                continue;
            };

            if branch.lineage.contains(&source) {
                let mut path = branch.lineage;
                path.push(source.clone());
                return Err(PickListError::CyclicProvenance { well: source, path });
            }
            if branch.lineage.len() >= max_depth {
                return Err(PickListError::ResolutionDepthExceeded {
                    well: source,
                    max_depth,
                });
            }

            expansions += 1;
            for &(_, parent) in parents.iter().rev() {
                let ratio = branch.row.contribution_ratio
                    * fraction_of_destination(parent, &totals, &incoming)?;
                let mut lineage = branch.lineage.clone();
                lineage.push(source.clone());
                stack.push(Frontier::Pending(Branch {
                    row: contribution(parent, ratio),
                    lineage,
                }));
            }
        }

        tracing::debug!(
            "Resolved {} into {} contribution(s) after {} expansion(s)",
            query,
            resolved.len(),
            expansions
        );
        Ok(resolved)
    }
}

/// Resolves `query` against `table` with default options.
pub fn resolve(table: &TransferTable, query: &Query) -> Result<Vec<ResolvedContribution>> {
    ProvenanceResolver::new(table).resolve(query)
}

fn contribution(record: &TransferRecord, ratio: f64) -> ResolvedContribution {
    ResolvedContribution {
        sample_name: record.sample_name.clone(),
        source_plate: record.source_plate.clone(),
        source_well: record.source_well.clone(),
        source_concentration: record.source_concentration,
        destination_concentration: scale_concentration(record.source_concentration, ratio),
        contribution_ratio: ratio,
    }
}

/// `record.transfer_volume / total(record.destination)`.
///
/// Every transfer summed into the destination total must have a valid volume,
/// not just `record` itself.
fn fraction_of_destination(
    record: &TransferRecord,
    totals: &HashMap<WellId, f64>,
    incoming: &HashMap<WellId, Vec<(usize, &TransferRecord)>>,
) -> Result<f64> {
    let destination = record.destination();
    if let Some(&(row, invalid)) = incoming
        .get(&destination)
        .into_iter()
        .flatten()
        .find(|(_, sibling)| !sibling.has_valid_volume())
    {
        return Err(invalid_volume(row, invalid));
    }
    let total = totals.get(&destination).copied().unwrap_or(0.0);
    split_ratio(record.transfer_volume, total, destination)
}

fn split_ratio(volume: f64, total: f64, well: WellId) -> Result<f64> {
    if total == 0.0 || !total.is_finite() {
        return Err(PickListError::ZeroVolume { well });
    }
    Ok(volume / total)
}

/// Sums contribution rows per ultimate source well, keeping first-seen order.
///
/// The summed destination concentration is `None` if any branch from that source
/// has an unknown concentration.
pub fn aggregate_by_source(rows: &[ResolvedContribution]) -> Vec<SourceTotal> {
    let mut order: Vec<WellId> = Vec::new();
    let mut totals: HashMap<WellId, SourceTotal> = HashMap::new();

    for row in rows {
        let source = row.source();
        match totals.get_mut(&source) {
            Some(total) => {
                total.contribution_ratio += row.contribution_ratio;
                total.destination_concentration = total
                    .destination_concentration
                    .zip(row.destination_concentration)
                    .map(|(a, b)| a + b);
                total.branches += 1;
            }
            None => {
                order.push(source.clone());
                totals.insert(
                    source,
                    SourceTotal {
                        source_plate: row.source_plate.clone(),
                        source_well: row.source_well.clone(),
                        destination_concentration: row.destination_concentration,
                        contribution_ratio: row.contribution_ratio,
                        branches: 1,
                    },
                );
            }
        }
    }

    order
        .into_iter()
        .filter_map(|source| totals.remove(&source))
        .collect()
}
