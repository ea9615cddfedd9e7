use crate::domain::model::{PlateRole, TransferRecord, WellId};
use crate::utils::error::{PickListError, Result};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// An immutable pick list. Every other component derives its views from here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransferTable {
    records: Vec<TransferRecord>,
}

impl TransferTable {
    /// Wraps the records as-is. Malformed rows surface only when consumed.
    pub fn new(records: Vec<TransferRecord>) -> Self {
        Self { records }
    }

    /// Wraps the records, rejecting any transfer whose volume is not a positive number.
    pub fn try_new(records: Vec<TransferRecord>) -> Result<Self> {
        if let Some((row, record)) = records
            .iter()
            .enumerate()
            .find(|(_, r)| !r.has_valid_volume())
        {
            return Err(invalid_volume(row, record));
        }
        Ok(Self { records })
    }

    pub fn concat<I>(tables: I) -> Self
    where
        I: IntoIterator<Item = TransferTable>,
    {
        let records = tables.into_iter().flat_map(|t| t.records).collect();
        Self { records }
    }

    pub fn records(&self) -> &[TransferRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TransferRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn transfers_into<'a>(
        &'a self,
        plate: &'a str,
        well: &'a str,
    ) -> impl Iterator<Item = &'a TransferRecord> + 'a {
        self.records
            .iter()
            .filter(move |r| r.destination_plate == plate && r.destination_well == well)
    }

    pub fn transfers_with_sample<'a>(
        &'a self,
        sample_name: &'a str,
    ) -> impl Iterator<Item = &'a TransferRecord> + 'a {
        self.records
            .iter()
            .filter(move |r| r.sample_name.as_deref() == Some(sample_name))
    }

    pub fn transfers_with_destination_sample<'a>(
        &'a self,
        sample_name: &'a str,
    ) -> impl Iterator<Item = &'a TransferRecord> + 'a {
        self.records
            .iter()
            .filter(move |r| r.destination_sample_name.as_deref() == Some(sample_name))
    }

    /// Sum of `transfer_volume` per destination well (the fan-in mixing denominator).
    pub fn total_volumes(&self) -> HashMap<WellId, f64> {
        let mut totals: HashMap<WellId, f64> = HashMap::new();
        for record in &self.records {
            *totals.entry(record.destination()).or_insert(0.0) += record.transfer_volume;
        }
        totals
    }

    /// Records grouped by destination well, in table order within each group.
    pub fn incoming(&self) -> HashMap<WellId, Vec<(usize, &TransferRecord)>> {
        let mut incoming: HashMap<WellId, Vec<(usize, &TransferRecord)>> = HashMap::new();
        for (row, record) in self.records.iter().enumerate() {
            incoming
                .entry(record.destination())
                .or_default()
                .push((row, record));
        }
        incoming
    }

    /// Number of distinct wells appearing as either source or destination.
    pub fn distinct_well_count(&self) -> usize {
        let mut wells: HashSet<(&str, &str)> = HashSet::new();
        for record in &self.records {
            wells.insert((&record.source_plate, &record.source_well));
            wells.insert((&record.destination_plate, &record.destination_well));
        }
        wells.len()
    }

    /// Plate types reported for each plate name on one side of the transfers.
    pub fn plate_types(&self, role: PlateRole) -> BTreeMap<&str, BTreeSet<&str>> {
        let mut types: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        for record in &self.records {
            types
                .entry(record.plate_name(role))
                .or_default()
                .insert(record.plate_type(role));
        }
        types
    }
}

impl From<Vec<TransferRecord>> for TransferTable {
    fn from(records: Vec<TransferRecord>) -> Self {
        Self::new(records)
    }
}

impl<'a> IntoIterator for &'a TransferTable {
    type Item = &'a TransferRecord;
    type IntoIter = std::slice::Iter<'a, TransferRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

pub(crate) fn invalid_volume(row: usize, record: &TransferRecord) -> PickListError {
    PickListError::InvalidTransferVolume {
        row,
        source_well: record.source(),
        destination: record.destination(),
        volume: record.transfer_volume,
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::transfer;
    use super::*;

    #[test]
    fn test_total_volumes_sum_fan_in() {
        let table = TransferTable::new(vec![
            transfer("A:A1", "C:A1", 10.0, Some(100.0)),
            transfer("B:A1", "C:A1", 30.0, Some(0.0)),
            transfer("A:A1", "C:B1", 2.5, Some(100.0)),
        ]);

        let totals = table.total_volumes();
        assert_eq!(totals.len(), 2);
        assert_eq!(totals[&WellId::new("C", "A1")], 40.0);
        assert_eq!(totals[&WellId::new("C", "B1")], 2.5);
    }

    #[test]
    fn test_try_new_rejects_non_positive_volume() {
        let err = TransferTable::try_new(vec![
            transfer("A:A1", "B:A1", 10.0, None),
            transfer("A:A2", "B:A2", 0.0, None),
        ])
        .unwrap_err();

        match err {
            PickListError::InvalidTransferVolume { row, volume, .. } => {
                assert_eq!(row, 1);
                assert_eq!(volume, 0.0);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        assert!(TransferTable::try_new(vec![transfer("A:A1", "B:A1", -5.0, None)]).is_err());
        assert!(TransferTable::try_new(vec![transfer("A:A1", "B:A1", f64::NAN, None)]).is_err());
    }

    #[test]
    fn test_new_does_not_validate() {
        let table = TransferTable::new(vec![transfer("A:A1", "B:A1", 0.0, None)]);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_filters() {
        let mut named = transfer("A:A1", "B:A1", 10.0, None);
        named.sample_name = Some("DNA".to_string());
        named.destination_sample_name = Some("mix1".to_string());
        let table = TransferTable::new(vec![named, transfer("A:A2", "B:A1", 5.0, None)]);

        assert_eq!(table.transfers_into("B", "A1").count(), 2);
        assert_eq!(table.transfers_into("B", "A2").count(), 0);
        assert_eq!(table.transfers_with_sample("DNA").count(), 1);
        assert_eq!(table.transfers_with_destination_sample("mix1").count(), 1);
    }

    #[test]
    fn test_distinct_well_count_and_concat() {
        let first = TransferTable::new(vec![transfer("A:A1", "B:A1", 10.0, None)]);
        let second = TransferTable::new(vec![transfer("B:A1", "C:A1", 5.0, None)]);
        let joined = TransferTable::concat([first, second]);

        assert_eq!(joined.len(), 2);
        assert_eq!(joined.distinct_well_count(), 3);
        assert_eq!(joined.incoming()[&WellId::new("C", "A1")].len(), 1);
    }
}
