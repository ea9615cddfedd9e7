use crate::core::resolver::Query;
use crate::domain::model::{ResolvedContribution, SourceTotal};
use crate::utils::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
}

/// JSON envelope for a resolution run.
#[derive(Debug, Serialize)]
pub struct ProvenanceReport<'a> {
    pub generated_at: DateTime<Utc>,
    pub query: String,
    pub contributions: &'a [ResolvedContribution],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub totals: Option<&'a [SourceTotal]>,
}

impl<'a> ProvenanceReport<'a> {
    pub fn new(query: &Query, contributions: &'a [ResolvedContribution]) -> Self {
        Self {
            generated_at: Utc::now(),
            query: query.to_string(),
            contributions,
            totals: None,
        }
    }

    pub fn with_totals(mut self, totals: &'a [SourceTotal]) -> Self {
        self.totals = Some(totals);
        self
    }
}

pub fn write_csv<W: Write, T: Serialize>(rows: &[T], writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn write_json<W: Write>(report: &ProvenanceReport<'_>, mut writer: W) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, report)?;
    writeln!(writer)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> Vec<ResolvedContribution> {
        vec![
            ResolvedContribution {
                sample_name: Some("DNA".to_string()),
                source_plate: "PlateA".to_string(),
                source_well: "A1".to_string(),
                source_concentration: Some(100.0),
                destination_concentration: Some(25.0),
                contribution_ratio: 0.25,
            },
            ResolvedContribution {
                sample_name: None,
                source_plate: "PlateB".to_string(),
                source_well: "A1".to_string(),
                source_concentration: None,
                destination_concentration: None,
                contribution_ratio: 0.75,
            },
        ]
    }

    #[test]
    fn test_write_csv_headers_and_nulls() {
        let mut out = Vec::new();
        write_csv(&rows(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();

        assert_eq!(
            lines.next().unwrap(),
            "Sample Name,Source Plate Name,Source Well,Source Concentration,Destination Concentration,Contribution Ratio"
        );
        assert_eq!(lines.next().unwrap(), "DNA,PlateA,A1,100.0,25.0,0.25");
        assert_eq!(lines.next().unwrap(), ",PlateB,A1,,,0.75");
    }

    #[test]
    fn test_write_json_report() {
        let rows = rows();
        let report = ProvenanceReport::new(&Query::well("PlateC", "A1"), &rows);
        let mut out = Vec::new();
        write_json(&report, &mut out).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["query"], "well PlateC:A1");
        assert_eq!(value["contributions"].as_array().unwrap().len(), 2);
        assert_eq!(value["contributions"][1]["Source Concentration"], serde_json::Value::Null);
        assert!(value.get("totals").is_none());
        assert!(value["generated_at"].is_string());
    }
}
