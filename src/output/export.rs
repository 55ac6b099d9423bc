//! Export of the similarity log and performance snapshot
//!
//! Three formats are supported:
//! - JSON: the whole [`ExportData`], pretty-printed
//! - CSV: one row per similarity record, header first, strings quoted
//! - XML: one `<page>` element per similarity record

use crate::analysis::SimilarityRecord;
use crate::monitor::PerformanceStats;
use crate::SkewerError;
use chrono::{DateTime, SecondsFormat, Utc};
use csv::{QuoteStyle, WriterBuilder};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
    Xml,
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            "xml" => Ok(Self::Xml),
            other => Err(format!(
                "unknown export format '{}', expected json, csv or xml",
                other
            )),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => f.write_str("json"),
            Self::Csv => f.write_str("csv"),
            Self::Xml => f.write_str("xml"),
        }
    }
}

/// Everything a crawler can export
#[derive(Debug, Clone, Serialize)]
pub struct ExportData {
    pub records: Vec<SimilarityRecord>,
    pub performance: PerformanceStats,
    pub exported_at: DateTime<Utc>,
}

impl ExportData {
    pub fn new(records: Vec<SimilarityRecord>, performance: PerformanceStats) -> Self {
        Self {
            records,
            performance,
            exported_at: Utc::now(),
        }
    }
}

/// Renders export data in the requested format
///
/// CSV and XML carry only the similarity records; an empty log exports as
/// an empty CSV document.
pub fn export(data: &ExportData, format: ExportFormat) -> crate::Result<String> {
    match format {
        ExportFormat::Json => Ok(serde_json::to_string_pretty(data)?),
        ExportFormat::Csv => export_csv(&data.records),
        ExportFormat::Xml => Ok(export_xml(&data.records)),
    }
}

fn export_csv(records: &[SimilarityRecord]) -> crate::Result<String> {
    if records.is_empty() {
        return Ok(String::new());
    }

    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::NonNumeric)
        .from_writer(Vec::new());

    for record in records {
        writer.serialize(record)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| SkewerError::Export(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| SkewerError::Export(e.to_string()))
}

fn export_xml(records: &[SimilarityRecord]) -> String {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<skewerData>\n");

    for record in records {
        xml.push_str("  <page>\n");
        push_element(&mut xml, "url", &record.url);
        push_element(&mut xml, "text", &record.text);
        push_element(
            &mut xml,
            "recorded_at",
            &record.recorded_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        );
        xml.push_str("  </page>\n");
    }

    xml.push_str("</skewerData>");
    xml
}

fn push_element(xml: &mut String, name: &str, value: &str) {
    xml.push_str(&format!("    <{name}>{}</{name}>\n", escape_xml(value)));
}

/// Escapes the five XML special characters
pub fn escape_xml(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '&' => escaped.push_str("&amp;"),
            '\'' => escaped.push_str("&apos;"),
            '"' => escaped.push_str("&quot;"),
            other => escaped.push(other),
        }
    }
    escaped
}
