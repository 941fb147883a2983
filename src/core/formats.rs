use crate::core::address::value_text;
use crate::core::Record;
use crate::utils::error::{EtlError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataFormat {
    #[default]
    Json,
    Csv,
}

impl DataFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            DataFormat::Json => "json",
            DataFormat::Csv => "csv",
        }
    }
}

impl fmt::Display for DataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for DataFormat {
    type Err = EtlError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(DataFormat::Json),
            "csv" => Ok(DataFormat::Csv),
            other => Err(EtlError::InvalidConfigValueError {
                field: "type".to_string(),
                value: other.to_string(),
                reason: "Unsupported format. Valid formats: json, csv".to_string(),
            }),
        }
    }
}

/// Parses input file contents into records.
///
/// JSON must be an array of objects. CSV needs a header row; every cell is
/// kept as a string.
pub fn parse_records(bytes: &[u8], format: DataFormat) -> Result<Vec<Record>> {
    match format {
        DataFormat::Json => parse_json(bytes),
        DataFormat::Csv => parse_csv(bytes),
    }
}

fn parse_json(bytes: &[u8]) -> Result<Vec<Record>> {
    let value: Value = serde_json::from_slice(bytes)
        .map_err(|e| EtlError::import(format!("invalid JSON: {}", e)))?;

    let Value::Array(items) = value else {
        return Err(EtlError::import("JSON input must be an array of objects"));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(obj) => Ok(Record::from_object(obj)),
            other => Err(EtlError::import(format!(
                "element {} is not an object: {}",
                index, other
            ))),
        })
        .collect()
}

fn parse_csv(bytes: &[u8]) -> Result<Vec<Record>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let headers = reader.headers()?.clone();
    let mut records = Vec::new();

    for row in reader.records() {
        let row = row?;
        let mut data = Map::new();
        for (index, header) in headers.iter().enumerate() {
            let cell = row.get(index).unwrap_or_default();
            data.insert(header.to_string(), Value::String(cell.to_string()));
        }
        records.push(Record::from_object(data));
    }

    Ok(records)
}

/// Serializes records for export. Ids are never written.
pub fn serialize_records(records: &[Record], format: DataFormat) -> Result<Vec<u8>> {
    match format {
        DataFormat::Json => to_json(records),
        DataFormat::Csv => to_csv(records),
    }
}

fn to_json(records: &[Record]) -> Result<Vec<u8>> {
    let docs: Vec<&Map<String, Value>> = records.iter().map(|r| &r.data).collect();

    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    docs.serialize(&mut serializer)?;
    Ok(out)
}

/// Column list for CSV output: every field name seen, in first-seen order.
pub fn union_header(records: &[Record]) -> Vec<String> {
    let mut header: Vec<String> = Vec::new();
    for record in records {
        for key in record.data.keys() {
            if !header.iter().any(|h| h == key) {
                header.push(key.clone());
            }
        }
    }
    header
}

fn to_csv(records: &[Record]) -> Result<Vec<u8>> {
    let header = union_header(records);
    let mut writer = csv::Writer::from_writer(Vec::new());

    if !header.is_empty() {
        writer.write_record(&header)?;
    }
    for record in records {
        let row = header
            .iter()
            .map(|column| record.data.get(column).map(value_text).unwrap_or_default());
        writer.write_record(row)?;
    }

    writer
        .into_inner()
        .map_err(|e| EtlError::IoError(e.into_error()))
}
