//! CSV output with a fixed column order.

use std::io::{Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{join_values, split_values, write_atomic};
use crate::error::{HarvesterError, Result};
use crate::types::Record;

/// Header row, in column order.
pub const CSV_HEADER: [&str; 5] = ["identifier", "title", "description", "type", "subject"];

/// One CSV row as written.
#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    identifier: &'a str,
    title: &'a str,
    description: &'a str,
    #[serde(rename = "type")]
    types: String,
    subject: String,
}

impl<'a> From<&'a Record> for CsvRow<'a> {
    fn from(record: &'a Record) -> Self {
        Self {
            identifier: &record.identifier,
            title: &record.title,
            description: &record.description,
            types: join_values(&record.types),
            subject: join_values(&record.subjects),
        }
    }
}

/// One CSV row as read; missing columns default to empty.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CsvInputRow {
    identifier: String,
    title: String,
    description: String,
    #[serde(rename = "type")]
    types: String,
    subject: String,
}

impl From<CsvInputRow> for Record {
    fn from(row: CsvInputRow) -> Self {
        Self {
            identifier: row.identifier,
            title: row.title,
            description: row.description,
            types: split_values(&row.types),
            subjects: split_values(&row.subject),
        }
    }
}

/// Write records as CSV: one header row, then one row per record.
///
/// The header is written even when there are no records.
pub fn write_csv<W: Write>(records: &[Record], writer: W) -> std::result::Result<(), csv::Error> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::CRLF)
        .from_writer(writer);

    writer.write_record(CSV_HEADER)?;
    for record in records {
        writer.serialize(CsvRow::from(record))?;
    }
    writer.flush()?;

    Ok(())
}

/// Generate the CSV document for `records`.
pub fn generate_csv(records: &[Record]) -> Result<String> {
    let mut buffer = Vec::new();
    write_csv(records, &mut buffer).map_err(|source| HarvesterError::Csv {
        path: "<memory>".into(),
        source,
    })?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// Save records as a UTF-8 CSV file.
pub fn save_csv(records: &[Record], path: &Path) -> Result<()> {
    let mut buffer = Vec::new();
    write_csv(records, &mut buffer).map_err(|source| HarvesterError::Csv {
        path: path.to_path_buf(),
        source,
    })?;
    write_atomic(path, &buffer)?;

    tracing::info!(path = %path.display(), records = records.len(), "Saved CSV");
    Ok(())
}

/// Read records from CSV, splitting multi-valued cells on `"; "`.
pub fn read_csv<R: Read>(reader: R) -> std::result::Result<Vec<Record>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(reader);

    reader
        .deserialize::<CsvInputRow>()
        .map(|row| row.map(Record::from))
        .collect()
}

/// Load records from a CSV file.
pub fn load_csv(path: &Path) -> Result<Vec<Record>> {
    let file = std::fs::File::open(path).map_err(|e| HarvesterError::io(path, e))?;
    read_csv(file).map_err(|source| HarvesterError::Csv {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn sample_records() -> Vec<Record> {
        vec![
            Record {
                identifier: "1".to_string(),
                title: "Title 1".to_string(),
                description: "Description, with comma".to_string(),
                types: vec!["Type1".to_string(), "Type2".to_string()],
                subjects: vec!["Art".to_string(), "History".to_string()],
            },
            Record {
                identifier: "2".to_string(),
                title: "Il \"Cenacolo\"".to_string(),
                description: String::new(),
                types: vec!["Type3".to_string()],
                subjects: Vec::new(),
            },
        ]
    }

    #[test]
    fn test_generate_csv() {
        let csv = generate_csv(&sample_records()).unwrap();
        assert_eq!(
            csv,
            concat!(
                "identifier,title,description,type,subject\r\n",
                "1,Title 1,\"Description, with comma\",Type1; Type2,Art; History\r\n",
                "2,\"Il \"\"Cenacolo\"\"\",,Type3,\r\n",
            )
        );
    }

    #[test]
    fn test_generate_csv_empty_writes_header() {
        let csv = generate_csv(&[]).unwrap();
        assert_eq!(csv, "identifier,title,description,type,subject\r\n");
    }

    #[test]
    fn test_read_csv_inverse() {
        let records = sample_records();
        let csv = generate_csv(&records).unwrap();
        assert_eq!(read_csv(csv.as_bytes()).unwrap(), records);
    }

    #[test]
    fn test_read_csv_missing_columns() {
        let input = "identifier,subject\nrec-1,Musica; Teatro\n";
        let records = read_csv(input.as_bytes()).unwrap();
        assert_eq!(
            records,
            vec![Record {
                identifier: "rec-1".to_string(),
                subjects: vec!["Musica".to_string(), "Teatro".to_string()],
                ..Record::default()
            }]
        );
    }

    #[test]
    fn test_save_and_load_csv() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("records.csv");

        save_csv(&sample_records(), &path).unwrap();
        assert_eq!(load_csv(&path).unwrap(), sample_records());
    }

    #[test]
    fn test_load_csv_missing_file() {
        let dir = tempdir().unwrap();
        let err = load_csv(&dir.path().join("missing.csv")).unwrap_err();
        assert!(matches!(err, HarvesterError::Io { .. }));
    }
}
