//! Record serialization to CSV and namespace-free XML.

mod csv_format;
mod xml_format;

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

pub use csv_format::{generate_csv, load_csv, read_csv, save_csv, write_csv, CSV_HEADER};
pub use xml_format::{generate_xml, read_xml_records, save_xml, XML_DECLARATION};

use crate::config::MULTI_VALUE_DELIMITER;
use crate::error::{HarvesterError, Result};

/// Join a multi-valued field into one cell.
///
/// # Examples
/// ```
/// use oai_harvester::output::join_values;
///
/// assert_eq!(join_values(&["Art".to_string(), "History".to_string()]), "Art; History");
/// assert_eq!(join_values(&[]), "");
/// ```
pub fn join_values(values: &[String]) -> String {
    values.join(MULTI_VALUE_DELIMITER)
}

/// Split a cell back into its values. An empty cell has no values.
///
/// A value that itself contains `"; "` cannot be told apart from two
/// values; it comes back split.
///
/// # Examples
/// ```
/// use oai_harvester::output::split_values;
///
/// assert_eq!(split_values("Art; History"), vec!["Art", "History"]);
/// assert!(split_values("").is_empty());
/// ```
pub fn split_values(cell: &str) -> Vec<String> {
    if cell.is_empty() {
        return Vec::new();
    }
    cell.split(MULTI_VALUE_DELIMITER).map(str::to_string).collect()
}

/// Save a response document as received or stripped, with a trailing newline.
pub fn save_document(document: &str, path: &Path) -> Result<()> {
    let mut content = String::with_capacity(document.len() + 1);
    content.push_str(document);
    if !content.ends_with('\n') {
        content.push('\n');
    }
    write_atomic(path, content.as_bytes())?;

    tracing::info!(path = %path.display(), bytes = content.len(), "Saved document");
    Ok(())
}

/// Write `content` to `path` atomically.
///
/// Writes to a hidden temp file next to the target, syncs it to disk, then
/// renames it into place, so partial writes never replace an existing file.
fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| HarvesterError::io(parent, e))?;
    }

    let temp_file = temp_path(path);
    {
        let mut file = File::create(&temp_file).map_err(|e| HarvesterError::io(&temp_file, e))?;
        file.write_all(content)
            .map_err(|e| HarvesterError::io(&temp_file, e))?;
        file.sync_all()
            .map_err(|e| HarvesterError::io(&temp_file, e))?;
    }

    // On Windows, rename fails if the destination already exists
    #[cfg(target_os = "windows")]
    if path.exists() {
        fs::remove_file(path).map_err(|e| HarvesterError::io(path, e))?;
    }

    fs::rename(&temp_file, path).map_err(|e| HarvesterError::io(path, e))?;
    tracing::debug!(path = %path.display(), bytes = content.len(), "Wrote output file");

    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.tmp"))
}
