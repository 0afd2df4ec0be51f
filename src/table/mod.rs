// src/table/mod.rs

use anyhow::{Context, Result};
use glob::{glob, Pattern};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{info, instrument};

use crate::error::PipelineError;

pub mod delimited;
pub mod xlsx;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    /// Column names, from the first row of the sheet.
    pub headers: Vec<String>,
    /// Each data row as text cells, blanks as empty strings.
    pub rows: Vec<Vec<String>>,
}

/// Something that can parse a spreadsheet file into a `RawTable`.
pub trait TableSource: Send + Sync {
    fn load(&self, path: &Path) -> Result<RawTable>;
}

/// Reads `.xlsx` workbooks (first sheet) and delimited text files.
#[derive(Debug, Clone)]
pub struct SpreadsheetReader {
    pub csv_delimiter: u8,
}

impl Default for SpreadsheetReader {
    fn default() -> Self {
        Self { csv_delimiter: b',' }
    }
}

impl TableSource for SpreadsheetReader {
    fn load(&self, path: &Path) -> Result<RawTable> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "xlsx" | "xlsm" => xlsx::read_first_sheet(path),
            "csv" | "txt" => delimited::read_delimited(path, self.csv_delimiter),
            other => anyhow::bail!("unsupported spreadsheet type `{}`: {}", other, path.display()),
        }
    }
}

/// First file in `dir` (sorted) matching the glob `pattern`.
pub fn locate_spreadsheet(dir: &Path, pattern: &str) -> Result<PathBuf> {
    let full = format!("{}/{}", Pattern::escape(&dir.to_string_lossy()), pattern);
    let mut matches: Vec<PathBuf> = glob(&full)
        .with_context(|| format!("invalid spreadsheet pattern {pattern}"))?
        .filter_map(Result::ok)
        .filter(|p| p.is_file())
        .collect();
    matches.sort();
    matches.into_iter().next().ok_or_else(|| {
        PipelineError::MissingFile {
            pattern: pattern.to_string(),
            dir: dir.to_path_buf(),
        }
        .into()
    })
}

/// Locate, load, then delete the spreadsheet so a rerun never sees it twice.
#[instrument(level = "info", skip(source), fields(dir = %dir.display()))]
pub fn take_spreadsheet(
    source: &dyn TableSource,
    dir: &Path,
    pattern: &str,
) -> Result<(PathBuf, RawTable)> {
    let path = locate_spreadsheet(dir, pattern)?;
    let table = source
        .load(&path)
        .with_context(|| format!("loading {}", path.display()))?;
    info!(file = %path.display(), rows = table.rows.len(), "data loaded");

    fs::remove_file(&path).with_context(|| format!("deleting {}", path.display()))?;
    info!(file = %path.display(), "deleted");
    Ok((path, table))
}
