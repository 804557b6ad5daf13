//! CSV-file backed worksheet
//!
//! Appends go through an append-mode file handle so existing rows are never
//! rewritten. Inserting a row (the header) is the one operation that rewrites
//! the file, through a temporary file and a rename.

use super::{SheetConnector, Worksheet};
use crate::error::{DashboardError, Result};
use csv::{ReaderBuilder, WriterBuilder};
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Worksheet stored as a CSV file
#[derive(Debug, Clone)]
pub struct CsvWorksheet {
    path: PathBuf,
    title: String,
}

impl CsvWorksheet {
    /// Open a worksheet, creating an empty file (and parent directories) if missing
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        if !path.exists() {
            File::create(&path)?;
            log::info!("Created empty worksheet at {}", path.display());
        }

        Ok(Self::at(path))
    }

    /// Open a worksheet only if its file already exists
    ///
    /// Nothing is created on disk; `None` means there is no log yet.
    pub fn open_existing<P: AsRef<Path>>(path: P) -> Option<Self> {
        let path = path.as_ref();
        path.is_file().then(|| Self::at(path.to_path_buf()))
    }

    fn at(path: PathBuf) -> Self {
        let title = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Sheet1".to_string());
        Self { path, title }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_rows(&self) -> Result<Vec<Vec<String>>> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(&self.path)?;

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(str::to_string).collect());
        }
        Ok(rows)
    }

    fn write_rows(&self, rows: &[Vec<String>]) -> Result<()> {
        let tmp_path = self.path.with_extension("csv.tmp");
        {
            let mut writer = WriterBuilder::new()
                .has_headers(false)
                .flexible(true)
                .from_path(&tmp_path)?;
            for row in rows {
                writer.write_record(row)?;
            }
            writer.flush()?;
        }
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

impl Worksheet for CsvWorksheet {
    fn title(&self) -> &str {
        &self.title
    }

    fn row_count(&self) -> Result<usize> {
        Ok(self.read_rows()?.len())
    }

    fn row_values(&self, row: usize) -> Result<Vec<String>> {
        if row == 0 {
            return Err(DashboardError::SheetError("Rows are 1-based".to_string()));
        }
        Ok(self
            .read_rows()?
            .into_iter()
            .nth(row - 1)
            .unwrap_or_default())
    }

    fn insert_row(&mut self, values: &[String], index: usize) -> Result<()> {
        let mut rows = self.read_rows()?;
        if index == 0 || index > rows.len() + 1 {
            return Err(DashboardError::SheetError(format!(
                "Cannot insert at row {} of a {}-row sheet",
                index,
                rows.len()
            )));
        }
        rows.insert(index - 1, values.to_vec());
        self.write_rows(&rows)
    }

    fn append_row(&mut self, values: &[String]) -> Result<()> {
        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .open(&self.path)?;

        // a last row without a terminator must not absorb the new one
        if file.metadata()?.len() > 0 {
            let mut last = [0u8; 1];
            file.seek(SeekFrom::End(-1))?;
            file.read_exact(&mut last)?;
            if last[0] != b'\n' && last[0] != b'\r' {
                file.write_all(b"\n")?;
            }
        }

        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_writer(file);
        writer.write_record(values)?;
        writer.flush()?;
        Ok(())
    }

    fn all_values(&self) -> Result<Vec<Vec<String>>> {
        self.read_rows()
    }
}

/// Connector opening a `CsvWorksheet` at a fixed path
#[derive(Debug, Clone)]
pub struct CsvSheetConnector {
    path: PathBuf,
}

impl CsvSheetConnector {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

impl SheetConnector for CsvSheetConnector {
    type Sheet = CsvWorksheet;

    fn connect(&self) -> Result<CsvWorksheet> {
        CsvWorksheet::open(&self.path)
    }
}
