//! Spreadsheet-style storage for the observation log
//!
//! A worksheet is a grid of string cells addressed by 1-based row numbers,
//! matching how spreadsheet services expose a sheet. Rows are only ever
//! appended, except for inserting a header at row 1.
//!
//! # Components
//!
//! - **csv_sheet**: file-backed worksheet, one CSV record per row
//! - **in_memory**: shared in-process worksheet with failure injection

pub mod csv_sheet;
pub mod in_memory;

pub use csv_sheet::{CsvSheetConnector, CsvWorksheet};
pub use in_memory::InMemoryWorksheet;

use crate::error::Result;

/// A single worksheet of an external spreadsheet
pub trait Worksheet {
    /// Worksheet name
    fn title(&self) -> &str;

    /// Number of stored rows (header included)
    fn row_count(&self) -> Result<usize>;

    /// Cells of row `row` (1-based); empty when the row does not exist
    fn row_values(&self, row: usize) -> Result<Vec<String>>;

    /// Insert `values` so that they become row `index` (1-based)
    fn insert_row(&mut self, values: &[String], index: usize) -> Result<()>;

    /// Append `values` after the last row
    fn append_row(&mut self, values: &[String]) -> Result<()>;

    /// Every row, in order
    fn all_values(&self) -> Result<Vec<Vec<String>>>;
}

/// Opens worksheet handles
///
/// Opening may involve credentials or network round trips, so the
/// orchestrator caches the handle for the session.
pub trait SheetConnector {
    type Sheet: Worksheet;

    fn connect(&self) -> Result<Self::Sheet>;
}
