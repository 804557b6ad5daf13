//! In-memory worksheet
//!
//! Clones share the same rows, so a test can hand one clone to the
//! dashboard and inspect the log through another. Writes and reads can be
//! made to fail to exercise the error paths.

use super::{SheetConnector, Worksheet};
use crate::error::{DashboardError, Result};
use std::sync::{Arc, RwLock};

#[derive(Debug, Default)]
struct SheetState {
    rows: Vec<Vec<String>>,
    /// Appends still allowed before every further write fails
    appends_before_failure: Option<usize>,
    fail_reads: bool,
    fail_connect: bool,
    connects: usize,
}

/// Worksheet kept in process memory
#[derive(Debug, Clone)]
pub struct InMemoryWorksheet {
    title: String,
    state: Arc<RwLock<SheetState>>,
}

impl InMemoryWorksheet {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            state: Arc::new(RwLock::new(SheetState::default())),
        }
    }

    /// Create a worksheet pre-filled with `rows`
    pub fn with_rows<I, R, S>(title: &str, rows: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let sheet = Self::new(title);
        sheet.write_state().rows = rows
            .into_iter()
            .map(|row| row.into_iter().map(Into::into).collect())
            .collect();
        sheet
    }

    /// Let `n` more appends succeed, then fail every write
    pub fn fail_after_appends(&self, n: usize) {
        self.write_state().appends_before_failure = Some(n);
    }

    /// Make every read fail (or succeed again)
    pub fn set_fail_reads(&self, fail: bool) {
        self.write_state().fail_reads = fail;
    }

    /// Make `connect` fail (or succeed again)
    pub fn set_fail_connect(&self, fail: bool) {
        self.write_state().fail_connect = fail;
    }

    /// Number of successful `connect` calls
    pub fn connects(&self) -> usize {
        self.read_state().connects
    }

    /// Snapshot of the stored rows
    pub fn rows(&self) -> Vec<Vec<String>> {
        self.read_state().rows.clone()
    }

    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, SheetState> {
        self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_state(&self) -> std::sync::RwLockWriteGuard<'_, SheetState> {
        self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check_write(state: &SheetState) -> Result<()> {
        if state.appends_before_failure == Some(0) {
            return Err(DashboardError::SheetError("write quota exceeded".to_string()));
        }
        Ok(())
    }

    fn check_read(&self) -> Result<()> {
        if self.read_state().fail_reads {
            return Err(DashboardError::SheetError("read failed".to_string()));
        }
        Ok(())
    }
}

impl Worksheet for InMemoryWorksheet {
    fn title(&self) -> &str {
        &self.title
    }

    fn row_count(&self) -> Result<usize> {
        self.check_read()?;
        Ok(self.read_state().rows.len())
    }

    fn row_values(&self, row: usize) -> Result<Vec<String>> {
        self.check_read()?;
        if row == 0 {
            return Err(DashboardError::SheetError("Rows are 1-based".to_string()));
        }
        Ok(self.read_state().rows.get(row - 1).cloned().unwrap_or_default())
    }

    fn insert_row(&mut self, values: &[String], index: usize) -> Result<()> {
        let mut state = self.write_state();
        Self::check_write(&state)?;
        if index == 0 || index > state.rows.len() + 1 {
            return Err(DashboardError::SheetError(format!(
                "Cannot insert at row {} of a {}-row sheet",
                index,
                state.rows.len()
            )));
        }
        state.rows.insert(index - 1, values.to_vec());
        Ok(())
    }

    fn append_row(&mut self, values: &[String]) -> Result<()> {
        let mut state = self.write_state();
        Self::check_write(&state)?;
        if let Some(remaining) = state.appends_before_failure.as_mut() {
            *remaining -= 1;
        }
        state.rows.push(values.to_vec());
        Ok(())
    }

    fn all_values(&self) -> Result<Vec<Vec<String>>> {
        self.check_read()?;
        Ok(self.read_state().rows.clone())
    }
}

impl SheetConnector for InMemoryWorksheet {
    type Sheet = InMemoryWorksheet;

    fn connect(&self) -> Result<InMemoryWorksheet> {
        let mut state = self.write_state();
        if state.fail_connect {
            return Err(DashboardError::SheetError("connection refused".to_string()));
        }
        state.connects += 1;
        Ok(self.clone())
    }
}
