//! Multi-sheet XLSX export of per-location pivot tables.

use std::path::Path;

use rust_xlsxwriter::{Format, Workbook, Worksheet};
use tracing::info;

use crate::error::DashError;
use crate::pivot::PivotTable;
use crate::schema::pivot::{COLUMN_TOTAL, ROW_TOTAL};

const MAX_SHEET_NAME: usize = 31;
const INVALID_SHEET_CHARS: [char; 7] = ['[', ']', ':', '*', '?', '/', '\\'];

/// In-memory workbook, one worksheet per location.
pub struct PivotWorkbook {
    workbook: Workbook,
    sheet_names: Vec<String>,
}

impl Default for PivotWorkbook {
    fn default() -> Self {
        Self::new()
    }
}

impl PivotWorkbook {
    pub fn new() -> Self {
        Self {
            workbook: Workbook::new(),
            sheet_names: Vec::new(),
        }
    }

    pub fn sheets_written(&self) -> usize {
        self.sheet_names.len()
    }

    pub fn sheet_names(&self) -> &[String] {
        &self.sheet_names
    }

    /// Add one sheet: header row, one row per pivot row, then the
    /// `Column Total` row. Returns the sheet name actually used.
    ///
    /// The sheet is built detached and only joins the workbook once every
    /// cell is written, so a failure leaves the workbook untouched.
    pub fn add_pivot(&mut self, location: &str, pivot: &PivotTable) -> Result<String, DashError> {
        let name = self.unique_sheet_name(location);
        let header = Format::new().set_bold();

        let mut sheet = Worksheet::new();
        sheet.set_name(&name)?;

        sheet.write_string_with_format(0, 0, &pivot.index_name, &header)?;
        for (c, column) in pivot.columns.iter().enumerate() {
            sheet.write_string_with_format(0, col_index(c + 1)?, column, &header)?;
        }
        let total_col = col_index(pivot.columns.len() + 1)?;
        sheet.write_string_with_format(0, total_col, ROW_TOTAL, &header)?;

        for (r, label) in pivot.rows.iter().enumerate() {
            let row = row_index(r + 1)?;
            sheet.write_string_with_format(row, 0, label, &header)?;
            for (c, value) in pivot.cells[r].iter().enumerate() {
                sheet.write_number(row, col_index(c + 1)?, *value)?;
            }
            sheet.write_number(row, total_col, pivot.row_totals[r])?;
        }

        let last = row_index(pivot.rows.len() + 1)?;
        sheet.write_string_with_format(last, 0, COLUMN_TOTAL, &header)?;
        for (c, value) in pivot.column_totals.iter().enumerate() {
            sheet.write_number(last, col_index(c + 1)?, *value)?;
        }
        sheet.write_number(last, total_col, pivot.grand_total)?;
        sheet.set_column_width(0, 24)?;

        self.workbook.push_worksheet(sheet);
        info!(sheet = %name, rows = pivot.height(), "pivot sheet written");
        self.sheet_names.push(name.clone());
        Ok(name)
    }

    /// Serialize to XLSX bytes. Fails when no sheet was written.
    pub fn to_bytes(&mut self) -> Result<Vec<u8>, DashError> {
        if self.sheet_names.is_empty() {
            return Err(DashError::NotLoaded("no pivot sheets were written".into()));
        }
        Ok(self.workbook.save_to_buffer()?)
    }

    pub fn save(&mut self, path: &Path) -> Result<(), DashError> {
        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    fn unique_sheet_name(&self, location: &str) -> String {
        let base = sanitize_sheet_name(location);
        let taken = |n: &str| self.sheet_names.iter().any(|s| s.eq_ignore_ascii_case(n));
        if !taken(&base) {
            return base;
        }
        (2..)
            .map(|n| {
                let suffix = format!(" ({n})");
                let keep = MAX_SHEET_NAME - suffix.chars().count();
                format!("{}{suffix}", base.chars().take(keep).collect::<String>())
            })
            .find(|candidate| !taken(candidate))
            .unwrap_or(base)
    }
}

/// Excel sheet names: at most 31 characters, none of `[]:*?/\`, no leading
/// or trailing apostrophe, not empty.
///
/// Truncation happens before trimming so a cut can never expose an
/// apostrophe at the end.
pub fn sanitize_sheet_name(raw: &str) -> String {
    let truncated: String = raw
        .chars()
        .map(|c| if INVALID_SHEET_CHARS.contains(&c) { '_' } else { c })
        .take(MAX_SHEET_NAME)
        .collect();
    let cleaned = truncated.trim().trim_matches('\'').trim();
    if cleaned.is_empty() {
        "Sheet".to_string()
    } else {
        cleaned.to_string()
    }
}

fn row_index(i: usize) -> Result<u32, DashError> {
    u32::try_from(i).map_err(|_| DashError::InvalidData(format!("row {i} out of range")))
}

fn col_index(i: usize) -> Result<u16, DashError> {
    u16::try_from(i).map_err(|_| DashError::InvalidData(format!("column {i} out of range")))
}
