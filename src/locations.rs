//! Per-location pivot batch.
//!
//! Each uploaded location export is processed on its own: a failure in one
//! (unreadable CSV, missing column) is recorded and the others still produce
//! their sheets.

use std::path::PathBuf;

use chrono::NaiveDateTime;
use tracing::{info, warn};

use crate::cutoff::CutoffRule;
use crate::error::DashError;
use crate::loader::{read_csv_bytes, read_csv_path, LoadedCsv};
use crate::pivot::PivotTable;
use crate::schema::shipment;
use crate::shipment::{ChannelSelection, ShipmentTable};
use crate::workbook::PivotWorkbook;

#[derive(Debug, Clone)]
pub enum LocationSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

#[derive(Debug, Clone)]
pub struct LocationInput {
    pub name: String,
    pub source: LocationSource,
    pub channels: ChannelSelection,
}

impl LocationInput {
    pub fn from_path(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            source: LocationSource::Path(path.into()),
            channels: ChannelSelection::All,
        }
    }

    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            source: LocationSource::Bytes(bytes),
            channels: ChannelSelection::All,
        }
    }

    pub fn with_channels(mut self, channels: ChannelSelection) -> Self {
        self.channels = channels;
        self
    }

    fn load(&self) -> Result<LoadedCsv, DashError> {
        match &self.source {
            LocationSource::Path(path) => read_csv_path(path),
            LocationSource::Bytes(bytes) => read_csv_bytes(bytes),
        }
    }
}

/// The pivots of one location that made it through the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationPivot {
    pub name: String,
    /// Channels offered in the multi-select: every channel of the raw file.
    pub channel_options: Vec<String>,
    /// Sum of order items by channel and status.
    pub pivot: PivotTable,
    /// Row count by channel and status, for the bar chart.
    pub status_counts: PivotTable,
    pub rows_loaded: usize,
    pub rows_kept: usize,
    pub skipped_rows: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LocationOutcome {
    Written {
        sheet_name: String,
        result: LocationPivot,
    },
    Failed {
        name: String,
        reason: String,
    },
}

impl LocationOutcome {
    pub fn name(&self) -> &str {
        match self {
            Self::Written { result, .. } => &result.name,
            Self::Failed { name, .. } => name,
        }
    }
}

/// Run the shipment pipeline for one location, without writing anything.
pub fn process_location(
    input: &LocationInput,
    rule: &CutoffRule,
    now: NaiveDateTime,
) -> Result<LocationPivot, DashError> {
    let loaded = input.load()?;
    let table = ShipmentTable::from_frame(&loaded.frame)?;
    let channel_options = ShipmentTable::channel_options(&loaded.frame)?;
    let rows_loaded = table.len();

    let filtered = rule
        .apply_table(table, now)
        .retain_channels(&input.channels);

    let pivot = PivotTable::build(
        shipment::SALES_CHANNEL,
        shipment::SHIPMENT_STATUS,
        filtered.rows.iter().map(|r| {
            (
                r.sales_channel.as_deref(),
                r.shipment_status.as_deref(),
                r.order_item_ids,
            )
        }),
    );
    let status_counts = PivotTable::count(
        shipment::SALES_CHANNEL,
        shipment::SHIPMENT_STATUS,
        filtered
            .rows
            .iter()
            .map(|r| (r.sales_channel.as_deref(), r.shipment_status.as_deref())),
    );

    Ok(LocationPivot {
        name: input.name.clone(),
        channel_options,
        pivot,
        status_counts,
        rows_loaded,
        rows_kept: filtered.len(),
        skipped_rows: loaded.skipped_rows,
    })
}

/// The outcome of a batch: one entry per input plus the workbook holding a
/// sheet for every successful location.
pub struct BatchReport {
    pub outcomes: Vec<LocationOutcome>,
    pub workbook: PivotWorkbook,
}

impl BatchReport {
    pub fn sheets_written(&self) -> usize {
        self.workbook.sheets_written()
    }

    pub fn written(&self) -> impl Iterator<Item = &LocationPivot> {
        self.outcomes.iter().filter_map(|o| match o {
            LocationOutcome::Written { result, .. } => Some(result),
            LocationOutcome::Failed { .. } => None,
        })
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &str)> {
        self.outcomes.iter().filter_map(|o| match o {
            LocationOutcome::Failed { name, reason } => Some((name.as_str(), reason.as_str())),
            LocationOutcome::Written { .. } => None,
        })
    }

    /// Workbook bytes, or `None` when no location produced a sheet.
    pub fn workbook_bytes(&mut self) -> Option<Result<Vec<u8>, DashError>> {
        if self.sheets_written() == 0 {
            return None;
        }
        Some(self.workbook.to_bytes())
    }
}

/// Process every location in order and collect one sheet per success.
pub fn run_batch(inputs: &[LocationInput], rule: &CutoffRule, now: NaiveDateTime) -> BatchReport {
    let mut workbook = PivotWorkbook::new();
    let mut outcomes = Vec::with_capacity(inputs.len());

    for input in inputs {
        let outcome = process_location(input, rule, now).and_then(|result| {
            let sheet_name = workbook.add_pivot(&input.name, &result.pivot)?;
            Ok(LocationOutcome::Written { sheet_name, result })
        });
        match outcome {
            Ok(written) => {
                info!(location = %input.name, "location processed");
                outcomes.push(written);
            }
            Err(e) => {
                warn!(location = %input.name, error = %e, "location skipped");
                outcomes.push(LocationOutcome::Failed {
                    name: input.name.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    BatchReport { outcomes, workbook }
}
