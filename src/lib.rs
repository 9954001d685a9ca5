//! Warehouse operations dashboards over CSV exports.
//!
//! Two pipelines share one core:
//! - per-location shipment pivots (channel x status) after the same-day
//!   cutoff rule, exported as a multi-sheet XLSX workbook;
//! - a multi-report dashboard with KPIs and daily or categorical charts.
//!
//! Build with `--features python` for the Python extension module.

pub mod aggregation;
pub mod config;
pub mod cutoff;
pub mod error;
pub mod loader;
pub mod locations;
pub mod pivot;
pub mod reports;
pub mod schema;
pub mod shipment;
pub mod visualization;
pub mod workbook;

#[cfg(feature = "python")]
mod py_bindings;

pub use aggregation::{aggregate, Aggregation, GroupKey, SeriesData};
pub use config::PipelineConfig;
pub use cutoff::{CutoffAnchor, CutoffRule};
pub use error::DashError;
pub use locations::{run_batch, BatchReport, LocationInput, LocationOutcome, LocationPivot};
pub use pivot::PivotTable;
pub use reports::{Dashboard, Kpis, ReportFilters, ReportSet};
pub use shipment::{ChannelSelection, Shipment, ShipmentTable};
pub use workbook::PivotWorkbook;
