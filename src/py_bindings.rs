use std::path::PathBuf;

use chrono::{Local, NaiveDate, NaiveDateTime};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::{PyBytes, PyDateTime, PyModule};
use pyo3_polars::PyDataFrame;

use crate::config::{PipelineConfig, DEFAULT_WORKBOOK_NAME};
use crate::cutoff::{CutoffAnchor, CutoffRule};
use crate::error::DashError;
use crate::loader::{read_csv_bytes, read_csv_path};
use crate::locations::{run_batch, LocationInput, LocationOutcome};
use crate::reports::{ReportFilters, ReportSet};
use crate::schema;
use crate::shipment::ChannelSelection;
use crate::visualization::{self, RenderConfig};

// ── Module-level functions ──────────────────────────────────────────────────

/// Load any CSV into a Polars DataFrame with all columns as strings and
/// normalized column names.
#[pyfunction]
fn load_csv(path: &str) -> PyResult<PyDataFrame> {
    let loaded = read_csv_path(&PathBuf::from(path))?;
    Ok(PyDataFrame(loaded.frame))
}

/// Same as `load_csv`, for an uploaded file held in memory.
#[pyfunction]
fn load_csv_bytes(data: &[u8]) -> PyResult<PyDataFrame> {
    let loaded = read_csv_bytes(data)?;
    Ok(PyDataFrame(loaded.frame))
}

/// Reject timezone-aware datetimes; the exports carry local wall-clock times.
fn naive_datetime(value: &Bound<'_, PyDateTime>) -> PyResult<NaiveDateTime> {
    if !value.getattr("tzinfo")?.is_none() {
        return Err(PyValueError::new_err(
            "eshop_dashboard requires naive datetime objects (no timezone info)",
        ));
    }
    value.extract()
}

fn parse_anchor(raw: &str) -> PyResult<CutoffAnchor> {
    match raw.replace('-', "_").as_str() {
        "reference_day" => Ok(CutoffAnchor::ReferenceDay),
        "order_day" => Ok(CutoffAnchor::OrderDay),
        other => Err(PyValueError::new_err(format!(
            "unknown anchor '{other}', expected 'reference_day' or 'order_day'"
        ))),
    }
}

// ── Per-location pivot batch ────────────────────────────────────────────────

#[pyclass]
pub struct PivotBatch {
    config: PipelineConfig,
    inputs: Vec<LocationInput>,
    last_outcomes: Vec<LocationOutcome>,
    last_workbook: Option<Vec<u8>>,
}

#[pymethods]
impl PivotBatch {
    /// Args:
    ///     config_json: optional JSON with any of `special_channels`,
    ///                  `order_cutoff`, `rts_cutoff`, `anchor`, `workbook_name`
    ///     anchor: overrides the anchor day ("reference_day" or "order_day")
    #[new]
    #[pyo3(signature = (config_json=None, anchor=None))]
    fn new(config_json: Option<&str>, anchor: Option<&str>) -> PyResult<Self> {
        let mut config = match config_json {
            Some(raw) => PipelineConfig::from_json_str(raw)?,
            None => PipelineConfig::default(),
        };
        if let Some(anchor) = anchor {
            config.anchor = parse_anchor(anchor)?;
        }
        // fail early on bad cutoff times
        config.cutoff_rule()?;
        Ok(Self {
            config,
            inputs: Vec::new(),
            last_outcomes: Vec::new(),
            last_workbook: None,
        })
    }

    #[pyo3(signature = (name, path, channels=None))]
    fn add_location(&mut self, name: &str, path: &str, channels: Option<Vec<String>>) {
        self.inputs
            .push(LocationInput::from_path(name, path).with_channels(selection(channels)));
    }

    #[pyo3(signature = (name, data, channels=None))]
    fn add_location_bytes(&mut self, name: &str, data: &[u8], channels: Option<Vec<String>>) {
        self.inputs.push(
            LocationInput::from_bytes(name, data.to_vec()).with_channels(selection(channels)),
        );
    }

    /// Distinct sales channels of a location's raw export, for the
    /// multi-select.
    #[staticmethod]
    fn channel_options(data: &[u8]) -> PyResult<Vec<String>> {
        let loaded = read_csv_bytes(data)?;
        Ok(crate::shipment::ShipmentTable::channel_options(&loaded.frame)?)
    }

    /// Process every location added so far.
    ///
    /// Returns `(pivots, failures)`: a dict of location name to pivot
    /// DataFrame (totals included) and a dict of location name to the reason
    /// it was skipped.
    #[pyo3(signature = (now=None))]
    fn run(
        &mut self,
        now: Option<Bound<'_, PyDateTime>>,
    ) -> PyResult<(Vec<(String, PyDataFrame)>, Vec<(String, String)>)> {
        let now = match now {
            Some(dt) => naive_datetime(&dt)?,
            None => Local::now().naive_local(),
        };
        let rule: CutoffRule = self.config.cutoff_rule()?;
        let mut report = run_batch(&self.inputs, &rule, now);

        let mut pivots = Vec::new();
        let mut failures: Vec<(String, String)> = report
            .failures()
            .map(|(name, reason)| (name.to_string(), reason.to_string()))
            .collect();
        for result in report.written() {
            match result.pivot.to_dataframe() {
                Ok(frame) => pivots.push((result.name.clone(), PyDataFrame(frame))),
                Err(e) => failures.push((result.name.clone(), e.to_string())),
            }
        }

        self.last_workbook = report.workbook_bytes().transpose()?;
        self.last_outcomes = report.outcomes;
        Ok((pivots, failures))
    }

    /// XLSX bytes of the last run, or None when no sheet was written.
    fn workbook_bytes<'py>(&self, py: Python<'py>) -> Option<Bound<'py, PyBytes>> {
        self.last_workbook
            .as_ref()
            .map(|bytes| PyBytes::new(py, bytes))
    }

    fn workbook_name(&self) -> String {
        self.config.workbook_name.clone()
    }

    /// HTML page of the last run: pivot tables and status bar charts.
    #[pyo3(signature = (chart_width_px=860, chart_height_px=340))]
    fn render_html(&self, chart_width_px: u32, chart_height_px: u32) -> PyResult<String> {
        if self.last_outcomes.is_empty() {
            return Err(DashError::NotLoaded("no batch has been run".into()).into());
        }
        let config = RenderConfig {
            chart_width_px,
            chart_height_px,
            ..RenderConfig::default()
        };
        Ok(visualization::render_pivot_page(&self.last_outcomes, &config)?)
    }
}

fn selection(channels: Option<Vec<String>>) -> ChannelSelection {
    channels.map_or(ChannelSelection::All, ChannelSelection::Only)
}

// ── Multi-report dashboard ──────────────────────────────────────────────────

#[pyclass]
pub struct ReportDashboard {
    reports: ReportSet,
    filters: ReportFilters,
}

#[pymethods]
impl ReportDashboard {
    /// Load every CSV of `folder`.
    #[new]
    fn new(folder: &str) -> PyResult<Self> {
        Ok(Self {
            reports: ReportSet::load_dir(&PathBuf::from(folder))?,
            filters: ReportFilters::default(),
        })
    }

    fn file_names(&self) -> Vec<String> {
        self.reports.file_names().map(str::to_string).collect()
    }

    fn load_warnings(&self) -> Vec<String> {
        self.reports.warnings.clone()
    }

    /// `ALL` followed by every location found in the reports.
    fn locations(&self) -> PyResult<Vec<String>> {
        Ok(self.reports.locations()?)
    }

    #[pyo3(signature = (start=None, end=None, location=None))]
    fn set_filters(
        &mut self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        location: Option<String>,
    ) -> PyResult<()> {
        let date_range = match (start, end) {
            (Some(s), Some(e)) => Some((s, e)),
            (None, None) => None,
            _ => {
                return Err(PyValueError::new_err(
                    "start and end must be given together",
                ))
            }
        };
        self.filters = ReportFilters {
            date_range,
            location,
        };
        Ok(())
    }

    /// Filtered report table by file name.
    fn table(&self, file_name: &str) -> PyResult<PyDataFrame> {
        let filtered = self.reports.apply_filters(&self.filters)?;
        let df = filtered
            .get(file_name)
            .ok_or_else(|| DashError::NotLoaded(file_name.to_string()))?;
        Ok(PyDataFrame(df.clone()))
    }

    /// KPI tiles as `[(label, value), ...]`.
    fn kpis(&self) -> PyResult<Vec<(String, f64)>> {
        let kpis = self.reports.apply_filters(&self.filters)?.kpis()?;
        Ok(kpis
            .tiles()
            .iter()
            .map(|(label, value)| (label.to_string(), *value))
            .collect())
    }

    /// Aggregated frames behind every chart, as
    /// `[(section_id, chart_title, DataFrame), ...]`, plus all warnings.
    fn sections(&self) -> PyResult<(Vec<(String, String, PyDataFrame)>, Vec<String>)> {
        let dashboard = self.reports.dashboard(&self.filters)?;
        let mut frames = Vec::new();
        let mut warnings = dashboard.warnings.clone();
        for section in dashboard.sections {
            warnings.extend(section.warnings);
            for (title, df) in section.tables {
                frames.push((section.id.clone(), title, PyDataFrame(df)));
            }
        }
        Ok((frames, warnings))
    }

    #[pyo3(signature = (chart_width_px=860, chart_height_px=340))]
    fn render_html(&self, chart_width_px: u32, chart_height_px: u32) -> PyResult<String> {
        let dashboard = self.reports.dashboard(&self.filters)?;
        let config = RenderConfig {
            chart_width_px,
            chart_height_px,
            ..RenderConfig::default()
        };
        Ok(visualization::render_dashboard(&dashboard, &config)?)
    }
}

/// Export column and file names as Python submodules.
fn add_schema_exports(m: &Bound<'_, PyModule>) -> PyResult<()> {
    let shipment = PyModule::new(m.py(), "shipment")?;
    for name in schema::shipment::REQUIRED {
        shipment.add(name, name)?;
    }
    m.add_submodule(&shipment)?;

    let files = PyModule::new(m.py(), "files")?;
    files.add("INVENTORY", schema::inventory::FILE)?;
    files.add("RETURNS", schema::returns::FILE)?;
    files.add("GRN", schema::grn::FILE)?;
    files.add("OPD", schema::opd::FILE)?;
    files.add("SLA", schema::sla::FILE)?;
    files.add("SLA_YESTERDAY", schema::sla::YESTERDAY_FILE)?;
    files.add("TAT", schema::tat::FILE)?;
    files.add("INWARD", schema::inward::FILE)?;
    m.add_submodule(&files)?;

    m.add("DEFAULT_WORKBOOK_NAME", DEFAULT_WORKBOOK_NAME)?;
    Ok(())
}

#[pymodule]
fn eshop_dashboard(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(load_csv, m)?)?;
    m.add_function(wrap_pyfunction!(load_csv_bytes, m)?)?;
    m.add_class::<PivotBatch>()?;
    m.add_class::<ReportDashboard>()?;
    add_schema_exports(m)?;
    Ok(())
}
