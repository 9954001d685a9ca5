//! Multi-report dashboard over a folder of warehouse exports.
//!
//! Every CSV of the folder is loaded once, narrowed by the date-range and
//! location filters, then each well-known report file feeds one section of
//! aggregates and charts. A missing file or column only costs its own section.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use chrono::{NaiveDate, NaiveTime};
use polars::datatypes::TimeUnit;
use polars::prelude::*;
use tracing::{debug, info, warn};

use crate::aggregation::{aggregate, Aggregation, GroupKey, SeriesData};
use crate::error::DashError;
use crate::loader::{
    coerce_datetime_column, coerce_float_column, distinct_values, read_csv_path,
};
use crate::schema::{common, grn, inventory, inward, opd, output, returns, sla, tat};
use crate::visualization::{Chart, ChartKind};

/// Per-run narrowing of every report table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportFilters {
    /// Inclusive on both days.
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    /// `None` or `ALL` keeps every location.
    pub location: Option<String>,
}

impl ReportFilters {
    fn location(&self) -> Option<&str> {
        self.location
            .as_deref()
            .filter(|l| !l.eq_ignore_ascii_case(common::ALL_LOCATIONS))
    }
}

/// Report tables keyed by file name, plus load warnings.
#[derive(Debug, Clone, Default)]
pub struct ReportSet {
    tables: BTreeMap<String, DataFrame>,
    pub warnings: Vec<String>,
}

impl ReportSet {
    /// Load every `*.csv` of `dir`. A file that fails to parse becomes a
    /// warning; an unreadable folder is an error.
    pub fn load_dir(dir: &Path) -> Result<Self, DashError> {
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            let is_csv = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
            if is_csv && path.is_file() {
                paths.push(path);
            }
        }
        paths.sort();

        let mut set = Self::default();
        for path in paths {
            let Some(name) = path.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
                continue;
            };
            match read_csv_path(&path) {
                Ok(loaded) => {
                    if loaded.skipped_rows > 0 {
                        set.warnings.push(format!(
                            "{name}: {} malformed rows skipped",
                            loaded.skipped_rows
                        ));
                    }
                    set.tables.insert(name, loaded.frame);
                }
                Err(e) => {
                    warn!(file = %name, error = %e, "report file not loaded");
                    set.warnings.push(format!("Failed to load {name}: {e}"));
                }
            }
        }
        info!(dir = %dir.display(), files = set.tables.len(), "report folder loaded");
        Ok(set)
    }

    pub fn from_tables(tables: impl IntoIterator<Item = (String, DataFrame)>) -> Self {
        Self {
            tables: tables.into_iter().collect(),
            warnings: Vec::new(),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, df: DataFrame) {
        self.tables.insert(name.into(), df);
    }

    pub fn get(&self, name: &str) -> Option<&DataFrame> {
        self.tables.get(name)
    }

    pub fn file_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    /// `ALL` followed by the sorted union of `LOCATION` values.
    pub fn locations(&self) -> Result<Vec<String>, DashError> {
        let mut found = BTreeSet::new();
        for df in self.tables.values() {
            if df.column(common::LOCATION).is_ok() {
                found.extend(distinct_values(df, common::LOCATION)?);
            }
        }
        let mut out = vec![common::ALL_LOCATIONS.to_string()];
        out.extend(found);
        Ok(out)
    }

    /// Apply the date range, then the location, to every table.
    pub fn apply_filters(&self, filters: &ReportFilters) -> Result<Self, DashError> {
        let bounds = match filters.date_range {
            Some((start, end)) => Some(day_bounds(start, end)?),
            None => None,
        };

        let mut tables = BTreeMap::new();
        for (name, df) in &self.tables {
            let before = df.height();
            let mut frame = df.clone();

            if let Some((lower, upper)) = bounds {
                if let Some(date_col) = detect_date_column(&frame) {
                    frame = coerce_datetime_column(frame, &date_col)?;
                    let ts = DataType::Datetime(TimeUnit::Microseconds, None);
                    let mut predicate = col(date_col.as_str()).gt_eq(lit(lower).cast(ts.clone()));
                    if let Some(upper) = upper {
                        predicate = predicate.and(col(date_col.as_str()).lt(lit(upper).cast(ts)));
                    }
                    frame = frame.lazy().filter(predicate).collect()?;
                }
            }

            if let Some(location) = filters.location() {
                if frame.column(common::LOCATION).is_ok() {
                    frame = frame
                        .lazy()
                        .filter(col(common::LOCATION).eq(lit(location)))
                        .collect()?;
                }
            }

            debug!(file = %name, before, after = frame.height(), "filters applied");
            tables.insert(name.clone(), frame);
        }

        Ok(Self {
            tables,
            warnings: self.warnings.clone(),
        })
    }

    pub fn kpis(&self) -> Result<Kpis, DashError> {
        let inventory = self.get(inventory::FILE);
        let opd = self.get(opd::FILE);
        let returns = self.get(returns::FILE);
        Ok(Kpis {
            total_inward: column_sum(inventory, inventory::TOTAL_INVENTORY)?,
            total_dispatch: column_sum(opd, opd::DISPATCH_ORDERS)?,
            return_received: non_null_count(returns, returns::RECEIVED_AT),
            return_processed: non_null_count(returns, returns::RETURN_TYPE),
            total_orders: column_sum(opd, opd::TOTAL_ORDERS)?,
        })
    }

    /// Filter, then build KPIs and every section whose file is present.
    pub fn dashboard(&self, filters: &ReportFilters) -> Result<Dashboard, DashError> {
        let filtered = self.apply_filters(filters)?;
        let mut warnings = filtered.warnings.clone();
        let mut sections = Vec::new();

        for def in section_defs() {
            match filtered.get(def.file) {
                Some(df) => sections.push(def.build(df)),
                None => {
                    warn!(file = def.file, "report file missing");
                    warnings.push(format!("{} not found!", def.file));
                }
            }
        }

        Ok(Dashboard {
            kpis: filtered.kpis()?,
            location: filters
                .location()
                .unwrap_or(common::ALL_LOCATIONS)
                .to_string(),
            sections,
            warnings,
        })
    }
}

/// `[start 00:00, end + 1 day 00:00)` in epoch microseconds. The upper bound
/// is open when `end` is the last representable day.
fn day_bounds(start: NaiveDate, end: NaiveDate) -> Result<(i64, Option<i64>), DashError> {
    if start > end {
        return Err(DashError::InvalidData(format!(
            "date range starts after it ends: {start} > {end}"
        )));
    }
    let micros = |d: NaiveDate| d.and_time(NaiveTime::MIN).and_utc().timestamp_micros();
    Ok((micros(start), end.succ_opt().map(micros)))
}

/// First column with a `DATE` or `AT` token in its name.
pub fn detect_date_column(df: &DataFrame) -> Option<String> {
    df.get_column_names_str()
        .into_iter()
        .find(|name| name.split('_').any(|t| t == "DATE" || t == "AT"))
        .map(str::to_string)
}

fn column_sum(df: Option<&DataFrame>, column: &str) -> Result<f64, DashError> {
    let Some(df) = df.filter(|df| df.column(column).is_ok()) else {
        return Ok(0.0);
    };
    let df = coerce_float_column(df.clone(), column)?;
    Ok(df.column(column)?.f64()?.sum().unwrap_or(0.0))
}

fn non_null_count(df: Option<&DataFrame>, column: &str) -> f64 {
    df.and_then(|df| df.column(column).ok())
        .map(|c| (c.len() - c.null_count()) as f64)
        .unwrap_or(0.0)
}

// ── Dashboard model ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Kpis {
    pub total_inward: f64,
    pub total_dispatch: f64,
    pub return_received: f64,
    pub return_processed: f64,
    pub total_orders: f64,
}

impl Kpis {
    pub fn tiles(&self) -> [(&'static str, f64); 5] {
        [
            ("Total Inward", self.total_inward),
            ("Total Dispatch", self.total_dispatch),
            ("Return Received", self.return_received),
            ("Return Processed", self.return_processed),
            ("Total Orders", self.total_orders),
        ]
    }
}

#[derive(Debug, Clone)]
pub struct Section {
    pub id: String,
    pub title: String,
    pub source_file: String,
    pub charts: Vec<Chart>,
    /// Aggregated frames behind the charts, keyed by chart title.
    pub tables: Vec<(String, DataFrame)>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Dashboard {
    pub kpis: Kpis,
    pub location: String,
    pub sections: Vec<Section>,
    pub warnings: Vec<String>,
}

impl Dashboard {
    pub fn section(&self, id: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.id == id)
    }
}

// ── Section definitions ─────────────────────────────────────────────────────

struct ChartDef {
    title: &'static str,
    kind: ChartKind,
    key: GroupKey,
    aggregations: Vec<Aggregation>,
    colors: &'static [&'static str],
}

impl ChartDef {
    fn new(title: &'static str, kind: ChartKind, key: GroupKey, aggregation: Aggregation) -> Self {
        Self {
            title,
            kind,
            key,
            aggregations: vec![aggregation],
            colors: &[],
        }
    }

    fn colors(mut self, colors: &'static [&'static str]) -> Self {
        self.colors = colors;
        self
    }
}

struct SectionDef {
    id: &'static str,
    title: &'static str,
    file: &'static str,
    charts: Vec<ChartDef>,
}

impl SectionDef {
    fn build(&self, df: &DataFrame) -> Section {
        let mut section = Section {
            id: self.id.to_string(),
            title: self.title.to_string(),
            source_file: self.file.to_string(),
            charts: Vec::new(),
            tables: Vec::new(),
            warnings: Vec::new(),
        };

        for def in &self.charts {
            match build_chart(df, def) {
                Ok((chart, table)) => {
                    section.tables.push((def.title.to_string(), table));
                    section.charts.push(chart);
                }
                Err(DashError::MissingColumn(c)) => {
                    warn!(file = self.file, column = %c, chart = def.title, "chart skipped");
                    section
                        .warnings
                        .push(format!("'{c}' column not found in {}!", self.file));
                }
                Err(e) => {
                    warn!(file = self.file, error = %e, chart = def.title, "chart skipped");
                    section.warnings.push(format!("{}: {e}", def.title));
                }
            }
        }
        section
    }
}

fn build_chart(df: &DataFrame, def: &ChartDef) -> Result<(Chart, DataFrame), DashError> {
    let table = aggregate(df, &def.key, &def.aggregations)?;
    let measures: Vec<&str> = def
        .aggregations
        .iter()
        .flat_map(Aggregation::outputs)
        .collect();
    let data = SeriesData::from_frame(&table, def.key.output_column(), &measures)?;

    let chart = match def.kind {
        ChartKind::Line => Chart::line(def.title, data),
        ChartKind::Bar => Chart::bar(def.title, data).colored_by_category(),
        ChartKind::Donut => Chart::donut(def.title, data),
    };
    Ok((chart.with_colors(def.colors), table))
}

fn day(column: &str) -> GroupKey {
    GroupKey::Day(column.to_string())
}

fn category(column: &str) -> GroupKey {
    GroupKey::Category(column.to_string())
}

fn section_defs() -> Vec<SectionDef> {
    vec![
        SectionDef {
            id: "inventory",
            title: "Total Inventory Trend",
            file: inventory::FILE,
            charts: vec![ChartDef::new(
                "Total Inventory Over Time",
                ChartKind::Line,
                day(inventory::CREATED_AT_DATE),
                Aggregation::sum(&[inventory::TOTAL_INVENTORY]),
            )
            .colors(&["red"])],
        },
        SectionDef {
            id: "orders",
            title: "Total Orders vs Packed Orders vs Dispatched Orders",
            file: opd::FILE,
            charts: vec![ChartDef::new(
                "Order Processing Trends",
                ChartKind::Line,
                day(opd::DATE),
                Aggregation::sum(&[opd::TOTAL_ORDERS, opd::PACKED_ORDERS, opd::DISPATCH_ORDERS]),
            )],
        },
        SectionDef {
            id: "sla",
            title: "Report: Shipment Status",
            file: sla::FILE,
            charts: vec![
                ChartDef::new(
                    "Shipment Status",
                    ChartKind::Bar,
                    category(sla::SHIPMENT_STATUS),
                    Aggregation::rows(output::COUNT),
                ),
                ChartDef::new(
                    "SLA Breach Count",
                    ChartKind::Bar,
                    category(sla::SLA),
                    Aggregation::rows(output::COUNT),
                ),
                ChartDef::new(
                    "Shipments Created per Day",
                    ChartKind::Line,
                    day(sla::SHIPMENT_CREATED_IN_FLEX),
                    Aggregation::rows(output::TOTAL_SHIPMENTS),
                ),
            ],
        },
        SectionDef {
            id: "sla_yesterday",
            title: "SLA Yesterday Report: Yesterday breached",
            file: sla::YESTERDAY_FILE,
            charts: vec![
                ChartDef::new(
                    "Yesterday Breached",
                    ChartKind::Bar,
                    category(sla::SHIPMENT_STATUS),
                    Aggregation::rows(output::COUNT),
                ),
                ChartDef::new(
                    "Yesterday's Shipments Created per Day",
                    ChartKind::Line,
                    day(sla::SHIPMENT_CREATED_IN_FLEX),
                    Aggregation::rows(output::TOTAL_SHIPMENTS),
                ),
            ],
        },
        SectionDef {
            id: "returns",
            title: "Return Types Distribution",
            file: returns::FILE,
            charts: vec![ChartDef::new(
                "Return Types",
                ChartKind::Donut,
                category(returns::RETURN_TYPE),
                Aggregation::count(returns::REVERSE_TRACKING_ID, returns::REVERSE_TRACKING_ID),
            )],
        },
        SectionDef {
            id: "grn",
            title: "GRN Completion",
            file: grn::FILE,
            charts: vec![ChartDef::new(
                "GRNs Completed per Day",
                ChartKind::Line,
                day(grn::GRN_COMPLETED_AT),
                Aggregation::rows(output::COUNT),
            )],
        },
        SectionDef {
            id: "tat",
            title: "Turn Around Time (TAT) Report",
            file: tat::FILE,
            charts: vec![ChartDef::new(
                "Turnaround Time Analysis",
                ChartKind::Line,
                day(tat::DATE),
                Aggregation::sum(&tat::MEASURES),
            )
            .colors(&["#33ffee", "#ffe733", "#ff4733"])],
        },
        SectionDef {
            id: "inward",
            title: "GRN vs Invoice Quantity Report",
            file: inward::FILE,
            charts: vec![ChartDef::new(
                "Goods Received vs Invoiced",
                ChartKind::Line,
                day(inward::RECEIVED_DATE),
                Aggregation::sum(&[inward::INVOICE_QTY, inward::GRN_QTY]),
            )
            .colors(&["#33ffee", "#ff4733"])],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::read_csv_bytes;

    fn frame(csv: &str) -> DataFrame {
        read_csv_bytes(csv.as_bytes()).unwrap().frame
    }

    fn set() -> ReportSet {
        ReportSet::from_tables([
            (
                opd::FILE.to_string(),
                frame(
                    "LOCATION,DATE,TOTAL_ORDERS,PACKED_ORDERS,DISPATCH_ORDERS\n\
                     Hyd,2025-03-01,10,8,7\n\
                     Mumbai,2025-03-01,5,5,5\n\
                     Hyd,2025-03-02,4,4,3\n\
                     Hyd,2025-03-03,1,1,1\n",
                ),
            ),
            (
                returns::FILE.to_string(),
                frame(
                    "LOCATION,RETURN_TYPE,REVERSE_TRACKING_ID,RETURN_SHIPMENTS_RECEIVED_AT\n\
                     Hyd,RTO,T1,2025-03-01 10:00:00\n\
                     Gurgaon,CUSTOMER,T2,\n\
                     Hyd,,T3,2025-03-02 10:00:00\n",
                ),
            ),
        ])
    }

    fn march(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    #[test]
    fn date_column_detection_uses_name_tokens() {
        let df = frame("LOCATION,SHIPMENT_CREATED_IN_FLEX,EXPECTED_RTS_AT\nHyd,x,y\n");
        assert_eq!(detect_date_column(&df).as_deref(), Some("EXPECTED_RTS_AT"));
        let df = frame("LOCATION,QTY\nHyd,1\n");
        assert_eq!(detect_date_column(&df), None);
        let df = frame("CREATED_AT_DATE,TOTAL_INVENTORY\nx,1\n");
        assert_eq!(detect_date_column(&df).as_deref(), Some("CREATED_AT_DATE"));
    }

    #[test]
    fn locations_are_all_then_sorted_union() {
        assert_eq!(set().locations().unwrap(), ["ALL", "Gurgaon", "Hyd", "Mumbai"]);
    }

    #[test]
    fn end_date_includes_the_whole_day() {
        let filters = ReportFilters {
            date_range: Some((march(1), march(2))),
            location: None,
        };
        let filtered = set().apply_filters(&filters).unwrap();
        assert_eq!(filtered.get(opd::FILE).unwrap().height(), 3);
        // the received timestamp on day 2 at 10:00 is still inside the range
        assert_eq!(filtered.get(returns::FILE).unwrap().height(), 2);
    }

    #[test]
    fn location_filter_leaves_other_locations_out() {
        let filters = ReportFilters {
            date_range: None,
            location: Some("Hyd".into()),
        };
        let filtered = set().apply_filters(&filters).unwrap();
        assert_eq!(filtered.get(opd::FILE).unwrap().height(), 3);
        assert_eq!(filtered.get(returns::FILE).unwrap().height(), 2);

        let all = ReportFilters {
            date_range: None,
            location: Some("ALL".into()),
        };
        assert_eq!(set().apply_filters(&all).unwrap().get(opd::FILE).unwrap().height(), 4);
    }

    #[test]
    fn reversed_range_is_rejected() {
        let filters = ReportFilters {
            date_range: Some((march(3), march(1))),
            location: None,
        };
        assert!(matches!(
            set().apply_filters(&filters),
            Err(DashError::InvalidData(_))
        ));
    }

    #[test]
    fn kpis_default_to_zero_for_missing_files() {
        let kpis = set().kpis().unwrap();
        assert_eq!(kpis.total_orders, 20.0);
        assert_eq!(kpis.total_dispatch, 16.0);
        assert_eq!(kpis.return_received, 2.0);
        assert_eq!(kpis.return_processed, 2.0);
        assert_eq!(kpis.total_inward, 0.0);
    }

    #[test]
    fn missing_files_warn_and_present_sections_render() {
        let dashboard = set().dashboard(&ReportFilters::default()).unwrap();
        assert!(dashboard
            .warnings
            .contains(&format!("{} not found!", sla::FILE)));
        assert!(dashboard
            .warnings
            .contains(&format!("{} not found!", inventory::FILE)));

        let orders = dashboard.section("orders").unwrap();
        assert_eq!(orders.charts.len(), 1);
        assert_eq!(orders.charts[0].data.labels, ["2025-03-01", "2025-03-02", "2025-03-03"]);
        assert_eq!(orders.charts[0].data.series[0].1, [15.0, 4.0, 1.0]);

        let ret = dashboard.section("returns").unwrap();
        assert_eq!(ret.charts[0].kind, ChartKind::Donut);
        assert_eq!(ret.charts[0].data.labels, ["CUSTOMER", "RTO"]);
        assert_eq!(dashboard.location, "ALL");
    }

    #[test]
    fn sla_without_sla_column_keeps_the_other_charts() {
        let mut reports = ReportSet::default();
        reports.insert(
            sla::FILE,
            frame(
                "SHIPMENT_CREATED_IN_FLEX,EXPECTED_RTS_AT,PACKED_AT,SHIPMENT_STATUS\n\
                 2025-03-01 09:00:00,2025-03-01 16:00:00,,CREATED\n\
                 2025-03-01 11:00:00,2025-03-01 16:00:00,,PACKED\n\
                 2025-03-02 11:00:00,2025-03-02 16:00:00,,PACKED\n",
            ),
        );
        let dashboard = reports.dashboard(&ReportFilters::default()).unwrap();
        let section = dashboard.section("sla").unwrap();
        assert_eq!(
            section.warnings,
            ["'SLA' column not found in SLA_REPORT_ALL.csv!"]
        );
        let titles: Vec<&str> = section.charts.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, ["Shipment Status", "Shipments Created per Day"]);
        assert_eq!(section.charts[0].data.series[0].1, [1.0, 2.0]);
        assert_eq!(section.charts[1].data.series[0].1, [2.0, 1.0]);
    }
}
