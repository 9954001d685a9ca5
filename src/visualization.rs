/// Visualization module: self-contained HTML dashboards with inline SVG.
///
/// Charts are rendered server-side so the output opens in any browser or can
/// be embedded by a Python front end as raw HTML:
/// - line charts for daily trends (one polyline per measure, with markers)
/// - bar charts, grouped when there is more than one series
/// - donut charts for category shares
///
/// Pages are assembled from pivot tables, KPI tiles, warning banners and
/// charts. All user text is HTML-escaped.
use std::f64::consts::PI;
use std::fmt::Write as FmtWrite;

use crate::aggregation::SeriesData;
use crate::error::DashError;
use crate::locations::LocationOutcome;
use crate::pivot::PivotTable;
use crate::reports::{Dashboard, Kpis};
use crate::schema::pivot::{COLUMN_TOTAL, ROW_TOTAL};

const PALETTE: [&str; 10] = [
    "#636EFA", "#EF553B", "#00CC96", "#AB63FA", "#FFA15A", "#19D3F3", "#FF6692", "#B6E880",
    "#FF97FF", "#FECB52",
];

const PAGE_CSS: &str = r#"
body { background-color: #f5bcbc; font-family: sans-serif; margin: 0; padding: 16px 32px; color: #212529; }
.custom-header { background-color: #4CAF50; color: white; text-align: center; padding: 10px; border-radius: 10px; }
.section { background: #fff; border-radius: 8px; padding: 12px 16px; margin: 16px 0; }
.warning { background: #fff3cd; border: 1px solid #ffe69c; color: #664d03; border-radius: 6px; padding: 8px 12px; margin: 8px 0; }
.error { background: #f8d7da; border: 1px solid #f1aeb5; color: #58151c; border-radius: 6px; padding: 8px 12px; margin: 8px 0; }
.success { background: #d1e7dd; border: 1px solid #a3cfbb; color: #0a3622; border-radius: 6px; padding: 8px 12px; margin: 8px 0; }
.kpis { display: flex; gap: 12px; flex-wrap: wrap; }
.kpi { background: #fff; border-radius: 8px; padding: 10px 16px; min-width: 150px; }
.kpi .label { font-size: 12px; color: #6c757d; }
.kpi .value { font-size: 26px; font-weight: 600; }
table.pivot { border-collapse: collapse; font-size: 13px; }
table.pivot th, table.pivot td { border: 1px solid #dee2e6; padding: 4px 8px; text-align: right; }
table.pivot th { background: #f1f3f5; }
table.pivot tr.total td, table.pivot td.total { font-weight: 600; background: #f8f9fa; }
.chart-title { font-size: 14px; font-weight: 600; fill: #343a40; }
.axis-label { font-size: 10px; fill: #868e96; }
.legend-label { font-size: 11px; fill: #495057; }
"#;

// ── Config ──────────────────────────────────────────────────────────────────

/// Page and chart sizing.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub page_title: String,
    pub chart_width_px: u32,
    pub chart_height_px: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            page_title: "E-Shop Box Warehouse Operational Dashboard".into(),
            chart_width_px: 860,
            chart_height_px: 340,
        }
    }
}

// ── Chart model ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Line,
    Bar,
    Donut,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    pub title: String,
    pub kind: ChartKind,
    pub data: SeriesData,
    /// Per-series colors; series beyond this list use the palette.
    pub colors: Vec<String>,
    /// Single-series bars get one palette color per category.
    pub color_by_category: bool,
}

impl Chart {
    fn new(kind: ChartKind, title: &str, data: SeriesData) -> Self {
        Self {
            title: title.to_string(),
            kind,
            data,
            colors: Vec::new(),
            color_by_category: false,
        }
    }

    pub fn line(title: &str, data: SeriesData) -> Self {
        Self::new(ChartKind::Line, title, data)
    }

    pub fn bar(title: &str, data: SeriesData) -> Self {
        Self::new(ChartKind::Bar, title, data)
    }

    pub fn donut(title: &str, data: SeriesData) -> Self {
        Self::new(ChartKind::Donut, title, data)
    }

    pub fn with_colors(mut self, colors: &[&str]) -> Self {
        self.colors = colors.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn colored_by_category(mut self) -> Self {
        self.color_by_category = true;
        self
    }

    fn series_color(&self, i: usize) -> &str {
        self.colors
            .get(i)
            .map(String::as_str)
            .unwrap_or(PALETTE[i % PALETTE.len()])
    }
}

// ── SVG rendering ───────────────────────────────────────────────────────────

const MARGIN_LEFT: f64 = 64.0;
const MARGIN_RIGHT: f64 = 160.0;
const MARGIN_TOP: f64 = 36.0;
const MARGIN_BOTTOM: f64 = 72.0;

/// Render one chart as an `<svg>` element.
pub fn render_chart_svg(chart: &Chart, config: &RenderConfig) -> Result<String, DashError> {
    let w = config.chart_width_px as f64;
    let h = config.chart_height_px as f64;
    let mut s = String::new();
    write!(
        s,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#
    )?;
    write!(
        s,
        r#"<text class="chart-title" x="{x}" y="20" text-anchor="middle">{t}</text>"#,
        x = w / 2.0,
        t = escape_html(&chart.title)
    )?;

    if chart.data.is_empty() || chart.data.series.is_empty() {
        write!(
            s,
            r#"<text class="axis-label" x="{x}" y="{y}" text-anchor="middle">No data for the current filters.</text>"#,
            x = w / 2.0,
            y = h / 2.0
        )?;
    } else {
        match chart.kind {
            ChartKind::Line => draw_line(&mut s, chart, w, h)?,
            ChartKind::Bar => draw_bars(&mut s, chart, w, h)?,
            ChartKind::Donut => draw_donut(&mut s, chart, w, h)?,
        }
    }
    s.push_str("</svg>");
    Ok(s)
}

/// Y range `[lo, hi]` covering every value, starting at 0 unless negative.
fn value_range(data: &SeriesData) -> (f64, f64) {
    let values = data.series.iter().flat_map(|(_, v)| v.iter().copied());
    let (min, max) = values.fold((0.0f64, 0.0f64), |(lo, hi), v| (lo.min(v), hi.max(v)));
    let hi = nice_ceiling(max.max(min + 1.0));
    let lo = if min < 0.0 { -nice_ceiling(-min) } else { 0.0 };
    (lo, hi)
}

/// Smallest 1/2/2.5/5 x 10^k step multiple that reaches `v` in four ticks.
fn nice_ceiling(v: f64) -> f64 {
    if v <= 0.0 {
        return 1.0;
    }
    let magnitude = 10f64.powf((v / 4.0).log10().floor());
    let step = [1.0, 2.0, 2.5, 5.0, 10.0]
        .iter()
        .map(|m| m * magnitude)
        .find(|step| step * 4.0 >= v)
        .unwrap_or(10.0 * magnitude);
    step * 4.0
}

fn draw_axes(s: &mut String, labels: &[String], lo: f64, hi: f64, w: f64, h: f64, centered: bool) -> std::fmt::Result {
    let plot_w = w - MARGIN_LEFT - MARGIN_RIGHT;
    let plot_h = h - MARGIN_TOP - MARGIN_BOTTOM;
    let bottom = MARGIN_TOP + plot_h;

    for i in 0..=4 {
        let v = lo + (hi - lo) * i as f64 / 4.0;
        let y = bottom - plot_h * i as f64 / 4.0;
        write!(
            s,
            r##"<line x1="{x1}" y1="{y}" x2="{x2}" y2="{y}" stroke="#e9ecef"/><text class="axis-label" x="{tx}" y="{ty}" text-anchor="end">{v}</text>"##,
            x1 = MARGIN_LEFT,
            x2 = MARGIN_LEFT + plot_w,
            tx = MARGIN_LEFT - 6.0,
            ty = y + 3.0,
            v = format_number(v)
        )?;
    }

    let n = labels.len();
    let every = n.div_ceil(12).max(1);
    for (i, label) in labels.iter().enumerate() {
        if i % every != 0 {
            continue;
        }
        let x = x_position(i, n, plot_w, centered);
        write!(
            s,
            r#"<text class="axis-label" transform="translate({x},{y}) rotate(-40)" text-anchor="end">{l}</text>"#,
            y = bottom + 14.0,
            l = escape_html(label)
        )?;
    }
    write!(
        s,
        r##"<line x1="{l}" y1="{b}" x2="{r}" y2="{b}" stroke="#adb5bd"/>"##,
        l = MARGIN_LEFT,
        r = MARGIN_LEFT + plot_w,
        b = bottom
    )
}

fn x_position(i: usize, n: usize, plot_w: f64, centered: bool) -> f64 {
    if centered {
        MARGIN_LEFT + plot_w * (i as f64 + 0.5) / n as f64
    } else if n <= 1 {
        MARGIN_LEFT + plot_w / 2.0
    } else {
        MARGIN_LEFT + plot_w * i as f64 / (n - 1) as f64
    }
}

fn y_position(v: f64, lo: f64, hi: f64, h: f64) -> f64 {
    let plot_h = h - MARGIN_TOP - MARGIN_BOTTOM;
    MARGIN_TOP + plot_h - plot_h * (v - lo) / (hi - lo)
}

fn draw_legend(s: &mut String, entries: &[(String, &str)], w: f64) -> std::fmt::Result {
    let x = w - MARGIN_RIGHT + 16.0;
    for (i, (name, color)) in entries.iter().enumerate() {
        let y = MARGIN_TOP + 8.0 + 18.0 * i as f64;
        write!(
            s,
            r#"<rect x="{x}" y="{ry}" width="12" height="12" fill="{color}"/><text class="legend-label" x="{tx}" y="{ty}">{n}</text>"#,
            ry = y - 10.0,
            tx = x + 18.0,
            ty = y,
            n = escape_html(name)
        )?;
    }
    Ok(())
}

fn draw_line(s: &mut String, chart: &Chart, w: f64, h: f64) -> std::fmt::Result {
    let (lo, hi) = value_range(&chart.data);
    let n = chart.data.labels.len();
    let plot_w = w - MARGIN_LEFT - MARGIN_RIGHT;
    draw_axes(s, &chart.data.labels, lo, hi, w, h, false)?;

    let mut legend = Vec::new();
    for (si, (name, values)) in chart.data.series.iter().enumerate() {
        let color = chart.series_color(si);
        let points: Vec<(f64, f64)> = values
            .iter()
            .enumerate()
            .map(|(i, v)| (x_position(i, n, plot_w, false), y_position(*v, lo, hi, h)))
            .collect();
        let path = points
            .iter()
            .map(|(x, y)| format!("{x:.1},{y:.1}"))
            .collect::<Vec<_>>()
            .join(" ");
        write!(
            s,
            r#"<polyline points="{path}" fill="none" stroke="{color}" stroke-width="2"/>"#
        )?;
        for ((x, y), v) in points.iter().zip(values) {
            write!(
                s,
                r#"<circle cx="{x:.1}" cy="{y:.1}" r="3" fill="{color}"><title>{n}: {v}</title></circle>"#,
                n = escape_html(name),
                v = format_number(*v)
            )?;
        }
        legend.push((name.clone(), color));
    }
    draw_legend(s, &legend, w)
}

fn draw_bars(s: &mut String, chart: &Chart, w: f64, h: f64) -> std::fmt::Result {
    let (lo, hi) = value_range(&chart.data);
    let n = chart.data.labels.len();
    let m = chart.data.series.len();
    let plot_w = w - MARGIN_LEFT - MARGIN_RIGHT;
    draw_axes(s, &chart.data.labels, lo, hi, w, h, true)?;

    let group_w = plot_w / n as f64;
    let bar_w = group_w * 0.8 / m as f64;
    let zero = y_position(0.0, lo, hi, h);
    let by_category = chart.color_by_category && m == 1;

    for (si, (name, values)) in chart.data.series.iter().enumerate() {
        for (i, v) in values.iter().enumerate() {
            let color = if by_category {
                PALETTE[i % PALETTE.len()]
            } else {
                chart.series_color(si)
            };
            let x = MARGIN_LEFT + group_w * i as f64 + group_w * 0.1 + bar_w * si as f64;
            let y = y_position(*v, lo, hi, h);
            write!(
                s,
                r#"<rect x="{x:.1}" y="{top:.1}" width="{bar_w:.1}" height="{height:.1}" fill="{color}"><title>{label} / {n}: {v}</title></rect>"#,
                top = y.min(zero),
                height = (zero - y).abs(),
                label = escape_html(&chart.data.labels[i]),
                n = escape_html(name),
                v = format_number(*v)
            )?;
        }
    }

    let legend: Vec<(String, &str)> = if by_category {
        chart
            .data
            .labels
            .iter()
            .enumerate()
            .map(|(i, l)| (l.clone(), PALETTE[i % PALETTE.len()]))
            .collect()
    } else {
        chart
            .data
            .series
            .iter()
            .enumerate()
            .map(|(i, (name, _))| (name.clone(), chart.series_color(i)))
            .collect()
    };
    draw_legend(s, &legend, w)
}

fn draw_donut(s: &mut String, chart: &Chart, w: f64, h: f64) -> std::fmt::Result {
    let values = &chart.data.series[0].1;
    let total: f64 = values.iter().filter(|v| **v > 0.0).sum();
    let cx = (w - MARGIN_RIGHT) / 2.0;
    let cy = MARGIN_TOP + (h - MARGIN_TOP) / 2.0;
    let outer = ((h - MARGIN_TOP) / 2.0 - 12.0).max(20.0);
    let inner = outer * 0.4;

    if total <= 0.0 {
        return write!(
            s,
            r#"<text class="axis-label" x="{cx}" y="{cy}" text-anchor="middle">No data for the current filters.</text>"#
        );
    }

    let mut legend = Vec::new();
    let mut angle = -PI / 2.0;
    for (i, v) in values.iter().enumerate() {
        if *v <= 0.0 {
            continue;
        }
        let color = chart
            .colors
            .get(i)
            .map(String::as_str)
            .unwrap_or(PALETTE[i % PALETTE.len()]);
        let share = v / total;
        let label = &chart.data.labels[i];
        if share >= 0.9999 {
            write!(
                s,
                r#"<circle cx="{cx:.1}" cy="{cy:.1}" r="{r:.1}" fill="none" stroke="{color}" stroke-width="{sw:.1}"><title>{l}: {v}</title></circle>"#,
                r = (outer + inner) / 2.0,
                sw = outer - inner,
                l = escape_html(label),
                v = format_number(*v)
            )?;
        } else {
            let end = angle + share * 2.0 * PI;
            let large = if share > 0.5 { 1 } else { 0 };
            let (ox0, oy0) = (cx + outer * angle.cos(), cy + outer * angle.sin());
            let (ox1, oy1) = (cx + outer * end.cos(), cy + outer * end.sin());
            let (ix1, iy1) = (cx + inner * end.cos(), cy + inner * end.sin());
            let (ix0, iy0) = (cx + inner * angle.cos(), cy + inner * angle.sin());
            write!(
                s,
                r#"<path d="M{ox0:.2},{oy0:.2} A{outer:.2},{outer:.2} 0 {large} 1 {ox1:.2},{oy1:.2} L{ix1:.2},{iy1:.2} A{inner:.2},{inner:.2} 0 {large} 0 {ix0:.2},{iy0:.2} Z" fill="{color}"><title>{l}: {v}</title></path>"#,
                l = escape_html(label),
                v = format_number(*v)
            )?;
            angle = end;
        }
        legend.push((format!("{label} ({:.1}%)", share * 100.0), color));
    }
    draw_legend(s, &legend, w)
}

// ── HTML pages ──────────────────────────────────────────────────────────────

fn page_start(s: &mut String, title: &str) -> std::fmt::Result {
    write!(
        s,
        r#"<!DOCTYPE html><html><head><meta charset="utf-8"><title>{t}</title><style>{PAGE_CSS}</style></head><body><h1 class="custom-header">{t}</h1>"#,
        t = escape_html(title)
    )
}

fn page_end(s: &mut String) {
    s.push_str("</body></html>");
}

/// Render a pivot table, totals included, as an HTML table.
pub fn render_pivot_table(pivot: &PivotTable) -> Result<String, DashError> {
    let mut s = String::from(r#"<table class="pivot"><thead><tr>"#);
    write!(s, "<th>{}</th>", escape_html(&pivot.index_name))?;
    for c in &pivot.columns {
        write!(s, "<th>{}</th>", escape_html(c))?;
    }
    write!(s, "<th>{ROW_TOTAL}</th></tr></thead><tbody>")?;
    for (r, label) in pivot.rows.iter().enumerate() {
        write!(s, "<tr><th>{}</th>", escape_html(label))?;
        for v in &pivot.cells[r] {
            write!(s, "<td>{}</td>", format_number(*v))?;
        }
        write!(s, r#"<td class="total">{}</td></tr>"#, format_number(pivot.row_totals[r]))?;
    }
    write!(s, r#"<tr class="total"><th>{COLUMN_TOTAL}</th>"#)?;
    for v in &pivot.column_totals {
        write!(s, "<td>{}</td>", format_number(*v))?;
    }
    write!(s, "<td>{}</td></tr></tbody></table>", format_number(pivot.grand_total))?;
    Ok(s)
}

/// Row counts by channel (x axis) and status (one series each).
fn status_count_chart(location: &str, counts: &PivotTable) -> Chart {
    let series = counts
        .columns
        .iter()
        .enumerate()
        .map(|(c, status)| (status.clone(), counts.cells.iter().map(|row| row[c]).collect()))
        .collect();
    Chart::bar(
        &format!("Count of Shipment Status by Sales Channel for {location}"),
        SeriesData {
            labels: counts.rows.clone(),
            series,
        },
    )
}

/// The per-location pivot page: one section per location with its pivot
/// table and status bar chart, or the reason it was skipped.
pub fn render_pivot_page(
    outcomes: &[LocationOutcome],
    config: &RenderConfig,
) -> Result<String, DashError> {
    let mut s = String::new();
    page_start(&mut s, "Channel-wise Status Pivot Tables")?;

    for outcome in outcomes {
        write!(s, r#"<div class="section"><h2>{}</h2>"#, escape_html(outcome.name()))?;
        match outcome {
            LocationOutcome::Written { sheet_name, result } => {
                if result.skipped_rows > 0 {
                    write!(
                        s,
                        r#"<div class="warning">{} malformed rows were skipped.</div>"#,
                        result.skipped_rows
                    )?;
                }
                write!(
                    s,
                    "<p>Pivot Table - Sum of 'ORDER_ITEM_IDS' by Sales Channel and Shipment Status \
                     ({} of {} rows, sheet '{}'):</p>",
                    result.rows_kept,
                    result.rows_loaded,
                    escape_html(sheet_name)
                )?;
                s.push_str(&render_pivot_table(&result.pivot)?);
                let chart = status_count_chart(&result.name, &result.status_counts);
                s.push_str(&render_chart_svg(&chart, config)?);
            }
            LocationOutcome::Failed { reason, .. } => {
                write!(s, r#"<div class="error">{}</div>"#, escape_html(reason))?;
            }
        }
        s.push_str("</div>");
    }

    let written = outcomes
        .iter()
        .filter(|o| matches!(o, LocationOutcome::Written { .. }))
        .count();
    if written == 0 {
        s.push_str(
            r#"<div class="warning">No pivot tables were generated. Please check your uploaded files.</div>"#,
        );
    }
    page_end(&mut s);
    Ok(s)
}

fn render_kpis(s: &mut String, kpis: &Kpis) -> std::fmt::Result {
    s.push_str(r#"<div class="kpis">"#);
    for (label, value) in kpis.tiles() {
        write!(
            s,
            r#"<div class="kpi"><div class="label">{label}</div><div class="value">{v}</div></div>"#,
            v = format_number(value)
        )?;
    }
    s.push_str("</div>");
    Ok(())
}

/// The multi-report dashboard page.
pub fn render_dashboard(dashboard: &Dashboard, config: &RenderConfig) -> Result<String, DashError> {
    let mut s = String::new();
    page_start(&mut s, &config.page_title)?;
    s.push_str("<p>Visualization of Inventory, Returns, and Orders details etc.</p>");
    write!(
        s,
        "<p>Location: <b>{}</b></p>",
        escape_html(&dashboard.location)
    )?;
    render_kpis(&mut s, &dashboard.kpis)?;

    for warning in &dashboard.warnings {
        write!(s, r#"<div class="error">{}</div>"#, escape_html(warning))?;
    }

    for section in &dashboard.sections {
        write!(s, r#"<div class="section"><h2>{}</h2>"#, escape_html(&section.title))?;
        for warning in &section.warnings {
            write!(s, r#"<div class="warning">{}</div>"#, escape_html(warning))?;
        }
        for chart in &section.charts {
            s.push_str(&render_chart_svg(chart, config)?);
        }
        s.push_str("</div>");
    }

    s.push_str(r#"<div class="success">Dashboard successfully loaded!</div>"#);
    page_end(&mut s);
    Ok(s)
}

// ── Formatting helpers ──────────────────────────────────────────────────────

/// Whole numbers without decimals, everything else with two.
pub fn format_number(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{v:.0}")
    } else {
        format!("{v:.2}")
    }
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data() -> SeriesData {
        SeriesData {
            labels: vec!["2025-03-01".into(), "2025-03-02".into()],
            series: vec![
                ("TOTAL_ORDERS".into(), vec![4.0, 6.0]),
                ("PACKED_ORDERS".into(), vec![3.0, 5.5]),
            ],
        }
    }

    #[test]
    fn nice_ceiling_rounds_up_to_readable_steps() {
        assert_eq!(nice_ceiling(6.0), 8.0);
        assert_eq!(nice_ceiling(10.0), 10.0);
        assert_eq!(nice_ceiling(37.0), 40.0);
        assert_eq!(nice_ceiling(0.0), 1.0);
    }

    #[test]
    fn line_chart_has_one_polyline_per_series() {
        let svg = render_chart_svg(&Chart::line("Orders", data()), &RenderConfig::default()).unwrap();
        assert_eq!(svg.matches("<polyline").count(), 2);
        assert_eq!(svg.matches("<circle").count(), 4);
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
    }

    #[test]
    fn bars_and_donut_render() {
        let config = RenderConfig::default();
        let bars = render_chart_svg(&Chart::bar("B", data()), &config).unwrap();
        assert_eq!(bars.matches("<rect").count(), 4 + 2);

        let single = SeriesData {
            labels: vec!["RTO".into(), "CUSTOMER".into()],
            series: vec![("COUNT".into(), vec![3.0, 1.0])],
        };
        let donut = render_chart_svg(&Chart::donut("Return Types", single), &config).unwrap();
        assert_eq!(donut.matches("<path").count(), 2);
        assert!(donut.contains("75.0%"));
    }

    #[test]
    fn single_slice_donut_is_a_ring() {
        let single = SeriesData {
            labels: vec!["RTO".into()],
            series: vec![("COUNT".into(), vec![3.0])],
        };
        let donut = render_chart_svg(&Chart::donut("R", single), &RenderConfig::default()).unwrap();
        assert!(donut.contains("<circle"));
    }

    #[test]
    fn empty_chart_says_so() {
        let empty = SeriesData {
            labels: vec![],
            series: vec![],
        };
        let svg = render_chart_svg(&Chart::line("E", empty), &RenderConfig::default()).unwrap();
        assert!(svg.contains("No data"));
    }

    #[test]
    fn text_is_escaped() {
        let chart = Chart::bar(
            "<script>",
            SeriesData {
                labels: vec!["A&B".into()],
                series: vec![("x".into(), vec![1.0])],
            },
        );
        let svg = render_chart_svg(&chart, &RenderConfig::default()).unwrap();
        assert!(!svg.contains("<script>"));
        assert!(svg.contains("A&amp;B"));
    }

    #[test]
    fn pivot_table_html_has_totals() {
        let pivot = PivotTable::build(
            "SALES_CHANNEL",
            "SHIPMENT_STATUS",
            vec![(Some("AMAZON"), Some("PACKED"), Some(2.5))],
        );
        let html = render_pivot_table(&pivot).unwrap();
        assert!(html.contains(ROW_TOTAL));
        assert!(html.contains(COLUMN_TOTAL));
        assert!(html.contains("2.50"));
    }

    #[test]
    fn numbers_format_compactly() {
        assert_eq!(format_number(12.0), "12");
        assert_eq!(format_number(2.5), "2.50");
        assert_eq!(format_number(-3.0), "-3");
    }
}
