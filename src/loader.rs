//! CSV ingest and value coercion.
//!
//! Every export is read with all columns as strings. Typed views are produced
//! afterwards with the coercion helpers, which turn unparseable cells into
//! nulls instead of failing the load.

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use polars::datatypes::TimeUnit;
use polars::prelude::*;
use tracing::{debug, warn};

use crate::error::DashError;

/// A parsed CSV export.
#[derive(Debug, Clone)]
pub struct LoadedCsv {
    pub frame: DataFrame,
    /// Rows dropped because they had more fields than the header or could
    /// not be decoded.
    pub skipped_rows: usize,
}

/// Read a CSV file from disk.
pub fn read_csv_path(path: &Path) -> Result<LoadedCsv, DashError> {
    let file = std::fs::File::open(path)?;
    let loaded = read_csv(file)?;
    debug!(
        path = %path.display(),
        rows = loaded.frame.height(),
        skipped = loaded.skipped_rows,
        "csv loaded"
    );
    Ok(loaded)
}

/// Read a CSV document held in memory (an uploaded file).
pub fn read_csv_bytes(bytes: &[u8]) -> Result<LoadedCsv, DashError> {
    read_csv(bytes)
}

fn read_csv<R: Read>(source: R) -> Result<LoadedCsv, DashError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(source);

    let headers = rdr.headers()?.clone();
    if headers.is_empty() || headers.iter().all(|h| h.trim().is_empty()) {
        return Err(DashError::InvalidData("CSV has no header row".into()));
    }
    let names = normalize_column_names(headers.iter());
    let width = names.len();

    let mut cells: Vec<Vec<Option<String>>> = vec![Vec::new(); width];
    let mut skipped_rows = 0usize;

    for (line, result) in rdr.records().enumerate() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                warn!(row = line + 1, error = %e, "skipping unreadable csv row");
                skipped_rows += 1;
                continue;
            }
        };
        if record.len() > width {
            warn!(
                row = line + 1,
                fields = record.len(),
                expected = width,
                "skipping malformed csv row"
            );
            skipped_rows += 1;
            continue;
        }
        for (i, column) in cells.iter_mut().enumerate() {
            let value = record
                .get(i)
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string);
            column.push(value);
        }
    }

    let columns: Vec<Column> = names
        .iter()
        .zip(cells.iter())
        .map(|(name, values)| {
            let refs: Vec<Option<&str>> = values.iter().map(|v| v.as_deref()).collect();
            Column::new(name.as_str().into(), refs.as_slice())
        })
        .collect();

    let frame = DataFrame::new(columns)?;
    Ok(LoadedCsv {
        frame,
        skipped_rows,
    })
}

/// Normalize a header cell: trimmed, uppercased, spaces replaced by `_`.
pub fn normalize_column_name(raw: &str) -> String {
    raw.trim_start_matches('\u{feff}')
        .trim()
        .to_uppercase()
        .replace(' ', "_")
}

/// Normalize all header cells, suffixing repeats with `.1`, `.2`, ...
fn normalize_column_names<'a>(raw: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut names = Vec::new();
    for (i, header) in raw.enumerate() {
        let mut name = normalize_column_name(header);
        if name.is_empty() {
            name = format!("UNNAMED_{i}");
        }
        let base = name.clone();
        let mut n = 1;
        while seen.contains(&name) {
            name = format!("{base}.{n}");
            n += 1;
        }
        seen.insert(name.clone());
        names.push(name);
    }
    names
}

/// Fail with `MissingColumn` for the first required column not in `df`.
pub fn require_columns(df: &DataFrame, required: &[&str]) -> Result<(), DashError> {
    for &col_name in required {
        if df.column(col_name).is_err() {
            return Err(DashError::MissingColumn(col_name.to_string()));
        }
    }
    Ok(())
}

// ── Value coercion ──────────────────────────────────────────────────────────

const DATETIME_FORMATS: [&str; 14] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%m-%d-%Y %H:%M:%S",
    "%m-%d-%Y %H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%d-%m-%Y %H:%M",
];

const DATE_FORMATS: [&str; 7] = [
    "%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d/%m/%Y", "%m-%d-%Y", "%d-%m-%Y", "%d-%b-%Y",
];

const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%z"];

/// Parse a timestamp in any of the export formats.
///
/// Slash and dash dates are tried month-first, then day-first. Values carrying a UTC
/// offset keep their wall-clock time. Bare dates map to midnight.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(ts);
        }
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts.naive_local());
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(ts) = DateTime::parse_from_str(s, fmt) {
            return Some(ts.naive_local());
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// Parse a numeric cell. Non-finite values count as unparseable.
pub fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Replace a string column with a Datetime(us) column. Cells that do not
/// parse become null. Columns that are already Datetime are left as is.
pub fn coerce_datetime_column(mut df: DataFrame, column: &str) -> Result<DataFrame, DashError> {
    let source = df.column(column)?;
    if matches!(source.dtype(), DataType::Datetime(_, _)) {
        return Ok(df);
    }
    let values: Vec<Option<i64>> = source
        .str()?
        .into_iter()
        .map(|v| {
            v.and_then(parse_timestamp)
                .map(|ts| ts.and_utc().timestamp_micros())
        })
        .collect();
    let series = Series::new(column.into(), values)
        .cast(&DataType::Datetime(TimeUnit::Microseconds, None))?;
    df.with_column(series)?;
    Ok(df)
}

/// Replace a string column with a Float64 column. Cells that do not parse
/// become null. Columns that are already Float64 are left as is.
pub fn coerce_float_column(mut df: DataFrame, column: &str) -> Result<DataFrame, DashError> {
    let source = df.column(column)?;
    if matches!(source.dtype(), DataType::Float64) {
        return Ok(df);
    }
    let values: Vec<Option<f64>> = source
        .str()?
        .into_iter()
        .map(|v| v.and_then(parse_number))
        .collect();
    df.with_column(Series::new(column.into(), values))?;
    Ok(df)
}

/// Distinct non-null values of a string column, in order of first appearance.
pub fn distinct_values(df: &DataFrame, column: &str) -> Result<Vec<String>, DashError> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for v in df.column(column)?.str()?.into_iter().flatten() {
        if seen.insert(v) {
            out.push(v.to_string());
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    #[test]
    fn headers_are_normalized() {
        let csv = b"Sales Channel, shipment status ,order_item_ids\nAMAZON,PACKED,2\n";
        let loaded = read_csv_bytes(csv).unwrap();
        let names: Vec<String> = loaded
            .frame
            .get_column_names_str()
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(names, ["SALES_CHANNEL", "SHIPMENT_STATUS", "ORDER_ITEM_IDS"]);
    }

    #[test]
    fn long_rows_are_skipped_and_short_rows_padded() {
        let csv = b"A,B,C\n1,2,3\n1,2,3,4\n5,6\n";
        let loaded = read_csv_bytes(csv).unwrap();
        assert_eq!(loaded.skipped_rows, 1);
        assert_eq!(loaded.frame.height(), 2);
        let c = loaded.frame.column("C").unwrap().str().unwrap();
        assert_eq!(c.get(0), Some("3"));
        assert_eq!(c.get(1), None);
    }

    #[test]
    fn duplicate_headers_get_suffixes() {
        let csv = b"date,Date,DATE\n1,2,3\n";
        let loaded = read_csv_bytes(csv).unwrap();
        let names: Vec<&str> = loaded.frame.get_column_names_str();
        assert_eq!(names, ["DATE", "DATE.1", "DATE.2"]);
    }

    #[test]
    fn empty_document_is_rejected() {
        assert!(matches!(
            read_csv_bytes(b""),
            Err(DashError::InvalidData(_)) | Err(DashError::Csv(_))
        ));
    }

    #[test]
    fn require_columns_names_the_missing_one() {
        let loaded = read_csv_bytes(b"SALES_CHANNEL\nX\n").unwrap();
        let err = require_columns(&loaded.frame, &["SALES_CHANNEL", "SHIPMENT_STATUS"]).unwrap_err();
        assert!(matches!(err, DashError::MissingColumn(c) if c == "SHIPMENT_STATUS"));
    }

    #[test]
    fn timestamps_in_export_formats() {
        let expect = NaiveDate::from_ymd_opt(2025, 3, 14)
            .unwrap()
            .and_time(NaiveTime::from_hms_opt(10, 30, 0).unwrap());
        assert_eq!(parse_timestamp("2025-03-14 10:30:00"), Some(expect));
        assert_eq!(parse_timestamp("2025-03-14T10:30:00.000"), Some(expect));
        assert_eq!(parse_timestamp("2025-03-14 10:30"), Some(expect));
        assert_eq!(parse_timestamp("03/14/2025 10:30:00"), Some(expect));
        assert_eq!(parse_timestamp("14/03/2025 10:30"), Some(expect));
        assert_eq!(parse_timestamp("2025-03-14T10:30:00+05:30"), Some(expect));
        assert_eq!(parse_timestamp("03-14-2025 10:30"), Some(expect));
        assert_eq!(parse_timestamp("03-14-2025 10:30:00"), Some(expect));
        assert_eq!(parse_timestamp("14-03-2025 10:30"), Some(expect));
        assert_eq!(
            parse_timestamp("03-14-2025"),
            NaiveDate::from_ymd_opt(2025, 3, 14).unwrap().and_hms_opt(0, 0, 0)
        );
        assert_eq!(
            parse_timestamp("2025-03-14"),
            NaiveDate::from_ymd_opt(2025, 3, 14).unwrap().and_hms_opt(0, 0, 0)
        );
        assert_eq!(parse_timestamp("not a date"), None);
        assert_eq!(parse_timestamp(""), None);
    }

    #[test]
    fn ambiguous_dates_read_the_same_with_either_separator() {
        let slash = parse_timestamp("04/03/2025 10:30");
        assert_eq!(slash, parse_timestamp("04-03-2025 10:30"));
        assert_eq!(
            slash,
            NaiveDate::from_ymd_opt(2025, 4, 3).unwrap().and_hms_opt(10, 30, 0)
        );
    }

    #[test]
    fn numbers_reject_garbage_and_non_finite() {
        assert_eq!(parse_number(" 4 "), Some(4.0));
        assert_eq!(parse_number("2.5"), Some(2.5));
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("inf"), None);
    }

    #[test]
    fn coercion_marks_bad_cells_null() {
        let loaded = read_csv_bytes(b"AT,QTY\n2025-01-01 08:00:00,3\ngarbage,x\n").unwrap();
        let df = coerce_datetime_column(loaded.frame, "AT").unwrap();
        let df = coerce_float_column(df, "QTY").unwrap();
        assert!(matches!(df.column("AT").unwrap().dtype(), DataType::Datetime(_, _)));
        assert_eq!(df.column("AT").unwrap().null_count(), 1);
        let qty = df.column("QTY").unwrap().f64().unwrap();
        assert_eq!(qty.get(0), Some(3.0));
        assert_eq!(qty.get(1), None);
        // a second pass is a no-op
        let again = coerce_datetime_column(df.clone(), "AT").unwrap();
        assert_eq!(again.height(), df.height());
    }

    #[test]
    fn distinct_values_keep_first_appearance_order() {
        let loaded = read_csv_bytes(b"C\nB\nA\nB\n\nC\n").unwrap();
        assert_eq!(distinct_values(&loaded.frame, "C").unwrap(), ["B", "A", "C"]);
    }
}
