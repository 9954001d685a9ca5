use polars::prelude::*;

use crate::error::DashError;
use crate::loader::{coerce_datetime_column, coerce_float_column, require_columns};
use crate::schema::output;

/// How rows are bucketed before aggregating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupKey {
    /// Calendar day of a timestamp column; output key column is `DAY`.
    Day(String),
    /// Distinct values of a string column; output key keeps the column name.
    Category(String),
}

impl GroupKey {
    pub fn source_column(&self) -> &str {
        match self {
            Self::Day(c) | Self::Category(c) => c,
        }
    }

    pub fn output_column(&self) -> &str {
        match self {
            Self::Day(_) => output::DAY,
            Self::Category(c) => c,
        }
    }
}

/// Declarative aggregation over a grouped frame.
///
/// Report sections build these; [`aggregate`] executes them per group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregation {
    pub(crate) kind: AggKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AggKind {
    /// Sum of each column, coerced to Float64; output keeps the column names.
    Sum { columns: Vec<String> },
    /// Number of non-null cells of a column.
    Count { column: String, alias: String },
    /// Number of rows in the group.
    Rows { alias: String },
}

impl Aggregation {
    pub fn sum<S: AsRef<str>>(columns: &[S]) -> Self {
        Self {
            kind: AggKind::Sum {
                columns: columns.iter().map(|c| c.as_ref().to_string()).collect(),
            },
        }
    }

    pub fn count(column: &str, alias: &str) -> Self {
        Self {
            kind: AggKind::Count {
                column: column.to_string(),
                alias: alias.to_string(),
            },
        }
    }

    pub fn rows(alias: &str) -> Self {
        Self {
            kind: AggKind::Rows {
                alias: alias.to_string(),
            },
        }
    }

    /// Columns the aggregation reads from the input frame.
    fn inputs(&self) -> Vec<&str> {
        match &self.kind {
            AggKind::Sum { columns } => columns.iter().map(String::as_str).collect(),
            AggKind::Count { column, .. } => vec![column.as_str()],
            AggKind::Rows { .. } => Vec::new(),
        }
    }

    /// Output column names, in order.
    pub fn outputs(&self) -> Vec<&str> {
        match &self.kind {
            AggKind::Sum { columns } => columns.iter().map(String::as_str).collect(),
            AggKind::Count { alias, .. } | AggKind::Rows { alias } => vec![alias.as_str()],
        }
    }

    fn exprs(&self) -> Vec<Expr> {
        match &self.kind {
            AggKind::Sum { columns } => columns.iter().map(|c| col(c.as_str()).sum()).collect(),
            AggKind::Count { column, alias } => vec![col(column.as_str())
                .count()
                .cast(DataType::Float64)
                .alias(alias.as_str())],
            AggKind::Rows { alias } => vec![len().cast(DataType::Float64).alias(alias.as_str())],
        }
    }
}

/// Group `df` by `key` and apply every aggregation.
///
/// Rows whose key is null (including timestamps that failed to parse) do not
/// form a group. The result is sorted by key; the key column is a string
/// (`YYYY-MM-DD` for days) and every measure is Float64.
pub fn aggregate(
    df: &DataFrame,
    key: &GroupKey,
    aggregations: &[Aggregation],
) -> Result<DataFrame, DashError> {
    let mut required = vec![key.source_column()];
    for agg in aggregations {
        required.extend(agg.inputs());
    }
    require_columns(df, &required)?;

    let mut frame = df.clone();
    for agg in aggregations {
        if let AggKind::Sum { columns } = &agg.kind {
            for c in columns {
                frame = coerce_float_column(frame, c)?;
            }
        }
    }

    let key_out = key.output_column();
    let lazy = match key {
        GroupKey::Day(source) => coerce_datetime_column(frame, source)?
            .lazy()
            .with_columns([col(source.as_str()).cast(DataType::Date).alias(key_out)]),
        GroupKey::Category(_) => frame.lazy(),
    };

    let exprs: Vec<Expr> = aggregations.iter().flat_map(Aggregation::exprs).collect();

    let out = lazy
        .filter(col(key_out).is_not_null())
        .group_by([col(key_out)])
        .agg(exprs)
        .sort([key_out], SortMultipleOptions::default())
        .with_columns([col(key_out).cast(DataType::String)])
        .collect()?;

    Ok(out)
}

/// Labels and named numeric series pulled out of an aggregated frame, ready
/// for charting.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesData {
    pub labels: Vec<String>,
    pub series: Vec<(String, Vec<f64>)>,
}

impl SeriesData {
    pub fn from_frame(df: &DataFrame, key: &str, measures: &[&str]) -> Result<Self, DashError> {
        let labels: Vec<String> = df
            .column(key)?
            .str()?
            .into_iter()
            .map(|v| v.unwrap_or_default().to_string())
            .collect();

        let mut series = Vec::with_capacity(measures.len());
        for &m in measures {
            let values: Vec<f64> = df
                .column(m)?
                .f64()?
                .into_iter()
                .map(|v| v.unwrap_or(0.0))
                .collect();
            series.push((m.to_string(), values));
        }
        Ok(Self { labels, series })
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::read_csv_bytes;

    const OPD: &[u8] = b"DATE,TOTAL_ORDERS,PACKED_ORDERS,LOCATION\n\
2025-03-02 10:00:00,5,3,Hyd\n\
2025-03-01 09:00:00,2,2,Hyd\n\
2025-03-01 18:00:00,4,x,Mumbai\n\
not a date,100,100,Hyd\n";

    #[test]
    fn daily_sums_are_sorted_and_skip_bad_dates() {
        let df = read_csv_bytes(OPD).unwrap().frame;
        let out = aggregate(
            &df,
            &GroupKey::Day("DATE".into()),
            &[Aggregation::sum(&["TOTAL_ORDERS", "PACKED_ORDERS"])],
        )
        .unwrap();
        let data = SeriesData::from_frame(&out, output::DAY, &["TOTAL_ORDERS", "PACKED_ORDERS"]).unwrap();
        assert_eq!(data.labels, ["2025-03-01", "2025-03-02"]);
        assert_eq!(data.series[0].1, [6.0, 5.0]);
        assert_eq!(data.series[1].1, [2.0, 3.0]);
    }

    #[test]
    fn category_counts() {
        let df = read_csv_bytes(
            b"RETURN_TYPE,REVERSE_TRACKING_ID\nRTO,T1\nCUSTOMER,T2\nRTO,\nRTO,T4\n,T5\n",
        )
        .unwrap()
        .frame;
        let out = aggregate(
            &df,
            &GroupKey::Category("RETURN_TYPE".into()),
            &[
                Aggregation::count("REVERSE_TRACKING_ID", "TRACKED"),
                Aggregation::rows("ROWS"),
            ],
        )
        .unwrap();
        let data = SeriesData::from_frame(&out, "RETURN_TYPE", &["TRACKED", "ROWS"]).unwrap();
        assert_eq!(data.labels, ["CUSTOMER", "RTO"]);
        assert_eq!(data.series[0].1, [1.0, 2.0]);
        assert_eq!(data.series[1].1, [1.0, 3.0]);
    }

    #[test]
    fn missing_measure_column_is_reported() {
        let df = read_csv_bytes(OPD).unwrap().frame;
        let err = aggregate(
            &df,
            &GroupKey::Day("DATE".into()),
            &[Aggregation::sum(&["DISPATCH_ORDERS"])],
        )
        .unwrap_err();
        assert!(matches!(err, DashError::MissingColumn(c) if c == "DISPATCH_ORDERS"));
    }

    #[test]
    fn outputs_keep_declaration_order() {
        let agg = Aggregation::sum(&["A", "B"]);
        assert_eq!(agg.outputs(), ["A", "B"]);
        assert_eq!(Aggregation::rows("N").outputs(), ["N"]);
    }
}
