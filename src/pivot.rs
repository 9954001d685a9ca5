use std::collections::{BTreeMap, BTreeSet};

use polars::prelude::*;

use crate::error::DashError;
use crate::loader::require_columns;
use crate::schema::pivot::{COLUMN_TOTAL, ROW_TOTAL};

/// Cross-tabulation of a summed measure by two categorical keys, with
/// marginal totals.
///
/// Row and column labels are sorted. Combinations that never occur hold 0.
/// Totals are computed once when the table is built.
#[derive(Debug, Clone, PartialEq)]
pub struct PivotTable {
    pub index_name: String,
    pub columns_name: String,
    pub rows: Vec<String>,
    pub columns: Vec<String>,
    /// `cells[r][c]` is the sum for `rows[r]` x `columns[c]`.
    pub cells: Vec<Vec<f64>>,
    pub row_totals: Vec<f64>,
    pub column_totals: Vec<f64>,
    pub grand_total: f64,
}

impl PivotTable {
    /// Build from `(row key, column key, measure)` triples.
    ///
    /// Entries with a missing or empty key do not contribute. A missing
    /// measure still registers its key combination, with nothing added.
    pub fn build<'a, I>(index_name: &str, columns_name: &str, entries: I) -> Self
    where
        I: IntoIterator<Item = (Option<&'a str>, Option<&'a str>, Option<f64>)>,
    {
        let mut sums: BTreeMap<(String, String), f64> = BTreeMap::new();
        let mut row_keys: BTreeSet<String> = BTreeSet::new();
        let mut col_keys: BTreeSet<String> = BTreeSet::new();

        for (row, column, value) in entries {
            let (Some(row), Some(column)) = (non_empty(row), non_empty(column)) else {
                continue;
            };
            row_keys.insert(row.to_string());
            col_keys.insert(column.to_string());
            *sums
                .entry((row.to_string(), column.to_string()))
                .or_insert(0.0) += value.unwrap_or(0.0);
        }

        let rows: Vec<String> = row_keys.into_iter().collect();
        let columns: Vec<String> = col_keys.into_iter().collect();

        let cells: Vec<Vec<f64>> = rows
            .iter()
            .map(|r| {
                columns
                    .iter()
                    .map(|c| sums.get(&(r.clone(), c.clone())).copied().unwrap_or(0.0))
                    .collect()
            })
            .collect();

        let row_totals: Vec<f64> = cells.iter().map(|row| row.iter().sum()).collect();
        let column_totals: Vec<f64> = (0..columns.len())
            .map(|c| cells.iter().map(|row| row[c]).sum())
            .collect();
        let grand_total = row_totals.iter().sum();

        Self {
            index_name: index_name.to_string(),
            columns_name: columns_name.to_string(),
            rows,
            columns,
            cells,
            row_totals,
            column_totals,
            grand_total,
        }
    }

    /// Row count per key combination.
    pub fn count<'a, I>(index_name: &str, columns_name: &str, pairs: I) -> Self
    where
        I: IntoIterator<Item = (Option<&'a str>, Option<&'a str>)>,
    {
        Self::build(
            index_name,
            columns_name,
            pairs.into_iter().map(|(r, c)| (r, c, Some(1.0))),
        )
    }

    /// Pivot a DataFrame: `index` and `columns` are string columns, `values`
    /// is numeric or a string column coerced to Float64.
    pub fn from_frame(
        df: &DataFrame,
        index: &str,
        columns: &str,
        values: &str,
    ) -> Result<Self, DashError> {
        require_columns(df, &[index, columns, values])?;

        let row_keys = df.column(index)?.str()?;
        let col_keys = df.column(columns)?.str()?;
        let measure = df
            .column(values)?
            .as_materialized_series()
            .cast(&DataType::Float64)?;
        let measure = measure.f64()?;

        Ok(Self::build(
            index,
            columns,
            (0..df.height()).map(|i| {
                (
                    row_keys.get(i),
                    col_keys.get(i),
                    measure.get(i).filter(|v| v.is_finite()),
                )
            }),
        ))
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn value(&self, row: &str, column: &str) -> Option<f64> {
        let r = self.rows.iter().position(|x| x == row)?;
        let c = self.columns.iter().position(|x| x == column)?;
        Some(self.cells[r][c])
    }

    pub fn row_total(&self, row: &str) -> Option<f64> {
        let r = self.rows.iter().position(|x| x == row)?;
        Some(self.row_totals[r])
    }

    pub fn column_total(&self, column: &str) -> Option<f64> {
        let c = self.columns.iter().position(|x| x == column)?;
        Some(self.column_totals[c])
    }

    /// Materialize the table, totals included: the index column first, one
    /// Float64 column per key, then `Row Total`; the last row is
    /// `Column Total`.
    ///
    /// A key equal to the index name or `Row Total` gets a `.N` suffix so
    /// the frame's column names stay unique.
    pub fn to_dataframe(&self) -> Result<DataFrame, DashError> {
        let mut labels: Vec<&str> = self.rows.iter().map(String::as_str).collect();
        labels.push(COLUMN_TOTAL);

        let mut taken: Vec<String> = vec![self.index_name.clone(), ROW_TOTAL.to_string()];
        taken.extend(self.columns.iter().cloned());

        let mut frame_columns = vec![Column::new(self.index_name.as_str().into(), labels)];
        for (c, name) in self.columns.iter().enumerate() {
            let mut values: Vec<f64> = self.cells.iter().map(|row| row[c]).collect();
            values.push(self.column_totals[c]);
            let name = if name == &self.index_name || name == ROW_TOTAL {
                let renamed = (1..)
                    .map(|n| format!("{name}.{n}"))
                    .find(|candidate| !taken.contains(candidate))
                    .unwrap_or_else(|| name.clone());
                taken.push(renamed.clone());
                renamed
            } else {
                name.clone()
            };
            frame_columns.push(Column::new(name.into(), values));
        }
        let mut totals = self.row_totals.clone();
        totals.push(self.grand_total);
        frame_columns.push(Column::new(ROW_TOTAL.into(), totals));

        Ok(DataFrame::new(frame_columns)?)
    }
}

fn non_empty(key: Option<&str>) -> Option<&str> {
    key.map(str::trim).filter(|k| !k.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PivotTable {
        PivotTable::build(
            "SALES_CHANNEL",
            "SHIPMENT_STATUS",
            vec![
                (Some("AMAZON"), Some("PACKED"), Some(2.0)),
                (Some("AMAZON"), Some("CREATED"), Some(1.0)),
                (Some("AMAZON"), Some("PACKED"), Some(3.0)),
                (Some("FLIPKART"), Some("CREATED"), Some(4.0)),
                (Some("FLIPKART"), Some("PACKED"), None),
                (None, Some("PACKED"), Some(100.0)),
                (Some("MYNTRA"), Some(""), Some(100.0)),
            ],
        )
    }

    #[test]
    fn labels_are_sorted_and_missing_combinations_are_zero() {
        let p = PivotTable::build(
            "R",
            "C",
            vec![(Some("b"), Some("y"), Some(1.0)), (Some("a"), Some("x"), Some(2.0))],
        );
        assert_eq!(p.rows, ["a", "b"]);
        assert_eq!(p.columns, ["x", "y"]);
        assert_eq!(p.value("a", "y"), Some(0.0));
        assert_eq!(p.value("b", "x"), Some(0.0));
    }

    #[test]
    fn sums_and_totals() {
        let p = sample();
        assert_eq!(p.rows, ["AMAZON", "FLIPKART"]);
        assert_eq!(p.columns, ["CREATED", "PACKED"]);
        assert_eq!(p.value("AMAZON", "PACKED"), Some(5.0));
        assert_eq!(p.value("FLIPKART", "PACKED"), Some(0.0));
        assert_eq!(p.row_total("AMAZON"), Some(6.0));
        assert_eq!(p.column_total("CREATED"), Some(5.0));
        assert_eq!(p.grand_total, 10.0);
    }

    #[test]
    fn totals_match_their_cells() {
        let p = sample();
        for (r, row) in p.cells.iter().enumerate() {
            assert_eq!(p.row_totals[r], row.iter().sum::<f64>());
        }
        for c in 0..p.columns.len() {
            let col_sum: f64 = p.cells.iter().map(|row| row[c]).sum();
            assert_eq!(p.column_totals[c], col_sum);
        }
        assert_eq!(p.grand_total, p.column_totals.iter().sum::<f64>());
    }

    #[test]
    fn counting_ignores_measure() {
        let p = PivotTable::count(
            "R",
            "C",
            vec![(Some("a"), Some("x")), (Some("a"), Some("x")), (Some("a"), Some("y"))],
        );
        assert_eq!(p.value("a", "x"), Some(2.0));
        assert_eq!(p.row_total("a"), Some(3.0));
    }

    #[test]
    fn empty_input_gives_empty_table_with_zero_total() {
        let p = PivotTable::build("R", "C", Vec::<(Option<&str>, Option<&str>, Option<f64>)>::new());
        assert!(p.is_empty());
        assert_eq!(p.grand_total, 0.0);
        let df = p.to_dataframe().unwrap();
        assert_eq!(df.height(), 1);
        assert_eq!(df.width(), 2);
    }

    #[test]
    fn frame_round_trip_includes_totals() {
        let df = DataFrame::new(vec![
            Column::new("CH".into(), ["A", "A", "B"]),
            Column::new("ST".into(), ["X", "Y", "X"]),
            Column::new("N".into(), ["1", "2", "bad"]),
        ])
        .unwrap();
        let p = PivotTable::from_frame(&df, "CH", "ST", "N").unwrap();
        assert_eq!(p.value("A", "Y"), Some(2.0));
        assert_eq!(p.value("B", "X"), Some(0.0));

        let out = p.to_dataframe().unwrap();
        let names: Vec<&str> = out.get_column_names_str();
        assert_eq!(names, ["CH", "X", "Y", ROW_TOTAL]);
        let labels = out.column("CH").unwrap().str().unwrap();
        assert_eq!(labels.get(2), Some(COLUMN_TOTAL));
        let totals = out.column(ROW_TOTAL).unwrap().f64().unwrap();
        assert_eq!(totals.get(0), Some(3.0));
        assert_eq!(totals.get(2), Some(3.0));
    }

    #[test]
    fn keys_named_like_fixed_columns_are_suffixed() {
        let p = PivotTable::build(
            "SALES_CHANNEL",
            "SHIPMENT_STATUS",
            vec![
                (Some("AMAZON"), Some(ROW_TOTAL), Some(1.0)),
                (Some("AMAZON"), Some("SALES_CHANNEL"), Some(2.0)),
                (Some("AMAZON"), Some("Row Total.1"), Some(4.0)),
            ],
        );
        let out = p.to_dataframe().unwrap();
        let names: Vec<&str> = out.get_column_names_str();
        assert_eq!(
            names,
            ["SALES_CHANNEL", "Row Total.2", "Row Total.1", "SALES_CHANNEL.1", ROW_TOTAL]
        );
        let totals = out.column(ROW_TOTAL).unwrap().f64().unwrap();
        assert_eq!(totals.get(0), Some(7.0));
        let renamed = out.column("SALES_CHANNEL.1").unwrap().f64().unwrap();
        assert_eq!(renamed.get(0), Some(2.0));
    }

    #[test]
    fn pivoting_twice_is_identical() {
        let df = DataFrame::new(vec![
            Column::new("CH".into(), ["A", "B", "A"]),
            Column::new("ST".into(), ["X", "X", "Y"]),
            Column::new("N".into(), [1.0, 2.0, 3.0]),
        ])
        .unwrap();
        let first = PivotTable::from_frame(&df, "CH", "ST", "N").unwrap();
        let second = PivotTable::from_frame(&df, "CH", "ST", "N").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn missing_value_column_is_reported() {
        let df = DataFrame::new(vec![Column::new("CH".into(), ["A"])]).unwrap();
        assert!(matches!(
            PivotTable::from_frame(&df, "CH", "ST", "N"),
            Err(DashError::MissingColumn(c)) if c == "ST"
        ));
    }
}
