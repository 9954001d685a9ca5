use chrono::NaiveDateTime;
use polars::datatypes::TimeUnit;
use polars::prelude::*;

use crate::error::DashError;
use crate::loader::{distinct_values, parse_number, parse_timestamp, require_columns};
use crate::schema::shipment;

/// One row of a per-location shipment export.
///
/// Timestamps and the item count are `None` when the cell was empty or did
/// not parse; the row itself is always kept.
#[derive(Debug, Clone, PartialEq)]
pub struct Shipment {
    pub sales_channel: Option<String>,
    pub shipment_status: Option<String>,
    pub shipment_id: Option<String>,
    pub expected_rts_at: Option<NaiveDateTime>,
    pub order_created_at: Option<NaiveDateTime>,
    pub order_item_ids: Option<f64>,
}

/// Which sales channels the user kept in the channel multi-select.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ChannelSelection {
    #[default]
    All,
    Only(Vec<String>),
}

impl ChannelSelection {
    pub fn matches(&self, channel: Option<&str>) -> bool {
        match self {
            Self::All => true,
            Self::Only(keep) => channel.is_some_and(|c| keep.iter().any(|k| k == c)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShipmentTable {
    pub rows: Vec<Shipment>,
}

impl ShipmentTable {
    /// Build typed records from a string-typed export frame.
    pub fn from_frame(df: &DataFrame) -> Result<Self, DashError> {
        require_columns(df, &shipment::REQUIRED)?;

        let channel = df.column(shipment::SALES_CHANNEL)?.str()?;
        let status = df.column(shipment::SHIPMENT_STATUS)?.str()?;
        let id = df.column(shipment::SHIPMENT_ID)?.str()?;
        let rts = df.column(shipment::EXPECTED_RTS_AT)?.str()?;
        let created = df.column(shipment::ORDER_CREATED_AT)?.str()?;
        let items = df.column(shipment::ORDER_ITEM_IDS)?.str()?;

        let rows = (0..df.height())
            .map(|i| Shipment {
                sales_channel: channel.get(i).map(str::to_string),
                shipment_status: status.get(i).map(str::to_string),
                shipment_id: id.get(i).map(str::to_string),
                expected_rts_at: rts.get(i).and_then(parse_timestamp),
                order_created_at: created.get(i).and_then(parse_timestamp),
                order_item_ids: items.get(i).and_then(parse_number),
            })
            .collect();

        Ok(Self { rows })
    }

    /// Distinct channels of a raw export, in order of first appearance.
    pub fn channel_options(df: &DataFrame) -> Result<Vec<String>, DashError> {
        distinct_values(df, shipment::SALES_CHANNEL)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn retain_channels(mut self, selection: &ChannelSelection) -> Self {
        self.rows
            .retain(|r| selection.matches(r.sales_channel.as_deref()));
        self
    }

    /// Typed polars view: Datetime(us) timestamps and a Float64 item count.
    pub fn to_dataframe(&self) -> Result<DataFrame, DashError> {
        let datetime = DataType::Datetime(TimeUnit::Microseconds, None);

        let channels: Vec<Option<&str>> =
            self.rows.iter().map(|r| r.sales_channel.as_deref()).collect();
        let statuses: Vec<Option<&str>> =
            self.rows.iter().map(|r| r.shipment_status.as_deref()).collect();
        let ids: Vec<Option<&str>> = self.rows.iter().map(|r| r.shipment_id.as_deref()).collect();
        let rts: Vec<Option<i64>> = self.rows.iter().map(|r| to_micros(r.expected_rts_at)).collect();
        let created: Vec<Option<i64>> =
            self.rows.iter().map(|r| to_micros(r.order_created_at)).collect();
        let items: Vec<Option<f64>> = self.rows.iter().map(|r| r.order_item_ids).collect();

        let rts = Series::new(shipment::EXPECTED_RTS_AT.into(), rts).cast(&datetime)?;
        let created = Series::new(shipment::ORDER_CREATED_AT.into(), created).cast(&datetime)?;

        let df = DataFrame::new(vec![
            Column::new(shipment::SALES_CHANNEL.into(), channels),
            Column::new(shipment::SHIPMENT_STATUS.into(), statuses),
            Column::new(shipment::SHIPMENT_ID.into(), ids),
            rts.into(),
            created.into(),
            Column::new(shipment::ORDER_ITEM_IDS.into(), items),
        ])?;
        Ok(df)
    }
}

fn to_micros(ts: Option<NaiveDateTime>) -> Option<i64> {
    ts.map(|t| t.and_utc().timestamp_micros())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::read_csv_bytes;

    const EXPORT: &[u8] = b"Sales Channel,Shipment Status,Shipment Id,Expected RTS At,Order Created In Eshopbox,Order Item Ids\n\
AMAZON,PACKED,S1,2025-03-14 15:00:00,2025-03-14 11:00:00,2\n\
MEESHO_UNDERATED,CREATED,S2,bad,2025-03-14 09:00:00,x\n";

    #[test]
    fn records_keep_rows_with_invalid_values() {
        let loaded = read_csv_bytes(EXPORT).unwrap();
        let table = ShipmentTable::from_frame(&loaded.frame).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0].order_item_ids, Some(2.0));
        assert!(table.rows[0].expected_rts_at.is_some());
        assert_eq!(table.rows[1].expected_rts_at, None);
        assert_eq!(table.rows[1].order_item_ids, None);
        assert!(table.rows[1].order_created_at.is_some());
    }

    #[test]
    fn missing_status_column_is_reported() {
        let loaded = read_csv_bytes(b"SALES_CHANNEL,SHIPMENT_ID\nAMAZON,S1\n").unwrap();
        let err = ShipmentTable::from_frame(&loaded.frame).unwrap_err();
        assert!(matches!(err, DashError::MissingColumn(c) if c == shipment::SHIPMENT_STATUS));
    }

    #[test]
    fn channel_selection_narrows_rows() {
        let loaded = read_csv_bytes(EXPORT).unwrap();
        let table = ShipmentTable::from_frame(&loaded.frame).unwrap();
        let only = ChannelSelection::Only(vec!["AMAZON".into()]);
        let kept = table.clone().retain_channels(&only);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept.rows[0].shipment_id.as_deref(), Some("S1"));
        assert_eq!(table.retain_channels(&ChannelSelection::All).len(), 2);
    }

    #[test]
    fn typed_frame_has_datetime_and_float_columns() {
        let loaded = read_csv_bytes(EXPORT).unwrap();
        let df = ShipmentTable::from_frame(&loaded.frame)
            .unwrap()
            .to_dataframe()
            .unwrap();
        assert_eq!(df.height(), 2);
        assert!(matches!(
            df.column(shipment::EXPECTED_RTS_AT).unwrap().dtype(),
            DataType::Datetime(_, _)
        ));
        assert_eq!(df.column(shipment::ORDER_ITEM_IDS).unwrap().dtype(), &DataType::Float64);
        assert_eq!(df.column(shipment::EXPECTED_RTS_AT).unwrap().null_count(), 1);
    }
}
