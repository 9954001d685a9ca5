//! Same-day cutoff rule for the marketplace channels.
//!
//! Rows of a named channel only count toward today's work when the order was
//! created before the order cutoff and the shipment is expected ready-to-ship
//! before the RTS cutoff, both on the anchor day. Rows of every other channel
//! pass through untouched.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::shipment::{Shipment, ShipmentTable};

/// Which calendar day the cutoff times are taken on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CutoffAnchor {
    /// The day of the reference "now" passed to [`CutoffRule::apply`].
    #[default]
    ReferenceDay,
    /// Each shipment's own order-creation day.
    OrderDay,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CutoffRule {
    pub special_channels: Vec<String>,
    pub order_cutoff: NaiveTime,
    pub rts_cutoff: NaiveTime,
    pub anchor: CutoffAnchor,
}

impl Default for CutoffRule {
    fn default() -> Self {
        Self {
            special_channels: vec!["MEESHO_UNDERATED".into(), "CRED_FARMLEY_CMUM".into()],
            order_cutoff: NaiveTime::from_hms_opt(11, 59, 0).unwrap_or_default(),
            rts_cutoff: NaiveTime::from_hms_opt(16, 0, 0).unwrap_or_default(),
            anchor: CutoffAnchor::ReferenceDay,
        }
    }
}

impl CutoffRule {
    pub fn is_special(&self, channel: Option<&str>) -> bool {
        channel.is_some_and(|c| self.special_channels.iter().any(|s| s == c))
    }

    /// Whether a named-channel row makes the cutoff. An invalid timestamp
    /// never does.
    pub fn makes_cutoff(&self, row: &Shipment, now: NaiveDateTime) -> bool {
        let (Some(created), Some(rts)) = (row.order_created_at, row.expected_rts_at) else {
            return false;
        };
        let day: NaiveDate = match self.anchor {
            CutoffAnchor::ReferenceDay => now.date(),
            CutoffAnchor::OrderDay => created.date(),
        };
        created < day.and_time(self.order_cutoff) && rts < day.and_time(self.rts_cutoff)
    }

    /// Union of the named-channel rows that make the cutoff and every row of
    /// the other channels. Input order is preserved.
    pub fn apply(&self, rows: &[Shipment], now: NaiveDateTime) -> Vec<Shipment> {
        let mut dropped = 0usize;
        let kept: Vec<Shipment> = rows
            .iter()
            .filter(|row| {
                if !self.is_special(row.sales_channel.as_deref()) {
                    return true;
                }
                let keep = self.makes_cutoff(row, now);
                if !keep {
                    dropped += 1;
                }
                keep
            })
            .cloned()
            .collect();
        debug!(
            input = rows.len(),
            kept = kept.len(),
            dropped_special = dropped,
            "cutoff rule applied"
        );
        kept
    }

    pub fn apply_table(&self, table: ShipmentTable, now: NaiveDateTime) -> ShipmentTable {
        ShipmentTable {
            rows: self.apply(&table.rows, now),
        }
    }
}
