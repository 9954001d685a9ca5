use std::path::Path;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::cutoff::{CutoffAnchor, CutoffRule};
use crate::error::DashError;

/// Default download name of the per-location workbook.
pub const DEFAULT_WORKBOOK_NAME: &str = "pivot_tables_by_location.xlsx";

/// Settings for the per-location pivot pipeline.
///
/// Every field has a default, so a JSON file only needs the keys it changes:
///
/// ```json
/// { "special_channels": ["MEESHO_UNDERATED"], "rts_cutoff": "15:30", "anchor": "order_day" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Channels subject to the same-day cutoff rule.
    pub special_channels: Vec<String>,
    /// Orders must be created strictly before this time (`HH:MM`).
    pub order_cutoff: String,
    /// Expected ready-to-ship must be strictly before this time (`HH:MM`).
    pub rts_cutoff: String,
    pub anchor: CutoffAnchor,
    pub workbook_name: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            special_channels: vec!["MEESHO_UNDERATED".into(), "CRED_FARMLEY_CMUM".into()],
            order_cutoff: "11:59".into(),
            rts_cutoff: "16:00".into(),
            anchor: CutoffAnchor::ReferenceDay,
            workbook_name: DEFAULT_WORKBOOK_NAME.into(),
        }
    }
}

impl PipelineConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, DashError> {
        serde_json::from_str(raw).map_err(|e| DashError::Config(e.to_string()))
    }

    pub fn from_json_file(path: &Path) -> Result<Self, DashError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Validate the cutoff times and build the rule.
    pub fn cutoff_rule(&self) -> Result<CutoffRule, DashError> {
        Ok(CutoffRule {
            special_channels: self.special_channels.clone(),
            order_cutoff: parse_clock(&self.order_cutoff)?,
            rts_cutoff: parse_clock(&self.rts_cutoff)?,
            anchor: self.anchor,
        })
    }
}

fn parse_clock(raw: &str) -> Result<NaiveTime, DashError> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw.trim(), "%H:%M:%S"))
        .map_err(|_| DashError::Config(format!("invalid time of day '{raw}', expected HH:MM")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_warehouse_rule() {
        let rule = PipelineConfig::default().cutoff_rule().unwrap();
        assert_eq!(rule.order_cutoff, NaiveTime::from_hms_opt(11, 59, 0).unwrap());
        assert_eq!(rule.rts_cutoff, NaiveTime::from_hms_opt(16, 0, 0).unwrap());
        assert_eq!(rule.special_channels, ["MEESHO_UNDERATED", "CRED_FARMLEY_CMUM"]);
        assert_eq!(rule.anchor, CutoffAnchor::ReferenceDay);
    }

    #[test]
    fn partial_json_keeps_other_defaults() {
        let cfg = PipelineConfig::from_json_str(r#"{"rts_cutoff": "15:30", "anchor": "order_day"}"#)
            .unwrap();
        assert_eq!(cfg.rts_cutoff, "15:30");
        assert_eq!(cfg.anchor, CutoffAnchor::OrderDay);
        assert_eq!(cfg.order_cutoff, "11:59");
        assert_eq!(cfg.workbook_name, DEFAULT_WORKBOOK_NAME);
    }

    #[test]
    fn bad_clock_is_a_config_error() {
        let cfg = PipelineConfig {
            order_cutoff: "noon".into(),
            ..Default::default()
        };
        assert!(matches!(cfg.cutoff_rule(), Err(DashError::Config(_))));
    }
}
