/// Column-name and file-name constants for the warehouse exports.
/// Names are given in normalized form (uppercase, underscores).

// ── Shipment export columns (per-location upload) ──────────────────────────
pub mod shipment {
    pub const SALES_CHANNEL: &str = "SALES_CHANNEL";
    pub const SHIPMENT_STATUS: &str = "SHIPMENT_STATUS";
    pub const SHIPMENT_ID: &str = "SHIPMENT_ID";
    pub const EXPECTED_RTS_AT: &str = "EXPECTED_RTS_AT";
    pub const ORDER_CREATED_AT: &str = "ORDER_CREATED_IN_ESHOPBOX";
    pub const ORDER_ITEM_IDS: &str = "ORDER_ITEM_IDS";

    pub const REQUIRED: [&str; 6] = [
        SALES_CHANNEL,
        SHIPMENT_STATUS,
        SHIPMENT_ID,
        EXPECTED_RTS_AT,
        ORDER_CREATED_AT,
        ORDER_ITEM_IDS,
    ];
}

// ── Pivot labels ────────────────────────────────────────────────────────────
pub mod pivot {
    pub const ROW_TOTAL: &str = "Row Total";
    pub const COLUMN_TOTAL: &str = "Column Total";
}

// ── Columns shared by the report exports ────────────────────────────────────
pub mod common {
    pub const LOCATION: &str = "LOCATION";
    pub const ALL_LOCATIONS: &str = "ALL";
}

// ── Inventory report ────────────────────────────────────────────────────────
pub mod inventory {
    pub const FILE: &str = "ALL_LOC_Inventory_Report.csv";
    pub const CREATED_AT_DATE: &str = "CREATED_AT_DATE";
    pub const TOTAL_INVENTORY: &str = "TOTAL_INVENTORY";
}

// ── Return report ───────────────────────────────────────────────────────────
pub mod returns {
    pub const FILE: &str = "Return_Report_ALL_Location.csv";
    pub const RETURN_TYPE: &str = "RETURN_TYPE";
    pub const REVERSE_TRACKING_ID: &str = "REVERSE_TRACKING_ID";
    pub const RECEIVED_AT: &str = "RETURN_SHIPMENTS_RECEIVED_AT";
}

// ── Goods-received notes ────────────────────────────────────────────────────
pub mod grn {
    pub const FILE: &str = "GRN_Report_ALL_Location.csv";
    pub const GRN_COMPLETED_AT: &str = "GRN_COMPLETED_AT";
}

// ── Order processing report ─────────────────────────────────────────────────
pub mod opd {
    pub const FILE: &str = "OPD_report.csv";
    pub const DATE: &str = "DATE";
    pub const TOTAL_ORDERS: &str = "TOTAL_ORDERS";
    pub const PACKED_ORDERS: &str = "PACKED_ORDERS";
    pub const DISPATCH_ORDERS: &str = "DISPATCH_ORDERS";
}

// ── SLA breach reports (today and yesterday) ────────────────────────────────
pub mod sla {
    pub const FILE: &str = "SLA_REPORT_ALL.csv";
    pub const YESTERDAY_FILE: &str = "SLA_Yest_REPORT_ALL.csv";
    pub const SHIPMENT_CREATED_IN_FLEX: &str = "SHIPMENT_CREATED_IN_FLEX";
    pub const EXPECTED_RTS_AT: &str = "EXPECTED_RTS_AT";
    pub const PACKED_AT: &str = "PACKED_AT";
    pub const SHIPMENT_STATUS: &str = "SHIPMENT_STATUS";
    pub const SLA: &str = "SLA";
}

// ── Turnaround time report ──────────────────────────────────────────────────
pub mod tat {
    pub const FILE: &str = "All_TAT_Report.csv";
    pub const DATE: &str = "DATE";
    pub const ORDER_TO_INVOICE: &str = "ORDER_TO_INVOICE";
    pub const ORDER_TO_DISPATCH: &str = "ORDER_TO_DISPATCH";
    pub const INVOICE_TO_DISPATCH: &str = "INVOICE_TO_DISPATCH";

    pub const MEASURES: [&str; 3] = [ORDER_TO_INVOICE, ORDER_TO_DISPATCH, INVOICE_TO_DISPATCH];
}

// ── Inward MIS report ───────────────────────────────────────────────────────
pub mod inward {
    pub const FILE: &str = "Inward_MIS_Report.csv";
    pub const RECEIVED_DATE: &str = "RECEIVED_DATE";
    pub const INVOICE_QTY: &str = "INVOICE_QTY";
    pub const GRN_QTY: &str = "GRN_QTY";
}

// ── Aggregate output columns ────────────────────────────────────────────────
pub mod output {
    pub const DAY: &str = "DAY";
    pub const COUNT: &str = "COUNT";
    pub const TOTAL_SHIPMENTS: &str = "TOTAL_SHIPMENTS";
}
