use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    pub page_number: u32,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedTable {
    pub page: u32,
    pub rows: Vec<Vec<String>>,
}

/// One order line recovered from a vendor PDF.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderRow {
    pub article_ref: String,
    pub cases_ordered: f64,
    pub unit_qty: f64,
}

pub const ORDER_HEADERS: [&str; 3] = ["Article Ref", "Cases Ordered", "Unit Qty"];
