// src/models.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Full bill as returned by the accounting system's detail endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillRecord {
    pub bill_id: String,
    pub bill_number: String,
    pub vendor_id: Option<String>,
    pub vendor_name: String,
    pub date: Option<NaiveDate>,
    pub total: Decimal,
    pub currency: String,
    pub branch_id: Option<String>,
}

/// One row of the list-bills-by-month endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthBill {
    pub bill_number: String,
    pub bill_id: String,
    pub has_attachment: bool,
    pub attachment_id: Option<String>,
}

/// One row of a paginated bill search.
#[derive(Debug, Clone, PartialEq)]
pub struct BillSummary {
    pub bill_id: String,
    pub bill_number: String,
    pub vendor_id: Option<String>,
    pub vendor_name: String,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default)]
pub struct BillPage {
    pub bills: Vec<BillSummary>,
    pub has_more_page: bool,
}

/// Server-side filter for [`crate::gateway::AccountingGateway::search_bills`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BillFilter {
    NumberContains(String),
    SearchText(String),
    All,
}

/// A contact known to the accounting system, used for vendor lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactCandidate {
    pub contact_id: String,
    pub contact_name: String,
    #[serde(default)]
    pub vat: Option<String>,
}

/// Extracted fields of an incoming document that drive a duplicate check.
#[derive(Debug, Clone, Default)]
pub struct DuplicateCheck {
    pub org_id: String,
    pub bill_number: String,
    pub vendor_id: Option<String>,
    pub vendor_name: Option<String>,
    pub document_date: Option<String>,
    /// Months on each side of the document month; resolver default when `None`.
    pub month_window: Option<u32>,
}

impl DuplicateCheck {
    pub fn new(org_id: impl Into<String>, bill_number: impl Into<String>) -> Self {
        Self {
            org_id: org_id.into(),
            bill_number: bill_number.into(),
            ..Default::default()
        }
    }

    pub fn vendor_id(mut self, vendor_id: impl Into<String>) -> Self {
        self.vendor_id = Some(vendor_id.into());
        self
    }

    pub fn vendor_name(mut self, vendor_name: impl Into<String>) -> Self {
        self.vendor_name = Some(vendor_name.into());
        self
    }

    pub fn document_date(mut self, document_date: impl Into<String>) -> Self {
        self.document_date = Some(document_date.into());
        self
    }

    pub fn month_window(mut self, months: u32) -> Self {
        self.month_window = Some(months);
        self
    }
}
