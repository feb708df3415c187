// src/gateway/mod.rs

pub mod auth;
pub mod zoho;

#[cfg(test)]
pub(crate) mod fake;

use crate::error::GatewayError;
use crate::models::{BillFilter, BillPage, BillRecord, MonthBill};
use async_trait::async_trait;

/// The slice of the accounting API the duplicate checker needs.
///
/// Every call may fail; callers treat an error as "this source yielded
/// nothing" and move on.
#[async_trait]
pub trait AccountingGateway: Send + Sync {
    async fn list_bills_by_month(
        &self,
        org_id: &str,
        year: i32,
        month: u32,
    ) -> Result<Vec<MonthBill>, GatewayError>;

    /// `Ok(None)` when the bill cannot be retrieved (deleted, unknown id).
    async fn get_bill_details(
        &self,
        org_id: &str,
        bill_id: &str,
    ) -> Result<Option<BillRecord>, GatewayError>;

    async fn search_bills(
        &self,
        org_id: &str,
        filter: &BillFilter,
        page: u32,
        per_page: u32,
    ) -> Result<BillPage, GatewayError>;
}
