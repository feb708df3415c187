// In-memory accounting API for tests.

use super::AccountingGateway;
use crate::error::GatewayError;
use crate::models::{BillFilter, BillPage, BillRecord, BillSummary, MonthBill};
use crate::normalize::normalize;
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::sync::Mutex;

#[derive(Default)]
pub struct FakeGateway {
    pub bills: Vec<BillRecord>,
    pub failing_months: HashSet<(i32, u32)>,
    pub fail_details: bool,
    /// Ids whose detail lookup answers "not found".
    pub missing_details: HashSet<String>,
    pub fail_search: bool,
    pub fail_all: bool,
    /// Pretend the unfiltered listing never ends.
    pub endless_listing: bool,
    pub month_calls: Mutex<Vec<(i32, u32)>>,
    pub detail_calls: Mutex<Vec<String>>,
    pub search_calls: Mutex<Vec<(BillFilter, u32)>>,
}

pub fn bill(id: &str, number: &str, vendor: &str, date: &str) -> BillRecord {
    BillRecord {
        bill_id: id.to_string(),
        bill_number: number.to_string(),
        vendor_id: None,
        vendor_name: vendor.to_string(),
        date: NaiveDate::parse_from_str(date, "%Y-%m-%d").ok(),
        total: Decimal::new(10000, 2),
        currency: "PLN".to_string(),
        branch_id: None,
    }
}

fn outage() -> GatewayError {
    GatewayError::Status {
        status: 503,
        body: "service unavailable".to_string(),
    }
}

impl FakeGateway {
    pub fn with_bills(bills: Vec<BillRecord>) -> Self {
        Self {
            bills,
            ..Default::default()
        }
    }

    pub fn month_call_count(&self) -> usize {
        self.month_calls.lock().unwrap().len()
    }

    pub fn search_call_count(&self) -> usize {
        self.search_calls.lock().unwrap().len()
    }

    fn summary(b: &BillRecord) -> BillSummary {
        BillSummary {
            bill_id: b.bill_id.clone(),
            bill_number: b.bill_number.clone(),
            vendor_id: b.vendor_id.clone(),
            vendor_name: b.vendor_name.clone(),
            date: b.date,
        }
    }
}

#[async_trait]
impl AccountingGateway for FakeGateway {
    async fn list_bills_by_month(
        &self,
        _org_id: &str,
        year: i32,
        month: u32,
    ) -> Result<Vec<MonthBill>, GatewayError> {
        self.month_calls.lock().unwrap().push((year, month));
        if self.fail_all || self.failing_months.contains(&(year, month)) {
            return Err(outage());
        }
        Ok(self
            .bills
            .iter()
            .filter(|b| b.date.is_some_and(|d| d.year() == year && d.month() == month))
            .map(|b| MonthBill {
                bill_number: b.bill_number.clone(),
                bill_id: b.bill_id.clone(),
                has_attachment: false,
                attachment_id: None,
            })
            .collect())
    }

    async fn get_bill_details(
        &self,
        _org_id: &str,
        bill_id: &str,
    ) -> Result<Option<BillRecord>, GatewayError> {
        self.detail_calls.lock().unwrap().push(bill_id.to_string());
        if self.fail_all || self.fail_details {
            return Err(outage());
        }
        if self.missing_details.contains(bill_id) {
            return Ok(None);
        }
        Ok(self.bills.iter().find(|b| b.bill_id == bill_id).cloned())
    }

    async fn search_bills(
        &self,
        _org_id: &str,
        filter: &BillFilter,
        page: u32,
        per_page: u32,
    ) -> Result<BillPage, GatewayError> {
        self.search_calls.lock().unwrap().push((filter.clone(), page));
        if self.fail_all || self.fail_search {
            return Err(outage());
        }

        if self.endless_listing && *filter == BillFilter::All {
            return Ok(BillPage {
                bills: vec![FakeGateway::summary(&bill(
                    &format!("filler-{page}"),
                    &format!("ZZ-{page}"),
                    "Filler",
                    "2020-01-01",
                ))],
                has_more_page: true,
            });
        }

        let matching: Vec<&BillRecord> = self
            .bills
            .iter()
            .filter(|b| match filter {
                BillFilter::NumberContains(n) => b.bill_number.contains(n.as_str()),
                BillFilter::SearchText(t) => {
                    let t = normalize(t);
                    !t.is_empty()
                        && (normalize(&b.bill_number).contains(&t)
                            || normalize(&b.vendor_name).contains(&t))
                }
                BillFilter::All => true,
            })
            .collect();

        let per_page = per_page.max(1) as usize;
        let start = (page.saturating_sub(1) as usize) * per_page;
        let bills: Vec<BillSummary> = matching
            .iter()
            .skip(start)
            .take(per_page)
            .map(|b| FakeGateway::summary(b))
            .collect();
        Ok(BillPage {
            bills,
            has_more_page: start + per_page < matching.len(),
        })
    }
}
