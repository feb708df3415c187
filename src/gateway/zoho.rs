// src/gateway/zoho.rs

use super::AccountingGateway;
use super::auth::TokenProvider;
use crate::error::GatewayError;
use crate::models::{BillFilter, BillPage, BillRecord, BillSummary, MonthBill};
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use reqwest::{Client, StatusCode, Url};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Pages followed when listing one month.
const MONTH_PAGE_CAP: u32 = 10;
const MONTH_PER_PAGE: u32 = 200;

#[derive(Debug, Deserialize)]
struct BillsResponse {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
    bills: Option<Vec<WireBill>>,
    #[serde(default)]
    page_context: PageContext,
}

#[derive(Debug, Default, Deserialize)]
struct PageContext {
    #[serde(default)]
    has_more_page: bool,
}

#[derive(Debug, Deserialize)]
struct BillResponse {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
    bill: Option<WireBill>,
}

/// Bill as Zoho sends it, in list and detail payloads alike.
#[derive(Debug, Deserialize)]
struct WireBill {
    bill_id: String,
    #[serde(default)]
    bill_number: String,
    #[serde(default)]
    vendor_id: Option<String>,
    #[serde(default)]
    vendor_name: String,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    has_attachment: bool,
    #[serde(default)]
    total: f64,
    #[serde(default)]
    currency_code: String,
    #[serde(default)]
    branch_id: Option<String>,
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.filter(|s| !s.trim().is_empty())
}

impl WireBill {
    fn parsed_date(&self) -> Option<NaiveDate> {
        self.date
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
    }

    fn into_month_bill(self) -> MonthBill {
        // Zoho serves a bill's attachment under the bill id itself.
        let attachment_id = self.has_attachment.then(|| self.bill_id.clone());
        MonthBill {
            bill_number: self.bill_number,
            bill_id: self.bill_id,
            has_attachment: self.has_attachment,
            attachment_id,
        }
    }

    fn into_summary(self) -> BillSummary {
        let date = self.parsed_date();
        BillSummary {
            bill_id: self.bill_id,
            bill_number: self.bill_number,
            vendor_id: non_empty(self.vendor_id),
            vendor_name: self.vendor_name,
            date,
        }
    }

    fn into_record(self) -> BillRecord {
        let date = self.parsed_date();
        BillRecord {
            total: Decimal::from_f64(self.total).unwrap_or_default(),
            bill_id: self.bill_id,
            bill_number: self.bill_number,
            vendor_id: non_empty(self.vendor_id),
            vendor_name: self.vendor_name,
            date,
            currency: self.currency_code,
            branch_id: non_empty(self.branch_id),
        }
    }
}

fn parse_bills_page(body: &str) -> Result<(Vec<WireBill>, bool), GatewayError> {
    let resp: BillsResponse =
        serde_json::from_str(body).map_err(|e| GatewayError::Decode(e.to_string()))?;
    match resp.bills {
        Some(bills) if resp.code == 0 => Ok((bills, resp.page_context.has_more_page)),
        _ => Err(GatewayError::Decode(format!(
            "no bills in response (code {}): {}",
            resp.code, resp.message
        ))),
    }
}

fn parse_bill(body: &str) -> Result<Option<BillRecord>, GatewayError> {
    let resp: BillResponse =
        serde_json::from_str(body).map_err(|e| GatewayError::Decode(e.to_string()))?;
    if resp.code != 0 {
        warn!(code = resp.code, message = %resp.message, "Bill detail not returned");
        return Ok(None);
    }
    Ok(resp.bill.map(WireBill::into_record))
}

fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((first, next.pred_opt()?))
}

/// Fetch pages `1..=cap` until one reports no more. The flag is set when the
/// listing was cut off at the cap.
async fn follow_pages<T, F, Fut>(cap: u32, mut fetch: F) -> Result<(Vec<T>, bool), GatewayError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<(Vec<T>, bool), GatewayError>>,
{
    let mut out = Vec::new();
    for page in 1..=cap {
        let (items, has_more) = fetch(page).await?;
        out.extend(items);
        if !has_more {
            return Ok((out, false));
        }
    }
    Ok((out, cap > 0))
}

/// Zoho Books v3 REST client.
pub struct ZohoBooksClient {
    client: Client,
    base_url: String,
    tokens: Arc<TokenProvider>,
}

impl ZohoBooksClient {
    pub fn new(client: Client, base_url: impl Into<String>, tokens: Arc<TokenProvider>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            tokens,
        }
    }

    /// HTTP client with the request timeout applied.
    pub fn http_client(timeout_secs: u64) -> Result<Client, GatewayError> {
        Ok(Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?)
    }

    /// GET with the OAuth header; one retry with a fresh token after a 401.
    /// A 404 yields `Ok(None)`.
    async fn get_text(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<Option<String>, GatewayError> {
        let url = Url::parse_with_params(&format!("{}{}", self.base_url, path), params)
            .map_err(|e| GatewayError::Decode(format!("bad url: {e}")))?;

        for attempt in 0..2 {
            let token = self.tokens.access_token().await?;
            debug!(url = %url, attempt, "Zoho GET");
            let resp = self
                .client
                .get(url.clone())
                .header("Authorization", format!("Zoho-oauthtoken {token}"))
                .send()
                .await?;

            match resp.status() {
                StatusCode::UNAUTHORIZED => {
                    info!("Zoho token expired, refreshing");
                    self.tokens.invalidate().await;
                    continue;
                }
                StatusCode::NOT_FOUND => return Ok(None),
                status if !status.is_success() => {
                    let body = resp.text().await.unwrap_or_default();
                    return Err(GatewayError::Status {
                        status: status.as_u16(),
                        body,
                    });
                }
                _ => return Ok(Some(resp.text().await?)),
            }
        }
        Err(GatewayError::Unauthorized)
    }

    async fn list_page(
        &self,
        params: &[(&str, String)],
    ) -> Result<(Vec<WireBill>, bool), GatewayError> {
        match self.get_text("/bills", params).await? {
            Some(body) => parse_bills_page(&body),
            None => Ok((Vec::new(), false)),
        }
    }
}

#[async_trait]
impl AccountingGateway for ZohoBooksClient {
    async fn list_bills_by_month(
        &self,
        org_id: &str,
        year: i32,
        month: u32,
    ) -> Result<Vec<MonthBill>, GatewayError> {
        let Some((first, last)) = month_bounds(year, month) else {
            return Ok(Vec::new());
        };
        info!(org_id = %org_id, year = first.year(), month = first.month(), "Listing bills for month");

        let date_start = first.format("%Y-%m-%d").to_string();
        let date_end = last.format("%Y-%m-%d").to_string();
        let (bills, truncated) = follow_pages(MONTH_PAGE_CAP, |page| {
            let params = [
                ("organization_id", org_id.to_string()),
                ("date_start", date_start.clone()),
                ("date_end", date_end.clone()),
                ("page", page.to_string()),
                ("per_page", MONTH_PER_PAGE.to_string()),
            ];
            async move { self.list_page(&params).await }
        })
        .await?;

        if truncated {
            warn!(
                org_id = %org_id,
                year,
                month,
                pages = MONTH_PAGE_CAP,
                per_page = MONTH_PER_PAGE,
                "Month listing truncated at page cap"
            );
        }
        Ok(bills.into_iter().map(WireBill::into_month_bill).collect())
    }

    async fn get_bill_details(
        &self,
        org_id: &str,
        bill_id: &str,
    ) -> Result<Option<BillRecord>, GatewayError> {
        let path = format!("/bills/{}", urlencoding::encode(bill_id));
        let params = [("organization_id", org_id.to_string())];
        match self.get_text(&path, &params).await? {
            Some(body) => parse_bill(&body),
            None => Ok(None),
        }
    }

    async fn search_bills(
        &self,
        org_id: &str,
        filter: &BillFilter,
        page: u32,
        per_page: u32,
    ) -> Result<BillPage, GatewayError> {
        let mut params = vec![
            ("organization_id", org_id.to_string()),
            ("page", page.to_string()),
            ("per_page", per_page.to_string()),
        ];
        match filter {
            BillFilter::NumberContains(n) => params.push(("bill_number_contains", n.clone())),
            BillFilter::SearchText(t) => params.push(("search_text", t.clone())),
            BillFilter::All => {
                params.push(("sort_column", "date".to_string()));
                params.push(("sort_order", "D".to_string()));
            }
        }

        let (bills, has_more_page) = self.list_page(&params).await?;
        Ok(BillPage {
            bills: bills.into_iter().map(WireBill::into_summary).collect(),
            has_more_page,
        })
    }
}
