// src/bills_cache.rs

use crate::gateway::AccountingGateway;
use crate::matching::BillNumberKey;
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeDelta, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::{fs, io};
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Formats tried, in order, on free-text document dates.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d", "%d.%m.%Y", "%d/%m/%Y", "%m/%d/%Y", "%Y/%m/%d", "%d-%m-%Y",
];

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheEntry {
    #[serde(default)]
    pub bill_number: String,
    #[serde(default)]
    pub bill_id: String,
    #[serde(default)]
    pub year: i32,
    #[serde(default)]
    pub month: u32,
}

/// Bill numbers of one organization, as of the last scan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BillsCache {
    #[serde(default)]
    pub org_id: String,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub bills: Vec<CacheEntry>,
}

/// Accepts RFC 3339 as well as naive ISO timestamps (assumed UTC), which older
/// cache files contain. Anything else reads as "never updated".
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(&s, "%Y-%m-%dT%H:%M:%S%.f")
                    .ok()
                    .map(|naive| naive.and_utc())
            })
    }))
}

impl BillsCache {
    pub fn empty(org_id: &str) -> Self {
        Self {
            org_id: org_id.to_string(),
            updated_at: None,
            bills: Vec::new(),
        }
    }

    /// Entries whose bill number may denote `bill_number`.
    pub fn candidates(&self, bill_number: &str) -> Vec<CacheEntry> {
        let key = BillNumberKey::new(bill_number);
        self.bills
            .iter()
            .filter(|entry| key.matches(&BillNumberKey::new(&entry.bill_number)).is_some())
            .cloned()
            .collect()
    }

    pub fn is_stale_at(&self, now: DateTime<Utc>, max_age: TimeDelta) -> bool {
        match self.updated_at {
            _ if self.bills.is_empty() => true,
            None => true,
            Some(updated) => now - updated > max_age,
        }
    }
}

/// Outcome of a month-by-month rebuild.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshReport {
    pub months_scanned: usize,
    pub months_failed: usize,
    pub saved: bool,
}

impl RefreshReport {
    pub fn all_failed(&self) -> bool {
        self.months_scanned > 0 && self.months_failed == self.months_scanned
    }
}

/// `(year, month)` moved by `delta` months.
pub fn shift_month(year: i32, month: u32, delta: i32) -> (i32, u32) {
    let idx = year * 12 + (month as i32 - 1) + delta;
    (idx.div_euclid(12), idx.rem_euclid(12) as u32 + 1)
}

pub fn parse_document_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

/// JSON file per organization under one directory.
///
/// Files are rewritten wholesale. Refreshes for the same organization are
/// serialized within this process; separate processes sharing the directory
/// can still overwrite each other.
pub struct BillsCacheStore {
    dir: PathBuf,
    max_age: TimeDelta,
    locks: std::sync::Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl BillsCacheStore {
    pub fn new(dir: impl Into<PathBuf>, stale_after_days: i64) -> Self {
        Self {
            dir: dir.into(),
            max_age: TimeDelta::days(stale_after_days),
            locks: std::sync::Mutex::new(HashMap::new()),
        }
    }

    pub fn path_for(&self, org_id: &str) -> PathBuf {
        self.dir.join(format!("zoho_bills_{org_id}.json"))
    }

    fn org_lock(&self, org_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        locks.entry(org_id.to_string()).or_default().clone()
    }

    /// Missing or unreadable files yield an empty cache.
    pub fn load(&self, org_id: &str) -> BillsCache {
        let path = self.path_for(org_id);
        if !path.exists() {
            return BillsCache::empty(org_id);
        }
        match read_cache(&path) {
            Ok(mut cache) => {
                cache.org_id = org_id.to_string();
                cache
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Bills cache unreadable, starting empty");
                BillsCache::empty(org_id)
            }
        }
    }

    /// Stamp `updated_at` and write the whole cache.
    pub fn save(&self, org_id: &str, cache: &mut BillsCache) -> io::Result<()> {
        cache.org_id = org_id.to_string();
        cache.updated_at = Some(Utc::now());

        fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(cache).map_err(io::Error::other)?;
        fs::write(self.path_for(org_id), json)?;
        info!(org_id = %org_id, bills = cache.bills.len(), "Bills cache saved");
        Ok(())
    }

    pub fn is_stale(&self, cache: &BillsCache) -> bool {
        cache.is_stale_at(Utc::now(), self.max_age)
    }

    /// Rebuild from the anchor month (default: current month) and the
    /// `months_back` months before it. Months whose listing fails are skipped.
    pub async fn refresh<G: AccountingGateway + ?Sized>(
        &self,
        gateway: &G,
        org_id: &str,
        anchor: Option<(i32, u32)>,
        months_back: u32,
    ) -> (BillsCache, RefreshReport) {
        let lock = self.org_lock(org_id);
        let _guard = lock.lock().await;
        self.refresh_locked(gateway, org_id, anchor, months_back).await
    }

    async fn refresh_locked<G: AccountingGateway + ?Sized>(
        &self,
        gateway: &G,
        org_id: &str,
        anchor: Option<(i32, u32)>,
        months_back: u32,
    ) -> (BillsCache, RefreshReport) {
        let (base_year, base_month) = anchor.unwrap_or_else(|| {
            let now = Utc::now();
            (now.year(), now.month())
        });
        info!(org_id = %org_id, base_year, base_month, months_back, "Refreshing bills cache");

        let mut cache = BillsCache::empty(org_id);
        let mut seen: HashSet<String> = HashSet::new();
        let mut report = RefreshReport::default();

        for back in 0..=months_back as i32 {
            let (year, month) = shift_month(base_year, base_month, -back);
            report.months_scanned += 1;

            let month_bills = match gateway.list_bills_by_month(org_id, year, month).await {
                Ok(bills) => bills,
                Err(e) => {
                    warn!(org_id = %org_id, year, month, error = %e, "Skipping month in cache refresh");
                    report.months_failed += 1;
                    continue;
                }
            };

            for bill in month_bills {
                if !seen.insert(bill.bill_id.clone()) {
                    continue;
                }
                cache.bills.push(CacheEntry {
                    bill_number: bill.bill_number,
                    bill_id: bill.bill_id,
                    year,
                    month,
                });
            }
        }

        match self.save(org_id, &mut cache) {
            Ok(()) => report.saved = true,
            Err(e) => warn!(org_id = %org_id, error = %e, "Could not persist bills cache"),
        }

        info!(
            org_id = %org_id,
            bills = cache.bills.len(),
            months_scanned = report.months_scanned,
            months_failed = report.months_failed,
            "Bills cache refreshed"
        );
        (cache, report)
    }

    /// Candidates from the persisted cache; never triggers a refresh.
    pub fn find_candidates(&self, org_id: &str, bill_number: &str) -> Vec<CacheEntry> {
        self.load(org_id).candidates(bill_number)
    }

    /// Return the cache if fresh; otherwise rebuild it around the document
    /// month (or the current month if the date is absent or unparsable).
    /// The report is `None` when no rebuild was needed.
    pub async fn ensure_fresh<G: AccountingGateway + ?Sized>(
        &self,
        gateway: &G,
        org_id: &str,
        document_date: Option<&str>,
        months_back: u32,
    ) -> (BillsCache, Option<RefreshReport>) {
        let lock = self.org_lock(org_id);
        let _guard = lock.lock().await;

        let cache = self.load(org_id);
        if !self.is_stale(&cache) {
            return (cache, None);
        }

        let anchor = document_date
            .and_then(parse_document_date)
            .map(|d| (d.year(), d.month()));
        let (cache, report) = self.refresh_locked(gateway, org_id, anchor, months_back).await;
        (cache, Some(report))
    }
}

fn read_cache(path: &Path) -> Result<BillsCache, Box<dyn std::error::Error>> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
