// src/resolver.rs

use crate::bills_cache::{BillsCacheStore, RefreshReport, parse_document_date, shift_month};
use crate::config::MatchingConfig;
use crate::error::DuplicateCheckError;
use crate::gateway::AccountingGateway;
use crate::matching::{
    BillNumberKey, EmptyVendorPolicy, MatchCandidate, ResolverStage, VendorMatcher,
};
use crate::models::{BillFilter, BillRecord, BillSummary, DuplicateCheck};
use chrono::Datelike;
use std::collections::HashSet;
use tracing::{Instrument, debug, info, info_span, warn};

/// Widest month window a single check may request, on each side.
const MAX_MONTH_WINDOW: i32 = 12;

#[derive(Debug, Clone, Copy)]
pub struct ResolverSettings {
    pub month_window: u32,
    pub full_scan_max_pages: u32,
    pub per_page: u32,
    /// Lookback used when a duplicate check has to rebuild the cache.
    pub refresh_months_back: u32,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            month_window: 2,
            full_scan_max_pages: 25,
            per_page: 200,
            refresh_months_back: 14,
        }
    }
}

impl From<&MatchingConfig> for ResolverSettings {
    fn from(cfg: &MatchingConfig) -> Self {
        Self {
            month_window: cfg.month_window,
            full_scan_max_pages: cfg.full_scan_max_pages,
            per_page: cfg.per_page,
            refresh_months_back: cfg.ensure_months_back,
        }
    }
}

/// Remote calls made during one check, split by outcome.
#[derive(Debug, Default)]
struct Tally {
    answered: usize,
    failed: usize,
}

impl Tally {
    fn add_refresh(&mut self, report: Option<RefreshReport>) {
        match report {
            // A fresh cache on disk counts as an answer.
            None => self.answered += 1,
            Some(r) => {
                self.answered += r.months_scanned - r.months_failed;
                self.failed += r.months_failed;
            }
        }
    }

    fn nothing_answered(&self) -> bool {
        self.failed > 0 && self.answered == 0
    }
}

/// Per-check scratch state shared by the stages.
struct CheckState<'a> {
    check: &'a DuplicateCheck,
    key: BillNumberKey,
    /// Bills already fetched and found not to be the same document.
    rejected: HashSet<String>,
    tally: Tally,
}

impl<'a> CheckState<'a> {
    fn new(check: &'a DuplicateCheck) -> Self {
        Self {
            check,
            key: BillNumberKey::new(&check.bill_number),
            rejected: HashSet::new(),
            tally: Tally::default(),
        }
    }
}

/// Finds an existing bill for an incoming document: month-window scan around
/// the document date, then the bills cache, then a broad search.
pub struct DuplicateResolver<G> {
    gateway: G,
    cache: BillsCacheStore,
    vendors: VendorMatcher,
    settings: ResolverSettings,
}

impl<G: AccountingGateway> DuplicateResolver<G> {
    pub fn new(
        gateway: G,
        cache: BillsCacheStore,
        vendors: VendorMatcher,
        settings: ResolverSettings,
    ) -> Self {
        Self {
            gateway,
            cache,
            vendors,
            settings,
        }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn cache(&self) -> &BillsCacheStore {
        &self.cache
    }

    /// Existing bill for `check`, or `Ok(None)` if there is none.
    ///
    /// Failing API calls are logged and skipped. Only when every call failed
    /// and nothing matched does this return an error, because "not found"
    /// would then be unfounded.
    pub async fn bill_exists_smart(
        &self,
        check: &DuplicateCheck,
    ) -> Result<Option<MatchCandidate>, DuplicateCheckError> {
        let span = info_span!(
            "duplicate_check",
            org_id = %check.org_id,
            bill_number = %check.bill_number
        );
        self.resolve(check).instrument(span).await
    }

    /// Like [`Self::bill_exists_smart`] but treats a total outage as "not found".
    pub async fn bill_exists_smart_or_none(&self, check: &DuplicateCheck) -> Option<MatchCandidate> {
        match self.bill_exists_smart(check).await {
            Ok(found) => found,
            Err(e) => {
                warn!(error = %e, "Duplicate check inconclusive, assuming no duplicate");
                None
            }
        }
    }

    /// Broad search only: contains-queries, text search, then an unfiltered
    /// listing, each capped in pages.
    pub async fn bill_exists(&self, check: &DuplicateCheck) -> Option<MatchCandidate> {
        let mut state = CheckState::new(check);
        if state.key.is_empty() {
            return None;
        }
        self.full_scan(&mut state).await
    }

    async fn resolve(
        &self,
        check: &DuplicateCheck,
    ) -> Result<Option<MatchCandidate>, DuplicateCheckError> {
        let mut state = CheckState::new(check);
        if check.bill_number.trim().is_empty() || state.key.is_empty() {
            info!("No bill number, skipping duplicate check");
            return Ok(None);
        }

        if let Some(found) = self.month_window_scan(&mut state).await {
            return Ok(Some(found));
        }
        if let Some(found) = self.cache_lookup(&mut state).await {
            return Ok(Some(found));
        }
        if let Some(found) = self.full_scan(&mut state).await {
            return Ok(Some(found));
        }

        if state.tally.nothing_answered() {
            warn!(failed = state.tally.failed, "Every accounting API call failed");
            return Err(DuplicateCheckError::SourcesUnavailable {
                attempts: state.tally.failed,
            });
        }
        info!(
            answered = state.tally.answered,
            failed = state.tally.failed,
            "No existing bill found"
        );
        Ok(None)
    }

    async fn month_window_scan(&self, state: &mut CheckState<'_>) -> Option<MatchCandidate> {
        let check = state.check;
        let Some(date) = check.document_date.as_deref().and_then(parse_document_date) else {
            debug!(document_date = ?check.document_date, "No usable document date, skipping month scan");
            return None;
        };

        let requested = check.month_window.unwrap_or(self.settings.month_window);
        let window = i32::try_from(requested)
            .unwrap_or(i32::MAX)
            .min(MAX_MONTH_WINDOW);
        if i64::from(window) < i64::from(requested) {
            warn!(requested, used = window, "Month window clamped");
        }
        let org_id = check.org_id.as_str();

        for delta in -window..=window {
            let (year, month) = shift_month(date.year(), date.month(), delta);
            let rows = match self.gateway.list_bills_by_month(org_id, year, month).await {
                Ok(rows) => {
                    state.tally.answered += 1;
                    rows
                }
                Err(e) => {
                    warn!(year, month, error = %e, "Month listing failed");
                    state.tally.failed += 1;
                    continue;
                }
            };

            for row in rows {
                let Some(tier) = state.key.matches(&BillNumberKey::new(&row.bill_number)) else {
                    continue;
                };
                debug!(bill_id = %row.bill_id, bill_number = %row.bill_number, ?tier, "Month scan hit");
                if let Some(record) = self.confirm(state, &row.bill_id).await {
                    info!(bill_id = %record.bill_id, year, month, "Duplicate found in month window");
                    return Some(MatchCandidate {
                        record,
                        tier,
                        source: ResolverStage::MonthWindow,
                    });
                }
            }
        }
        None
    }

    async fn cache_lookup(&self, state: &mut CheckState<'_>) -> Option<MatchCandidate> {
        let check = state.check;
        let (cache, report) = self
            .cache
            .ensure_fresh(
                &self.gateway,
                &check.org_id,
                check.document_date.as_deref(),
                self.settings.refresh_months_back,
            )
            .await;
        state.tally.add_refresh(report);

        let candidates = cache.candidates(&check.bill_number);
        debug!(candidates = candidates.len(), "Cache candidates");

        for entry in candidates {
            let Some(tier) = state.key.matches(&BillNumberKey::new(&entry.bill_number)) else {
                continue;
            };
            if let Some(record) = self.confirm(state, &entry.bill_id).await {
                info!(bill_id = %record.bill_id, "Duplicate found via bills cache");
                return Some(MatchCandidate {
                    record,
                    tier,
                    source: ResolverStage::Cache,
                });
            }
        }
        None
    }

    async fn full_scan(&self, state: &mut CheckState<'_>) -> Option<MatchCandidate> {
        let raw = state.check.bill_number.trim().to_string();
        let alnum: String = raw.chars().filter(|c| c.is_alphanumeric()).collect();

        let mut filters = vec![BillFilter::NumberContains(raw.clone())];
        if !alnum.is_empty() && alnum != raw {
            filters.push(BillFilter::NumberContains(alnum));
        }
        filters.push(BillFilter::SearchText(raw));
        filters.push(BillFilter::All);

        for filter in &filters {
            if let Some(found) = self.search_with(state, filter).await {
                return Some(found);
            }
        }
        None
    }

    async fn search_with(
        &self,
        state: &mut CheckState<'_>,
        filter: &BillFilter,
    ) -> Option<MatchCandidate> {
        let check = state.check;

        for page in 1..=self.settings.full_scan_max_pages {
            let result = self
                .gateway
                .search_bills(&check.org_id, filter, page, self.settings.per_page)
                .await;
            let bill_page = match result {
                Ok(p) => {
                    state.tally.answered += 1;
                    p
                }
                Err(e) => {
                    warn!(?filter, page, error = %e, "Bill search failed");
                    state.tally.failed += 1;
                    return None;
                }
            };

            for summary in &bill_page.bills {
                let Some(tier) = state.key.matches(&BillNumberKey::new(&summary.bill_number)) else {
                    continue;
                };
                if !self.summary_plausible(check, summary) {
                    state.rejected.insert(summary.bill_id.clone());
                    continue;
                }
                if let Some(record) = self.confirm(state, &summary.bill_id).await {
                    info!(bill_id = %record.bill_id, ?filter, page, "Duplicate found in full scan");
                    return Some(MatchCandidate {
                        record,
                        tier,
                        source: ResolverStage::FullScan,
                    });
                }
            }

            if !bill_page.has_more_page {
                return None;
            }
        }
        debug!(?filter, pages = self.settings.full_scan_max_pages, "Search page cap reached");
        None
    }

    /// Fetch details for a number match and apply the vendor checks.
    async fn confirm(&self, state: &mut CheckState<'_>, bill_id: &str) -> Option<BillRecord> {
        if state.rejected.contains(bill_id) {
            return None;
        }

        let check = state.check;
        let record = match self.gateway.get_bill_details(&check.org_id, bill_id).await {
            Ok(Some(record)) => {
                state.tally.answered += 1;
                record
            }
            Ok(None) => {
                state.tally.answered += 1;
                debug!(bill_id = %bill_id, "Bill details not retrievable");
                state.rejected.insert(bill_id.to_string());
                return None;
            }
            Err(e) => {
                // Not marked rejected: a later stage may retry.
                warn!(bill_id = %bill_id, error = %e, "Bill detail fetch failed");
                state.tally.failed += 1;
                return None;
            }
        };

        if self.same_vendor(check, &record) {
            Some(record)
        } else {
            debug!(bill_id = %bill_id, vendor = %record.vendor_name, "Number matched but vendor differs");
            state.rejected.insert(bill_id.to_string());
            None
        }
    }

    /// Vendor id must agree when given. A vendor name is compared after
    /// cleaning; a name that cleans to empty counts as absent, and then the
    /// empty-vendor policy decides unless the vendor id confirmed the vendor.
    fn same_vendor(&self, check: &DuplicateCheck, record: &BillRecord) -> bool {
        let mut id_confirmed = false;
        if let Some(wanted) = check.vendor_id.as_deref().filter(|v| !v.is_empty()) {
            if record.vendor_id.as_deref() != Some(wanted) {
                return false;
            }
            id_confirmed = true;
        }

        match check.vendor_name.as_deref() {
            Some(name) if !self.vendors.clean(name).is_empty() => {
                self.vendors.names_match(Some(name), Some(&record.vendor_name))
            }
            _ => id_confirmed || self.vendors.policy() == EmptyVendorPolicy::Permissive,
        }
    }

    /// Cheap pre-filter on search rows so obvious vendor mismatches are not
    /// fetched in full.
    fn summary_plausible(&self, check: &DuplicateCheck, summary: &BillSummary) -> bool {
        if let (Some(wanted), Some(have)) = (
            check.vendor_id.as_deref().filter(|v| !v.is_empty()),
            summary.vendor_id.as_deref(),
        ) {
            if wanted != have {
                return false;
            }
        }
        match check.vendor_name.as_deref() {
            Some(name) if !summary.vendor_name.is_empty() => {
                let wanted = self.vendors.clean(name);
                let have = self.vendors.clean(&summary.vendor_name);
                wanted.is_empty() || have.is_empty() || wanted == have
            }
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bills_cache::{BillsCache, CacheEntry};
    use crate::gateway::fake::{FakeGateway, bill};
    use crate::matching::MatchTier;
    use crate::normalize::VendorNormalizer;
    use tempfile::TempDir;

    fn resolver_with(gw: FakeGateway, policy: EmptyVendorPolicy) -> (DuplicateResolver<FakeGateway>, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = BillsCacheStore::new(dir.path(), 7);
        let vendors = VendorMatcher::new(VendorNormalizer::default(), policy);
        (
            DuplicateResolver::new(gw, store, vendors, ResolverSettings::default()),
            dir,
        )
    }

    fn resolver(gw: FakeGateway) -> (DuplicateResolver<FakeGateway>, TempDir) {
        resolver_with(gw, EmptyVendorPolicy::Permissive)
    }

    #[tokio::test]
    async fn finds_polish_bill_in_month_window() {
        let gw = FakeGateway::with_bills(vec![
            bill("W", "FV0099/25", "ACME SPÓŁKA Z O.O.", "2025-03-02"),
            bill("X", "FV0012/25", "ACME SPÓŁKA Z O.O.", "2025-03-10"),
        ]);
        let (resolver, _dir) = resolver(gw);
        let check = DuplicateCheck::new("org1", "FV 0012/25")
            .document_date("2025-03-15")
            .vendor_name("Acme Sp. z o.o.");

        let found = resolver.bill_exists_smart(&check).await.unwrap().unwrap();

        assert_eq!(found.record.bill_id, "X");
        assert_eq!(found.source, ResolverStage::MonthWindow);
        assert_eq!(found.tier, MatchTier::ExactNormalized);
        assert_eq!(resolver.gateway().search_call_count(), 0);
    }

    #[tokio::test]
    async fn month_window_spans_year_boundary() {
        let gw = FakeGateway::with_bills(vec![bill("D", "12/2024", "Acme", "2024-12-30")]);
        let (resolver, _dir) = resolver(gw);
        let check = DuplicateCheck::new("org1", "12-2024").document_date("15.01.2025");

        let found = resolver.bill_exists_smart(&check).await.unwrap().unwrap();

        assert_eq!(found.record.bill_id, "D");
        let calls = resolver.gateway().month_calls.lock().unwrap().clone();
        assert_eq!(calls[0], (2024, 11));
        assert_eq!(calls[1], (2024, 12));
    }

    #[tokio::test]
    async fn unparsable_date_falls_through_to_not_found() {
        let (resolver, _dir) = resolver(FakeGateway::default());
        let check = DuplicateCheck::new("org1", "FV/1/2025")
            .document_date("next Tuesday")
            .vendor_name("Acme");

        let result = resolver.bill_exists_smart(&check).await.unwrap();

        assert!(result.is_none());
        // Cache rebuild anchored on today, then the whole search ladder.
        assert_eq!(resolver.gateway().month_call_count(), 15);
        let filters: Vec<BillFilter> = resolver
            .gateway()
            .search_calls
            .lock()
            .unwrap()
            .iter()
            .map(|(f, _)| f.clone())
            .collect();
        assert_eq!(
            filters,
            vec![
                BillFilter::NumberContains("FV/1/2025".into()),
                BillFilter::NumberContains("FV12025".into()),
                BillFilter::SearchText("FV/1/2025".into()),
                BillFilter::All,
            ]
        );
    }

    #[tokio::test]
    async fn vendor_mismatch_in_window_falls_back_to_cache() {
        let gw = FakeGateway::with_bills(vec![
            bill("Y", "FV/1", "Globex GmbH", "2025-03-01"),
            bill("Z", "FV-1", "Acme Ltd", "2024-12-01"),
        ]);
        let (resolver, _dir) = resolver(gw);
        let check = DuplicateCheck::new("org1", "FV/1")
            .document_date("2025-03-15")
            .vendor_name("ACME");

        let found = resolver.bill_exists_smart(&check).await.unwrap().unwrap();

        assert_eq!(found.record.bill_id, "Z");
        assert_eq!(found.source, ResolverStage::Cache);
        // Y was rejected once and not fetched again from the cache stage.
        let details = resolver.gateway().detail_calls.lock().unwrap().clone();
        assert_eq!(details, vec!["Y".to_string(), "Z".to_string()]);
    }

    #[tokio::test]
    async fn vendor_id_must_agree() {
        let mut record = bill("A", "INV-55", "Acme", "2025-05-05");
        record.vendor_id = Some("V2".into());
        let (resolver, _dir) = resolver(FakeGateway::with_bills(vec![record]));

        let other_vendor = DuplicateCheck::new("org1", "INV-55")
            .document_date("2025-05-06")
            .vendor_id("V1");
        assert!(resolver.bill_exists_smart(&other_vendor).await.unwrap().is_none());

        let same_vendor = DuplicateCheck::new("org1", "INV-55")
            .document_date("2025-05-06")
            .vendor_id("V2");
        let found = resolver.bill_exists_smart(&same_vendor).await.unwrap().unwrap();
        assert_eq!(found.record.bill_id, "A");
    }

    #[tokio::test]
    async fn strict_policy_requires_vendor_evidence() {
        let bills = || vec![bill("A", "INV-55", "Acme", "2025-05-05")];
        let check = DuplicateCheck::new("org1", "INV-55").document_date("2025-05-06");

        let (permissive, _d1) = resolver(FakeGateway::with_bills(bills()));
        assert!(permissive.bill_exists_smart(&check).await.unwrap().is_some());

        let (strict, _d2) = resolver_with(FakeGateway::with_bills(bills()), EmptyVendorPolicy::Strict);
        assert!(strict.bill_exists_smart(&check).await.unwrap().is_none());

        let named = check.clone().vendor_name("ACME");
        assert!(strict.bill_exists_smart(&named).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn strict_policy_accepts_vendor_id_with_blank_name() {
        let mut record = bill("A", "INV-55", "Acme", "2025-05-05");
        record.vendor_id = Some("V1".into());
        let (strict, _dir) =
            resolver_with(FakeGateway::with_bills(vec![record]), EmptyVendorPolicy::Strict);
        let by_id = DuplicateCheck::new("org1", "INV-55")
            .document_date("2025-05-06")
            .vendor_id("V1");

        for name in ["", "  ", "."] {
            let check = by_id.clone().vendor_name(name);
            let found = strict.bill_exists_smart(&check).await.unwrap();
            assert_eq!(found.map(|m| m.record.bill_id).as_deref(), Some("A"), "name {name:?}");
        }

        let blank_without_id = DuplicateCheck::new("org1", "INV-55")
            .document_date("2025-05-06")
            .vendor_name("");
        assert!(strict.bill_exists_smart(&blank_without_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn oversized_month_window_is_clamped() {
        let gw = FakeGateway::with_bills(vec![bill("X", "FV1", "Acme", "2025-03-10")]);
        let (resolver, _dir) = resolver(gw);
        let check = DuplicateCheck::new("org1", "FV1")
            .document_date("2025-03-15")
            .month_window(u32::MAX);

        let found = resolver.bill_exists_smart(&check).await.unwrap().unwrap();

        assert_eq!(found.source, ResolverStage::MonthWindow);
        let calls = resolver.gateway().month_calls.lock().unwrap().clone();
        assert_eq!(calls[0], (2024, 3));
        assert!(calls.contains(&(2025, 3)));
        assert!(calls.len() <= 25);
    }

    #[tokio::test]
    async fn unretrievable_bill_is_fetched_once() {
        let mut gw = FakeGateway::with_bills(vec![bill("G", "INV-9", "Acme", "2025-03-10")]);
        gw.missing_details.insert("G".to_string());
        let (resolver, _dir) = resolver(gw);
        let check = DuplicateCheck::new("org1", "INV-9").document_date("2025-03-15");

        let found = resolver.bill_exists_smart(&check).await.unwrap();

        assert!(found.is_none());
        let details = resolver.gateway().detail_calls.lock().unwrap().clone();
        assert_eq!(details, vec!["G".to_string()]);
        // Month scan, cache and search all saw the bill.
        assert!(resolver.gateway().search_call_count() > 0);
    }

    #[tokio::test]
    async fn prefix_conflict_is_not_a_duplicate() {
        let gw = FakeGateway::with_bills(vec![bill("F", "FA-00123", "Acme", "2025-03-10")]);
        let (resolver, _dir) = resolver(gw);
        let check = DuplicateCheck::new("org1", "INV-00123").document_date("2025-03-15");

        assert!(resolver.bill_exists_smart(&check).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn fresh_cache_is_used_without_rebuild() {
        let gw = FakeGateway::with_bills(vec![bill("C", "R/77/B", "Acme", "2021-06-01")]);
        let (resolver, _dir) = resolver(gw);
        let mut cache = BillsCache::empty("org1");
        cache.bills.push(CacheEntry {
            bill_number: "R/77/B".into(),
            bill_id: "C".into(),
            year: 2021,
            month: 6,
        });
        resolver.cache().save("org1", &mut cache).unwrap();

        let check = DuplicateCheck::new("org1", "R 77 8").vendor_name("Acme");
        let found = resolver.bill_exists_smart(&check).await.unwrap().unwrap();

        assert_eq!(found.record.bill_id, "C");
        assert_eq!(found.source, ResolverStage::Cache);
        assert_eq!(found.tier, MatchTier::Confusable);
        assert_eq!(resolver.gateway().month_call_count(), 0);
    }

    #[tokio::test]
    async fn full_scan_finds_undated_bill_by_text_search() {
        let mut record = bill("S", "FV0012/25", "Acme", "2025-03-10");
        record.date = None;
        let (resolver, _dir) = resolver(FakeGateway::with_bills(vec![record]));
        let check = DuplicateCheck::new("org1", "FV 0012/25")
            .document_date("2025-03-15")
            .vendor_name("Acme");

        let found = resolver.bill_exists_smart(&check).await.unwrap().unwrap();

        assert_eq!(found.record.bill_id, "S");
        assert_eq!(found.source, ResolverStage::FullScan);
        let searches = resolver.gateway().search_calls.lock().unwrap().clone();
        assert_eq!(searches.last().unwrap().0, BillFilter::SearchText("FV 0012/25".into()));
    }

    #[tokio::test]
    async fn failing_month_is_contained() {
        let mut gw = FakeGateway::with_bills(vec![bill("X", "FV0012/25", "Acme", "2025-03-10")]);
        gw.failing_months.insert((2025, 3));
        let (resolver, _dir) = resolver(gw);
        let check = DuplicateCheck::new("org1", "FV0012/25").document_date("2025-03-15");

        let found = resolver.bill_exists_smart(&check).await.unwrap().unwrap();

        assert_eq!(found.record.bill_id, "X");
        assert_eq!(found.source, ResolverStage::FullScan);
    }

    #[tokio::test]
    async fn unfiltered_scan_stops_at_page_cap() {
        let gw = FakeGateway {
            endless_listing: true,
            ..Default::default()
        };
        let (resolver, _dir) = resolver(gw);
        let check = DuplicateCheck::new("org1", "NOPE-1");

        assert!(resolver.bill_exists(&check).await.is_none());
        let unfiltered = resolver
            .gateway()
            .search_calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(f, _)| *f == BillFilter::All)
            .count();
        assert_eq!(unfiltered, 25);
    }

    #[tokio::test]
    async fn total_outage_is_reported() {
        let gw = FakeGateway {
            fail_all: true,
            ..Default::default()
        };
        let (resolver, _dir) = resolver(gw);
        let check = DuplicateCheck::new("org1", "FV/1").document_date("2025-03-15");

        let err = resolver.bill_exists_smart(&check).await.unwrap_err();
        assert!(matches!(err, DuplicateCheckError::SourcesUnavailable { attempts } if attempts > 0));
        assert!(resolver.bill_exists_smart_or_none(&check).await.is_none());
    }

    #[tokio::test]
    async fn empty_bill_number_short_circuits() {
        let (resolver, _dir) = resolver(FakeGateway::default());
        let check = DuplicateCheck::new("org1", "  / ");

        assert!(resolver.bill_exists_smart(&check).await.unwrap().is_none());
        assert_eq!(resolver.gateway().month_call_count(), 0);
        assert_eq!(resolver.gateway().search_call_count(), 0);
    }
}
