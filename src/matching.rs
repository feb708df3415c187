// src/matching.rs

use crate::models::{BillRecord, ContactCandidate};
use crate::normalize::{
    VendorNormalizer, clean_vendor_name, digits_only, leading_letters, normalize,
    normalize_confusables, normalize_vat,
};
use serde::{Deserialize, Serialize};
use strsim::normalized_levenshtein;

/// Which rule of the bill-number matcher accepted a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    ExactNormalized,
    Confusable,
    DigitsPrefix,
}

/// Resolver stage that produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolverStage {
    MonthWindow,
    Cache,
    FullScan,
}

/// An existing bill judged to be the same document as the incoming one.
#[derive(Debug, Clone, Serialize)]
pub struct MatchCandidate {
    pub record: BillRecord,
    pub tier: MatchTier,
    pub source: ResolverStage,
}

/// Comparison features of a bill number, computed once per query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillNumberKey {
    pub normalized: String,
    pub confusable: String,
    pub digits: String,
    pub prefix: String,
}

impl BillNumberKey {
    pub fn new(bill_number: &str) -> Self {
        Self {
            normalized: normalize(bill_number),
            confusable: normalize_confusables(bill_number),
            digits: digits_only(bill_number),
            prefix: leading_letters(bill_number),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.normalized.is_empty()
    }

    /// Three rules, first success wins:
    /// exact after normalization, equal after confusable mapping, or equal
    /// digits with agreeing letter prefixes (an absent prefix agrees with any).
    pub fn matches(&self, other: &BillNumberKey) -> Option<MatchTier> {
        if !self.normalized.is_empty() && self.normalized == other.normalized {
            return Some(MatchTier::ExactNormalized);
        }
        if !self.confusable.is_empty() && self.confusable == other.confusable {
            return Some(MatchTier::Confusable);
        }
        let prefixes_agree =
            self.prefix.is_empty() || other.prefix.is_empty() || self.prefix == other.prefix;
        if !self.digits.is_empty() && self.digits == other.digits && prefixes_agree {
            return Some(MatchTier::DigitsPrefix);
        }
        None
    }
}

pub fn bill_number_match(target: &str, candidate: &str) -> Option<MatchTier> {
    BillNumberKey::new(target).matches(&BillNumberKey::new(candidate))
}

pub fn bill_numbers_match(target: &str, candidate: &str) -> bool {
    bill_number_match(target, candidate).is_some()
}

/// What a missing vendor name means when comparing vendors.
///
/// `Permissive` lets other signals (bill number, vendor id) decide on their
/// own; it can report false duplicates when the vendor is the only
/// discriminator. `Strict` refuses to match without a name on both sides.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptyVendorPolicy {
    #[default]
    Permissive,
    Strict,
}

/// Same-vendor test with the permissive default.
pub fn vendor_match(input_name: Option<&str>, candidate_name: Option<&str>) -> bool {
    match (input_name, candidate_name) {
        (Some(a), Some(b)) if !a.is_empty() && !b.is_empty() => {
            clean_vendor_name(a) == clean_vendor_name(b)
        }
        _ => true,
    }
}

pub fn vat_match(a: Option<&str>, b: Option<&str>) -> bool {
    match (
        a.and_then(|v| normalize_vat(v, None)),
        b.and_then(|v| normalize_vat(v, None)),
    ) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Vendor identity check with a configured normalizer and empty-name policy.
#[derive(Debug, Clone, Default)]
pub struct VendorMatcher {
    normalizer: VendorNormalizer,
    policy: EmptyVendorPolicy,
}

impl VendorMatcher {
    pub fn new(normalizer: VendorNormalizer, policy: EmptyVendorPolicy) -> Self {
        Self { normalizer, policy }
    }

    pub fn policy(&self) -> EmptyVendorPolicy {
        self.policy
    }

    pub fn clean(&self, name: &str) -> String {
        self.normalizer.clean(name)
    }

    /// Names are compared only once cleaned; a side that cleans to nothing is
    /// "missing" and handled by the policy.
    pub fn names_match(&self, input_name: Option<&str>, candidate_name: Option<&str>) -> bool {
        let input = input_name.map(|n| self.normalizer.clean(n)).unwrap_or_default();
        let candidate = candidate_name
            .map(|n| self.normalizer.clean(n))
            .unwrap_or_default();

        if input.is_empty() || candidate.is_empty() {
            return self.policy == EmptyVendorPolicy::Permissive;
        }
        input == candidate
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactMatchKind {
    Vat,
    NameExact,
    NameFuzzy,
}

#[derive(Debug, Clone)]
pub struct ContactMatch<'a> {
    pub contact: &'a ContactCandidate,
    pub kind: ContactMatchKind,
    /// Similarity on a 0-100 scale.
    pub score: f64,
}

pub const DEFAULT_CONTACT_THRESHOLD: f64 = 90.0;

/// Words of the cleaned name in sorted order, so word order does not count.
fn token_sorted(matcher: &VendorMatcher, name: &str) -> String {
    let cleaned = matcher.clean(name);
    let mut tokens: Vec<&str> = cleaned.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

/// Pick the contact that denotes the same vendor.
///
/// A VAT id match wins outright, then exact cleaned-name equality, then the
/// highest fuzzy score at or above `threshold`.
pub fn best_contact_match<'a>(
    matcher: &VendorMatcher,
    name: &str,
    vat: Option<&str>,
    candidates: &'a [ContactCandidate],
    threshold: f64,
) -> Option<ContactMatch<'a>> {
    if vat.is_some() {
        if let Some(contact) = candidates.iter().find(|c| vat_match(vat, c.vat.as_deref())) {
            return Some(ContactMatch {
                contact,
                kind: ContactMatchKind::Vat,
                score: 100.0,
            });
        }
    }

    let wanted = token_sorted(matcher, name);
    if wanted.is_empty() {
        return None;
    }

    let mut best: Option<ContactMatch<'a>> = None;
    for contact in candidates {
        let have = token_sorted(matcher, &contact.contact_name);
        if have.is_empty() {
            continue;
        }
        if have == wanted {
            return Some(ContactMatch {
                contact,
                kind: ContactMatchKind::NameExact,
                score: 100.0,
            });
        }
        let score = normalized_levenshtein(&wanted, &have) * 100.0;
        if score >= threshold && best.as_ref().is_none_or(|b| score > b.score) {
            best = Some(ContactMatch {
                contact,
                kind: ContactMatchKind::NameFuzzy,
                score,
            });
        }
    }
    best
}
