// src/normalize.rs

use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Legal-entity suffixes removed from the end of vendor names, written the way
/// they look after punctuation has been turned into spaces.
const DEFAULT_SUFFIXES: &[&str] = &[
    "SPÓŁKA Z OGRANICZONĄ ODPOWIEDZIALNOŚCIĄ",
    "SPOLKA Z OGRANICZONA ODPOWIEDZIALNOSCIA",
    "SPÓŁKA Z O O",
    "SPOLKA Z O O",
    "SP Z O O",
    "SP Z OO",
    "SP ZOO",
    "SPÓŁKA AKCYJNA",
    "SPOLKA AKCYJNA",
    "S A",
    "SA",
    "LIMITED",
    "LTD",
    "LLC",
    "INC",
    "GMBH",
    "AG",
    "OÜ",
    "OU",
    "AS",
    "OY",
    "AB",
    "BV",
    "SRO",
    "S R O",
    "PTE LTD",
];

static LEADING_LETTERS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z]+").unwrap());

static DEFAULT_NORMALIZER: LazyLock<VendorNormalizer> = LazyLock::new(VendorNormalizer::default);

/// Uppercase and keep only alphanumeric characters, in order.
pub fn normalize(s: &str) -> String {
    s.chars()
        .flat_map(char::to_uppercase)
        .filter(|c| c.is_alphanumeric())
        .collect()
}

/// Map characters OCR commonly confuses with digits, then [`normalize`].
///
/// Substitution targets are digits, which are never mapped again, so the
/// function is idempotent.
pub fn normalize_confusables(s: &str) -> String {
    let substituted: String = s
        .chars()
        .flat_map(char::to_uppercase)
        .map(|c| match c {
            'I' | 'L' | '|' => '1',
            'O' | 'Q' => '0',
            'B' => '8',
            other => other,
        })
        .collect();
    normalize(&substituted)
}

pub fn digits_only(s: &str) -> String {
    s.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Leading run of letters (e.g. "FV" in "FV/2024/001"), uppercased.
pub fn leading_letters(s: &str) -> String {
    LEADING_LETTERS
        .find(s.trim())
        .map(|m| m.as_str().to_uppercase())
        .unwrap_or_default()
}

/// Clean a vendor name with the built-in suffix list and no aliases.
pub fn clean_vendor_name(name: &str) -> String {
    DEFAULT_NORMALIZER.clean(name)
}

/// Vendor name canonicalizer: suffix stripping plus an alias table.
#[derive(Debug, Clone)]
pub struct VendorNormalizer {
    suffixes: Vec<String>,
    aliases: HashMap<String, String>,
}

impl Default for VendorNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_SUFFIXES.iter().copied(), HashMap::new())
    }
}

impl VendorNormalizer {
    /// `aliases` maps canonical name → alternate spellings. Both sides are
    /// cleaned before they are stored, so configuration can use the natural
    /// spelling ("Acme Sp. z o.o.").
    pub fn new<'a>(
        suffixes: impl IntoIterator<Item = &'a str>,
        aliases: HashMap<String, Vec<String>>,
    ) -> Self {
        let mut suffixes: Vec<String> = suffixes
            .into_iter()
            .map(collapse_name)
            .filter(|s| !s.is_empty())
            .collect();
        // Longest first so "PTE LTD" wins over "LTD".
        suffixes.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        suffixes.dedup();

        let mut normalizer = Self {
            suffixes,
            aliases: HashMap::new(),
        };

        let mut table = HashMap::new();
        for (canonical, alternates) in aliases {
            let key = normalizer.strip_suffixes(collapse_name(&canonical));
            for alt in alternates.iter().chain(std::iter::once(&canonical)) {
                let cleaned = normalizer.strip_suffixes(collapse_name(alt));
                if !cleaned.is_empty() {
                    table.insert(cleaned, key.clone());
                }
            }
        }
        normalizer.aliases = table;
        normalizer
    }

    /// Built-in suffixes plus `extra_suffixes`, with the given alias table.
    pub fn with_extras(extra_suffixes: &[String], aliases: HashMap<String, Vec<String>>) -> Self {
        let suffixes = DEFAULT_SUFFIXES
            .iter()
            .copied()
            .chain(extra_suffixes.iter().map(String::as_str));
        Self::new(suffixes, aliases)
    }

    pub fn clean(&self, name: &str) -> String {
        let stripped = self.strip_suffixes(collapse_name(name));
        match self.aliases.get(&stripped) {
            Some(canonical) => canonical.clone(),
            None => stripped,
        }
    }

    fn strip_suffixes(&self, mut name: String) -> String {
        'outer: loop {
            for suffix in &self.suffixes {
                if name.len() <= suffix.len() {
                    continue;
                }
                let cut = name.len() - suffix.len();
                // Whole-token match only: the byte before the suffix must be a space.
                if name.ends_with(suffix.as_str()) && name[..cut].ends_with(' ') {
                    name.truncate(cut);
                    let trimmed_len = name.trim_end().len();
                    name.truncate(trimmed_len);
                    continue 'outer;
                }
            }
            return name;
        }
    }
}

/// Uppercase, punctuation → space, collapse whitespace.
fn collapse_name(name: &str) -> String {
    let spaced: String = name
        .chars()
        .flat_map(char::to_uppercase)
        .map(|c| if c.is_alphanumeric() || c.is_whitespace() { c } else { ' ' })
        .collect();
    spaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

const COUNTRY_TO_ISO: &[(&str, &str)] = &[
    ("poland", "PL"),
    ("polska", "PL"),
    ("estonia", "EE"),
    ("eesti", "EE"),
    ("germany", "DE"),
    ("deutschland", "DE"),
    ("latvia", "LV"),
    ("lithuania", "LT"),
    ("netherlands", "NL"),
    ("ireland", "IE"),
    ("france", "FR"),
    ("spain", "ES"),
    ("italy", "IT"),
    ("portugal", "PT"),
    ("sweden", "SE"),
    ("denmark", "DK"),
    ("united kingdom", "GB"),
    ("uk", "GB"),
];

fn country_iso(country: &str) -> Option<&'static str> {
    let country = country.trim().to_lowercase();
    let by_name = COUNTRY_TO_ISO
        .iter()
        .find(|(name, _)| *name == country)
        .map(|(_, iso)| *iso);
    by_name.or_else(|| {
        COUNTRY_TO_ISO
            .iter()
            .map(|(_, iso)| *iso)
            .find(|iso| iso.eq_ignore_ascii_case(&country))
    })
}

/// Canonical VAT id: separators removed, ISO prefix added to bare digits when
/// the supplier country is known. `None` for empty input.
pub fn normalize_vat(raw: &str, country: Option<&str>) -> Option<String> {
    let cleaned = normalize(raw);
    if cleaned.is_empty() {
        return None;
    }

    let has_prefix = cleaned.chars().take(2).all(|c| c.is_ascii_alphabetic())
        && cleaned.len() > 2
        && cleaned[2..].chars().all(|c| c.is_ascii_digit());
    if has_prefix {
        return Some(cleaned);
    }

    if cleaned.chars().all(|c| c.is_ascii_digit()) {
        if let Some(iso) = country.and_then(country_iso) {
            return Some(format!("{iso}{cleaned}"));
        }
    }

    Some(cleaned)
}
