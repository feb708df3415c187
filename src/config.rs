use crate::error::ConfigError;
use crate::matching::{EmptyVendorPolicy, VendorMatcher};
use crate::normalize::VendorNormalizer;
use serde::Deserialize;
use std::collections::HashMap;
use std::{env, fs, path::Path};
use toml_edit::{DocumentMut, value};

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(rename = "zoho_oauth")]
    pub zoho: ZohoOauthConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub matching: MatchingConfig,
}

#[derive(Debug, Deserialize)]
pub struct ZohoOauthConfig {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default = "default_token_url")]
    pub token_url: String,
    #[serde(default)]
    pub tokens: Tokens,
}

#[derive(Debug, Default, Deserialize)]
pub struct Tokens {
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default)]
    pub access_token: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_dir")]
    pub dir: String,
    #[serde(default = "default_stale_after_days")]
    pub stale_after_days: i64,
    #[serde(default = "default_refresh_months_back")]
    pub refresh_months_back: u32,
}

#[derive(Debug, Deserialize)]
pub struct MatchingConfig {
    #[serde(default = "default_month_window")]
    pub month_window: u32,
    #[serde(default = "default_full_scan_max_pages")]
    pub full_scan_max_pages: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    #[serde(default = "default_ensure_months_back")]
    pub ensure_months_back: u32,
    #[serde(default)]
    pub empty_vendor_policy: EmptyVendorPolicy,
    #[serde(default)]
    pub extra_suffixes: Vec<String>,
    /// canonical vendor name → alternate spellings / former names
    #[serde(default)]
    pub vendor_aliases: HashMap<String, Vec<String>>,
}

fn default_token_url() -> String {
    "https://accounts.zoho.eu/oauth/v2/token".to_string()
}

fn default_base_url() -> String {
    "https://www.zohoapis.eu/books/v3".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_cache_dir() -> String {
    "data/optimized_cache".to_string()
}

fn default_stale_after_days() -> i64 {
    7
}

fn default_refresh_months_back() -> u32 {
    12
}

fn default_month_window() -> u32 {
    2
}

fn default_full_scan_max_pages() -> u32 {
    25
}

fn default_per_page() -> u32 {
    200
}

fn default_ensure_months_back() -> u32 {
    14
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: default_cache_dir(),
            stale_after_days: default_stale_after_days(),
            refresh_months_back: default_refresh_months_back(),
        }
    }
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            month_window: default_month_window(),
            full_scan_max_pages: default_full_scan_max_pages(),
            per_page: default_per_page(),
            ensure_months_back: default_ensure_months_back(),
            empty_vendor_policy: EmptyVendorPolicy::default(),
            extra_suffixes: Vec::new(),
            vendor_aliases: HashMap::new(),
        }
    }
}

impl MatchingConfig {
    pub fn vendor_matcher(&self) -> VendorMatcher {
        VendorMatcher::new(
            VendorNormalizer::with_extras(&self.extra_suffixes, self.vendor_aliases.clone()),
            self.empty_vendor_policy,
        )
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let mut cfg = Self::parse(&content)?;
        cfg.apply_env();
        Ok(cfg)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Secrets from the environment take precedence over the file.
    fn apply_env(&mut self) {
        if let Ok(v) = env::var("ZOHO_CLIENT_ID") {
            self.zoho.client_id = v;
        }
        if let Ok(v) = env::var("ZOHO_CLIENT_SECRET") {
            self.zoho.client_secret = v;
        }
        if let Ok(v) = env::var("ZOHO_REFRESH_TOKEN") {
            self.zoho.tokens.refresh_token = v;
        }
    }

    pub fn update_access_token(path: impl AsRef<Path>, new_token: &str) -> Result<(), ConfigError> {
        let content = fs::read_to_string(&path)?;
        let mut doc = content.parse::<DocumentMut>()?;

        doc["zoho_oauth"]["tokens"]["access_token"] = value(new_token);

        fs::write(&path, doc.to_string())?;
        Ok(())
    }
}
