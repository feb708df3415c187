use bill_dedupe::bills_cache::BillsCacheStore;
use bill_dedupe::config::Config;
use bill_dedupe::gateway::auth::TokenProvider;
use bill_dedupe::gateway::zoho::ZohoBooksClient;
use bill_dedupe::models::DuplicateCheck;
use bill_dedupe::resolver::{DuplicateResolver, ResolverSettings};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Duplicate bill detection for Zoho Books", long_about = None)]
struct Args {
    /// TOML config with Zoho credentials and matching settings
    #[arg(long, default_value = ".config/zoho.toml")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Look for an existing bill matching an incoming document
    Check {
        #[arg(long)]
        org: String,
        #[arg(long)]
        number: String,
        #[arg(long)]
        vendor_id: Option<String>,
        #[arg(long)]
        vendor_name: Option<String>,
        /// Document date, e.g. 2025-03-15 or 15.03.2025
        #[arg(long)]
        date: Option<String>,
        /// Months on each side of the document month
        #[arg(long)]
        window: Option<u32>,
    },
    /// Rebuild the bill-number cache for an organization
    RefreshCache {
        #[arg(long)]
        org: String,
        /// Newest month to scan, as YYYY-MM (default: current month)
        #[arg(long, value_parser = parse_year_month)]
        anchor: Option<(i32, u32)>,
        #[arg(long)]
        months_back: Option<u32>,
    },
    /// List cached bills whose number matches, without calling the API
    Candidates {
        #[arg(long)]
        org: String,
        #[arg(long)]
        number: String,
    },
}

fn parse_year_month(raw: &str) -> Result<(i32, u32), String> {
    let (year, month) = raw
        .split_once('-')
        .ok_or_else(|| format!("expected YYYY-MM, got {raw:?}"))?;
    let year: i32 = year.parse().map_err(|_| format!("bad year in {raw:?}"))?;
    let month: u32 = month.parse().map_err(|_| format!("bad month in {raw:?}"))?;
    if !(1..=12).contains(&month) {
        return Err(format!("month out of range in {raw:?}"));
    }
    Ok((year, month))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // init tracing
    tracing_subscriber::fmt()
        .with_target(true)
        .with_level(true)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Install crypto provider
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| "failed to install rustls crypto provider")?;

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;
    let store = BillsCacheStore::new(&cfg.cache.dir, cfg.cache.stale_after_days);

    match args.command {
        Command::Candidates { org, number } => {
            let found = store.find_candidates(&org, &number);
            info!(org_id = %org, bill_number = %number, candidates = found.len(), "Cache lookup");
            println!("{}", serde_json::to_string_pretty(&found)?);
        }
        Command::RefreshCache {
            org,
            anchor,
            months_back,
        } => {
            let gateway = build_gateway(&cfg, &args.config)?;
            let months_back = months_back.unwrap_or(cfg.cache.refresh_months_back);
            let (cache, report) = store.refresh(&gateway, &org, anchor, months_back).await;
            info!(
                org_id = %org,
                bills = cache.bills.len(),
                months_scanned = report.months_scanned,
                months_failed = report.months_failed,
                saved = report.saved,
                "Refresh finished"
            );
            if report.all_failed() {
                return Err("every month listing failed".into());
            }
        }
        Command::Check {
            org,
            number,
            vendor_id,
            vendor_name,
            date,
            window,
        } => {
            let gateway = build_gateway(&cfg, &args.config)?;
            let resolver = DuplicateResolver::new(
                gateway,
                store,
                cfg.matching.vendor_matcher(),
                ResolverSettings::from(&cfg.matching),
            );

            let check = DuplicateCheck {
                org_id: org,
                bill_number: number,
                vendor_id,
                vendor_name,
                document_date: date,
                month_window: window,
            };
            let found = resolver.bill_exists_smart(&check).await?;
            println!("{}", serde_json::to_string_pretty(&found)?);
        }
    }

    Ok(())
}

fn build_gateway(cfg: &Config, config_path: &str) -> Result<ZohoBooksClient, Box<dyn std::error::Error>> {
    let client = ZohoBooksClient::http_client(cfg.api.timeout_secs)?;
    let tokens = TokenProvider::new(client.clone(), &cfg.zoho).persist_to(config_path);
    Ok(ZohoBooksClient::new(client, &cfg.api.base_url, Arc::new(tokens)))
}
