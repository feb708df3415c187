pub mod bills_cache;
pub mod config;
pub mod error;
pub mod gateway;
pub mod matching;
pub mod models;
pub mod normalize;
pub mod resolver;

pub use bills_cache::{BillsCache, BillsCacheStore};
pub use matching::{MatchCandidate, MatchTier, ResolverStage, VendorMatcher};
pub use models::DuplicateCheck;
pub use resolver::{DuplicateResolver, ResolverSettings};
