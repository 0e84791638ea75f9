pub mod enrichment;
pub mod pager;

pub use enrichment::EnrichmentCache;
pub use pager::{FeedPager, NEAR_END_THRESHOLD};
