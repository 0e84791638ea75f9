pub mod enrichment;
pub mod feed;
pub mod record;

pub use enrichment::{normalize_summary, EnrichmentState};
pub use feed::{FeedPhase, FeedSnapshot};
pub use record::Record;
