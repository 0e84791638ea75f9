use async_trait::async_trait;

use crate::domain::Record;
use crate::errors::FetchError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Fetch one page of the listing (`page` is 1-based)
    async fn fetch_page(
        &self,
        page: u32,
        per_page: usize,
        strategy: &str,
    ) -> Result<Vec<Record>, FetchError>;

    /// Fetch a single record including its body
    async fn fetch_content(&self, username: &str, slug: &str) -> Result<Record, FetchError>;
}
