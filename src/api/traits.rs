use async_trait::async_trait;

use crate::api::types::RawSearchPage;
use crate::error::ApiError;
use crate::search::SearchQueryParameters;

/// Anything that can answer a paginated listing search.
/// The HTTP client is the real one; tests plug in fakes.
#[async_trait]
pub trait ListingSource: Send + Sync {
    /// Fetch one page: skip `skip` records, return at most `limit`.
    async fn search(
        &self,
        params: &SearchQueryParameters,
        skip: u64,
        limit: u32,
    ) -> Result<RawSearchPage, ApiError>;

    /// Name of the backend, for logs
    fn source_name(&self) -> &'static str;
}
