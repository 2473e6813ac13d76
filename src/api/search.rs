use async_trait::async_trait;
use tracing::{debug, info};

use crate::api::traits::ListingSource;
use crate::api::types::{RawSearchPage, SearchEnvelope};
use crate::api::ApiClient;
use crate::error::ApiError;
use crate::search::SearchQueryParameters;

const SEARCH_PATH: &str = "listings/search";

/// Client for the listings search endpoint.
///
/// One request per call: no retries, caching, cancellation or
/// de-duplication of identical in-flight searches.
#[derive(Debug, Clone)]
pub struct SearchClient {
    api: ApiClient,
}

impl SearchClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Full request URL for a search page
    pub fn search_url(
        &self,
        params: &SearchQueryParameters,
        skip: u64,
        limit: u32,
    ) -> Result<url::Url, ApiError> {
        let mut url = self.api.endpoint(SEARCH_PATH)?;
        {
            let mut query = url.query_pairs_mut();
            for (key, value) in params.to_pairs() {
                query.append_pair(key, &value);
            }
            query.append_pair("skip", &skip.to_string());
            query.append_pair("limit", &limit.to_string());
        }
        Ok(url)
    }
}

#[async_trait]
impl ListingSource for SearchClient {
    async fn search(
        &self,
        params: &SearchQueryParameters,
        skip: u64,
        limit: u32,
    ) -> Result<RawSearchPage, ApiError> {
        let url = self.search_url(params, skip, limit)?;
        debug!("Searching listings: {}", url);

        let envelope: SearchEnvelope = self
            .api
            .execute_json(self.api.get(url), "listing search")
            .await?;
        let page = envelope.into_raw_page();

        info!(
            "Search returned {} listings ({} total, skip {})",
            page.listings.len(),
            page.total,
            skip
        );
        Ok(page)
    }

    fn source_name(&self) -> &'static str {
        "listings-api"
    }
}
