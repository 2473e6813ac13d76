use std::sync::Arc;

use tokio::sync::{watch, RwLock};
use tracing::{info, warn};

use crate::api::ListingSource;
use crate::models::{self, FilterState, Listing, SearchResultPage, PAGE_SIZE};
use crate::search::{map_filters, normalize_listings};

/// Where the current search stands
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LoadStatus {
    #[default]
    Idle,
    Loading,
    Loaded,
    Errored(String),
}

/// Snapshot of the current results
#[derive(Debug, Clone, PartialEq)]
pub struct ListingState {
    pub status: LoadStatus,
    pub listings: Vec<Listing>,
    pub total: u64,
    /// 1-based page the listings belong to
    pub page: u32,
    pub page_size: u32,
}

impl ListingState {
    fn new(page_size: u32) -> Self {
        Self {
            status: LoadStatus::Idle,
            listings: Vec::new(),
            total: 0,
            page: 1,
            page_size,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.status == LoadStatus::Loading
    }

    pub fn error(&self) -> Option<&str> {
        match &self.status {
            LoadStatus::Errored(message) => Some(message),
            _ => None,
        }
    }

    /// Loaded, but nothing matched the filters
    pub fn is_empty_result(&self) -> bool {
        self.status == LoadStatus::Loaded && self.listings.is_empty()
    }

    pub fn total_pages(&self) -> u32 {
        models::total_pages(self.total, self.page_size)
    }

    /// The loaded results as a standalone page
    pub fn as_page(&self) -> SearchResultPage {
        SearchResultPage {
            total: self.total,
            listings: self.listings.clone(),
            page: self.page,
            page_size: self.page_size,
        }
    }
}

/// Holds the results of the most recent search.
///
/// `fetch` does not sequence requests: when two searches overlap, whichever
/// response arrives last overwrites the other.
pub struct ListingStore {
    source: Arc<dyn ListingSource>,
    state: RwLock<ListingState>,
    total_tx: watch::Sender<u64>,
}

impl ListingStore {
    pub fn new(source: Arc<dyn ListingSource>) -> Self {
        Self::with_page_size(source, PAGE_SIZE)
    }

    pub fn with_page_size(source: Arc<dyn ListingSource>, page_size: u32) -> Self {
        let (total_tx, _) = watch::channel(0);
        Self {
            source,
            state: RwLock::new(ListingState::new(page_size.max(1))),
            total_tx,
        }
    }

    /// Run a search for `filters` and store the outcome.
    ///
    /// Moves to `Loading` (dropping any previous error), then to `Loaded`
    /// or `Errored`. An error clears the listings. Pages are 1-based; page
    /// 0 is treated as page 1.
    pub async fn fetch(&self, filters: &FilterState, page: u32) -> LoadStatus {
        let page = page.max(1);
        let params = map_filters(filters);

        let page_size = {
            let mut state = self.state.write().await;
            state.status = LoadStatus::Loading;
            state.page_size
        };

        info!(
            "🔎 Searching {} (page {}, {} filters) via {}",
            filters.city.name,
            page,
            params.len(),
            self.source.source_name()
        );

        let result = self
            .source
            .search(&params, models::skip_for(page, page_size), page_size)
            .await;

        let mut state = self.state.write().await;
        match result {
            Ok(raw) => {
                state.listings = normalize_listings(&raw.listings);
                state.total = raw.total;
                state.page = page;
                state.status = LoadStatus::Loaded;
                self.total_tx.send_replace(raw.total);
                info!(
                    "✅ Loaded {} of {} listings (page {}/{})",
                    state.listings.len(),
                    state.total,
                    page,
                    state.total_pages()
                );
            }
            Err(err) => {
                warn!("Search failed: {}", err);
                state.listings.clear();
                state.total = 0;
                state.status = LoadStatus::Errored(err.user_message());
            }
        }
        state.status.clone()
    }

    pub async fn snapshot(&self) -> ListingState {
        self.state.read().await.clone()
    }

    /// Total result count of the last successful search, for views that
    /// show it outside the result list.
    pub fn subscribe_total(&self) -> watch::Receiver<u64> {
        self.total_tx.subscribe()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::api::types::{RawSearchPage, SearchEnvelope};
    use crate::error::ApiError;
    use crate::models::{City, RoomChoice};
    use crate::search::SearchQueryParameters;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::sync::oneshot;

    type Reply = Result<RawSearchPage, ApiError>;
    type Responder = Box<dyn Fn(&SearchQueryParameters) -> Reply + Send + Sync>;

    /// Answers immediately and records every request
    pub(crate) struct ScriptedSource {
        respond: Responder,
        pub(crate) seen: Mutex<Vec<(SearchQueryParameters, u64, u32)>>,
    }

    impl ScriptedSource {
        pub(crate) fn new(
            respond: impl Fn(&SearchQueryParameters) -> Reply + Send + Sync + 'static,
        ) -> Arc<Self> {
            Arc::new(Self {
                respond: Box::new(respond),
                seen: Mutex::new(Vec::new()),
            })
        }

        pub(crate) fn requests(&self) -> Vec<(SearchQueryParameters, u64, u32)> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ListingSource for ScriptedSource {
        async fn search(
            &self,
            params: &SearchQueryParameters,
            skip: u64,
            limit: u32,
        ) -> Reply {
            self.seen.lock().unwrap().push((params.clone(), skip, limit));
            (self.respond)(params)
        }

        fn source_name(&self) -> &'static str {
            "scripted"
        }
    }

    /// Holds each request until the test releases the gate for its city
    struct GatedSource {
        gates: Mutex<HashMap<String, oneshot::Receiver<Reply>>>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ListingSource for GatedSource {
        async fn search(
            &self,
            params: &SearchQueryParameters,
            _skip: u64,
            _limit: u32,
        ) -> Reply {
            let city = params.get("city").map(ToString::to_string).unwrap_or_default();
            let gate = self.gates.lock().unwrap().remove(&city).expect("no gate for city");
            self.calls.fetch_add(1, Ordering::SeqCst);
            gate.await.expect("gate dropped")
        }

        fn source_name(&self) -> &'static str {
            "gated"
        }
    }

    pub(crate) fn raw_page(count: usize, total: u64) -> RawSearchPage {
        RawSearchPage {
            listings: (0..count)
                .map(|i| json!({"id": format!("l{i}"), "price": 1000 + i}))
                .collect(),
            total,
        }
    }

    fn filters_for(city: &str) -> FilterState {
        let mut f = FilterState::default();
        f.set_city(City::from_id(city));
        f
    }

    #[tokio::test]
    async fn starts_idle() {
        let store = ListingStore::new(ScriptedSource::new(|_| Ok(raw_page(0, 0))));
        let state = store.snapshot().await;
        assert_eq!(state.status, LoadStatus::Idle);
        assert!(state.listings.is_empty());
    }

    #[tokio::test]
    async fn legacy_envelope_loads_total_and_listings() {
        let source = ScriptedSource::new(|_| {
            let body = json!({
                "results": [{"_id": 1}, {"_id": 2}, {"_id": 3}],
                "total_count": 42
            });
            let envelope: SearchEnvelope = serde_json::from_value(body).unwrap();
            Ok(envelope.into_raw_page())
        });
        let store = ListingStore::new(source);
        let mut total = store.subscribe_total();

        let status = store.fetch(&FilterState::default(), 1).await;

        assert_eq!(status, LoadStatus::Loaded);
        let state = store.snapshot().await;
        assert_eq!(state.total, 42);
        assert_eq!(state.listings.len(), 3);
        assert_eq!(state.listings[0].id, "1");
        assert!(total.has_changed().unwrap());
        assert_eq!(*total.borrow_and_update(), 42);
    }

    #[tokio::test]
    async fn failure_sets_error_and_clears_listings() {
        let source = ScriptedSource::new(|params| {
            if params.get("city").is_some_and(|c| c.to_string() == "roma") {
                Ok(raw_page(5, 5))
            } else {
                Err(ApiError::Status {
                    status: 500,
                    message: "Internal error".into(),
                })
            }
        });
        let store = ListingStore::new(source);

        store.fetch(&filters_for("roma"), 1).await;
        assert_eq!(store.snapshot().await.listings.len(), 5);

        let status = store.fetch(&filters_for("milano"), 1).await;
        assert_eq!(status, LoadStatus::Errored("Internal error".into()));
        let state = store.snapshot().await;
        assert_eq!(state.error(), Some("Internal error"));
        assert!(state.listings.is_empty());
        // the last successful total stays published
        assert_eq!(*store.subscribe_total().borrow(), 5);
    }

    #[tokio::test]
    async fn next_fetch_clears_previous_error() {
        let fail = Arc::new(Mutex::new(true));
        let flag = fail.clone();
        let source = ScriptedSource::new(move |_| {
            if *flag.lock().unwrap() {
                Err(ApiError::Unauthorized)
            } else {
                Ok(raw_page(0, 0))
            }
        });
        let store = ListingStore::new(source);

        store.fetch(&FilterState::default(), 1).await;
        assert!(store.snapshot().await.error().is_some());

        *fail.lock().unwrap() = false;
        store.fetch(&FilterState::default(), 1).await;
        let state = store.snapshot().await;
        assert_eq!(state.error(), None);
        assert!(state.is_empty_result());
    }

    #[tokio::test]
    async fn page_number_becomes_skip_offset() {
        let source = ScriptedSource::new(|_| Ok(raw_page(50, 120)));
        let store = ListingStore::new(source.clone());

        let mut filters = FilterState::default();
        filters.set_rooms([RoomChoice::Two]);
        store.fetch(&filters, 3).await;
        store.fetch(&filters, 0).await;

        let requests = source.requests();
        assert_eq!(requests[0].1, 100);
        assert_eq!(requests[0].2, PAGE_SIZE);
        assert!(requests[0].0.contains("min_rooms"));
        assert_eq!(requests[1].1, 0);

        let page = store.snapshot().await.as_page();
        assert_eq!(page.page, 1);
        assert_eq!(page.total_pages(), 3);
    }

    #[tokio::test]
    async fn last_resolved_search_wins() {
        let (first_tx, first_rx) = oneshot::channel();
        let (second_tx, second_rx) = oneshot::channel();
        let source = Arc::new(GatedSource {
            gates: Mutex::new(HashMap::from([
                ("roma".to_string(), first_rx),
                ("milano".to_string(), second_rx),
            ])),
            calls: AtomicUsize::new(0),
        });
        let store = ListingStore::new(source.clone());

        let roma = filters_for("roma");
        let milano = filters_for("milano");
        let first = store.fetch(&roma, 1);
        let second = store.fetch(&milano, 1);
        let driver = async {
            while source.calls.load(Ordering::SeqCst) < 2 {
                tokio::task::yield_now().await;
            }
            // the later search answers first
            second_tx.send(Ok(raw_page(2, 2))).unwrap();
            while store.snapshot().await.total != 2 {
                tokio::task::yield_now().await;
            }
            first_tx.send(Ok(raw_page(7, 7))).unwrap();
        };

        tokio::join!(first, second, driver);

        let state = store.snapshot().await;
        assert_eq!(state.status, LoadStatus::Loaded);
        assert_eq!(state.total, 7);
        assert_eq!(state.listings.len(), 7);
    }
}
