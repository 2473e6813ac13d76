use tokio::sync::RwLock;
use tracing::debug;
use url::form_urlencoded;

use crate::models::FilterState;
use crate::store::{ListingState, ListingStore, LoadStatus};

/// One user's search context: the filters being edited, the filters last
/// applied (mirrored in the page URL), and the results for them.
///
/// Built around an injected [`ListingStore`] instead of app-wide state, so
/// each view or test owns its own session.
pub struct SearchSession {
    store: ListingStore,
    draft: RwLock<FilterState>,
    applied: RwLock<FilterState>,
}

impl SearchSession {
    pub fn new(store: ListingStore) -> Self {
        Self::with_filters(store, FilterState::default())
    }

    pub fn with_filters(store: ListingStore, filters: FilterState) -> Self {
        Self {
            store,
            draft: RwLock::new(filters.clone()),
            applied: RwLock::new(filters),
        }
    }

    pub fn store(&self) -> &ListingStore {
        &self.store
    }

    /// Filters currently being edited (not yet applied)
    pub async fn filters(&self) -> FilterState {
        self.draft.read().await.clone()
    }

    /// Edit the draft filters; nothing is searched until [`apply`](Self::apply).
    pub async fn update_filters(&self, edit: impl FnOnce(&mut FilterState)) {
        let mut draft = self.draft.write().await;
        edit(&mut *draft);
    }

    /// Apply the draft filters and load the first page.
    pub async fn apply(&self) -> LoadStatus {
        let filters = self.draft.read().await.clone();
        *self.applied.write().await = filters.clone();
        debug!("Applied filters: {}", filters.to_query_string());
        self.store.fetch(&filters, 1).await
    }

    /// Load another page of the applied search, clamped to the pages the
    /// last result reported.
    pub async fn go_to_page(&self, page: u32) -> LoadStatus {
        let last_page = self.store.snapshot().await.total_pages().max(1);
        let page = page.clamp(1, last_page);
        let filters = self.applied.read().await.clone();
        self.store.fetch(&filters, page).await
    }

    /// Restore filters and page from a page URL query, then search.
    pub async fn restore_from_url(&self, query: &str) -> LoadStatus {
        let filters = FilterState::from_query_string(query);
        let page = page_from_query(query);
        *self.draft.write().await = filters.clone();
        *self.applied.write().await = filters.clone();
        self.store.fetch(&filters, page).await
    }

    /// Page URL query for the applied search (filters plus `page` past 1)
    pub async fn url_query(&self) -> String {
        let filters = self.applied.read().await.to_query_string();
        let page = self.store.snapshot().await.page;
        if page <= 1 {
            return filters;
        }
        let page = format!("page={page}");
        if filters.is_empty() {
            page
        } else {
            format!("{filters}&{page}")
        }
    }

    pub async fn results(&self) -> ListingState {
        self.store.snapshot().await
    }
}

/// `page` parameter of a page URL query; missing or invalid means page 1.
pub fn page_from_query(query: &str) -> u32 {
    let query = query.strip_prefix('?').unwrap_or(query);
    form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "page")
        .and_then(|(_, value)| value.trim().parse::<u32>().ok())
        .unwrap_or(1)
        .max(1)
}
