//! Client for a real-estate listing aggregator's REST backend: filter
//! state, query mapping, search, result normalization and paging, plus
//! the account endpoints (favorites, subscriptions, notifications).

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod search;
pub mod session;
pub mod storage;
pub mod store;

pub use api::{AccountClient, ApiClient, ListingSource, SearchClient};
pub use config::Config;
pub use error::ApiError;
pub use models::{FilterState, Listing, SearchResultPage, PAGE_SIZE};
pub use session::SearchSession;
pub use storage::LocalStorage;
pub use store::{ListingState, ListingStore, LoadStatus};
