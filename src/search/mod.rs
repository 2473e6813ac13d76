pub mod normalize;
pub mod params;

pub use normalize::{normalize_listing, normalize_listings};
pub use params::{map_filters, ParamValue, SearchQueryParameters};
