use std::collections::BTreeMap;
use std::fmt;

use crate::models::{FilterState, RoomChoice};

/// Value of one backend query parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Text(String),
    Int(u64),
    Flag(bool),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Int(n) => write!(f, "{n}"),
            Self::Flag(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<u64> for ParamValue {
    fn from(value: u64) -> Self {
        Self::Int(value)
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        Self::Int(u64::from(value))
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

/// Flat backend query derived from a [`FilterState`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQueryParameters(BTreeMap<&'static str, ParamValue>);

impl SearchQueryParameters {
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &ParamValue)> {
        self.0.iter().map(|(k, v)| (*k, v))
    }

    /// Parameters as string pairs, ready for a URL query
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        self.iter().map(|(k, v)| (k, v.to_string())).collect()
    }

    /// Parameters as a JSON object, for endpoints that take a body
    pub fn to_json(&self) -> serde_json::Map<String, serde_json::Value> {
        self.iter()
            .map(|(k, v)| {
                let value = match v {
                    ParamValue::Text(s) => serde_json::Value::from(s.as_str()),
                    ParamValue::Int(n) => serde_json::Value::from(*n),
                    ParamValue::Flag(b) => serde_json::Value::from(*b),
                };
                (k.to_string(), value)
            })
            .collect()
    }

    fn set(&mut self, key: &'static str, value: impl Into<ParamValue>) {
        self.0.insert(key, value.into());
    }

    fn set_opt<T: Into<ParamValue>>(&mut self, key: &'static str, value: Option<T>) {
        if let Some(value) = value {
            self.set(key, value);
        }
    }
}

impl<const N: usize> From<[(&'static str, ParamValue); N]> for SearchQueryParameters {
    fn from(pairs: [(&'static str, ParamValue); N]) -> Self {
        Self(pairs.into_iter().collect())
    }
}

/// Translate filter state into backend query parameters.
///
/// Only meaningful values are emitted: blank city, the "all" property type,
/// an empty room selection, unset bounds and unset amenities never show up.
/// Bounds are passed through without ordering checks. Never fails.
pub fn map_filters(filters: &FilterState) -> SearchQueryParameters {
    let mut params = SearchQueryParameters::default();

    let city = filters.city.id.trim();
    if !city.is_empty() {
        params.set("city", city);
    }

    if let Some(code) = filters.property_type.code() {
        params.set("property_type", code);
    }

    let (min_rooms, max_rooms) = room_bounds(filters);
    params.set_opt("min_rooms", min_rooms);
    params.set_opt("max_rooms", max_rooms);

    params.set_opt("min_price", filters.price_min);
    params.set_opt("max_price", filters.price_max);
    params.set_opt("min_area", filters.area_min);
    params.set_opt("max_area", filters.area_max);

    if filters.no_commission {
        params.set("no_commission", true);
    }
    if filters.pets_allowed {
        params.set("pets_allowed", true);
    }
    if filters.furnished {
        params.set("furnished", true);
    }
    params.set_opt("floor", filters.floor.map(|f| f.code()));
    params.set_opt(
        "building_material",
        filters.building_material.map(|m| m.code()),
    );

    params
}

/// Min and max room counts for the selection; "5+" leaves the top open.
fn room_bounds(filters: &FilterState) -> (Option<u32>, Option<u32>) {
    let (Some(lowest), Some(highest)) = (filters.rooms.first(), filters.rooms.last()) else {
        return (None, None);
    };

    let max = (*highest != RoomChoice::FivePlus).then(|| highest.count());
    (Some(lowest.count()), max)
}
