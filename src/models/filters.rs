use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use url::form_urlencoded;

/// City searched when nothing else is selected
pub const DEFAULT_CITY_ID: &str = "roma";

/// Cities the backend knows by id, with their display names
const KNOWN_CITIES: &[(&str, &str)] = &[
    ("roma", "Roma"),
    ("milano", "Milano"),
    ("torino", "Torino"),
    ("napoli", "Napoli"),
    ("firenze", "Firenze"),
    ("bologna", "Bologna"),
];

/// City the search is scoped to
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct City {
    pub id: String,
    pub name: String,
}

impl City {
    /// Look up a city by id; unknown ids use the id as display name.
    pub fn from_id(id: &str) -> Self {
        let id = id.trim().to_lowercase();
        let name = KNOWN_CITIES
            .iter()
            .find(|(known, _)| *known == id)
            .map(|(_, name)| (*name).to_string())
            .unwrap_or_else(|| id.clone());
        Self { id, name }
    }

    /// Same city with its id trimmed and lowercased. A blank id means the
    /// default city; a blank name means the looked-up one.
    pub fn normalized(self) -> Self {
        let base = if self.id.trim().is_empty() {
            Self::default()
        } else {
            Self::from_id(&self.id)
        };
        match self.name.trim() {
            "" => base,
            name => Self {
                name: name.to_string(),
                ..base
            },
        }
    }
}

impl Default for City {
    fn default() -> Self {
        Self::from_id(DEFAULT_CITY_ID)
    }
}

/// Kind of property. `All` means no constraint.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PropertyType {
    #[default]
    All,
    Apartment,
    House,
    Room,
    Studio,
    Villa,
    Loft,
}

impl PropertyType {
    /// Backend code, or `None` for the "all types" sentinel
    pub fn code(self) -> Option<&'static str> {
        match self {
            Self::All => None,
            Self::Apartment => Some("apartment"),
            Self::House => Some("house"),
            Self::Room => Some("room"),
            Self::Studio => Some("studio"),
            Self::Villa => Some("villa"),
            Self::Loft => Some("loft"),
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "all" => Some(Self::All),
            "apartment" => Some(Self::Apartment),
            "house" => Some(Self::House),
            "room" => Some(Self::Room),
            "studio" => Some(Self::Studio),
            "villa" => Some(Self::Villa),
            "loft" => Some(Self::Loft),
            _ => None,
        }
    }
}

/// One selectable room-count bucket
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RoomChoice {
    Studio,
    One,
    Two,
    Three,
    Four,
    /// "5 or more", the open-ended top bucket
    FivePlus,
}

impl RoomChoice {
    pub const ALL: [RoomChoice; 6] = [
        Self::Studio,
        Self::One,
        Self::Two,
        Self::Three,
        Self::Four,
        Self::FivePlus,
    ];

    /// Room count sent to the backend
    pub fn count(self) -> u32 {
        match self {
            Self::Studio => 0,
            Self::One => 1,
            Self::Two => 2,
            Self::Three => 3,
            Self::Four => 4,
            Self::FivePlus => 5,
        }
    }

    /// Token used in the page URL
    pub fn code(self) -> &'static str {
        match self {
            Self::Studio => "studio",
            Self::One => "1",
            Self::Two => "2",
            Self::Three => "3",
            Self::Four => "4",
            Self::FivePlus => "5plus",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|choice| choice.code() == code)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FloorPosition {
    Ground,
    Middle,
    Top,
}

impl FloorPosition {
    pub fn code(self) -> &'static str {
        match self {
            Self::Ground => "ground",
            Self::Middle => "middle",
            Self::Top => "top",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "ground" => Some(Self::Ground),
            "middle" => Some(Self::Middle),
            "top" => Some(Self::Top),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BuildingMaterial {
    Brick,
    Panel,
    Monolith,
    Wood,
}

impl BuildingMaterial {
    pub fn code(self) -> &'static str {
        match self {
            Self::Brick => "brick",
            Self::Panel => "panel",
            Self::Monolith => "monolith",
            Self::Wood => "wood",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "brick" => Some(Self::Brick),
            "panel" => Some(Self::Panel),
            "monolith" => Some(Self::Monolith),
            "wood" => Some(Self::Wood),
            _ => None,
        }
    }
}

/// User-selected search criteria.
///
/// Every optional criterion is an explicit `Option` (or an empty set /
/// `false` flag); all defaults come from [`FilterState::default`].
/// Ranges are not cross-checked: `price_max < price_min` is kept as is.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FilterState {
    pub city: City,
    pub property_type: PropertyType,
    pub rooms: BTreeSet<RoomChoice>,
    pub price_min: Option<u64>,
    pub price_max: Option<u64>,
    pub area_min: Option<u32>,
    pub area_max: Option<u32>,
    pub no_commission: bool,
    pub pets_allowed: bool,
    pub furnished: bool,
    pub floor: Option<FloorPosition>,
    pub building_material: Option<BuildingMaterial>,
}

impl FilterState {
    pub fn set_city(&mut self, city: City) {
        self.city = city.normalized();
    }

    pub fn set_property_type(&mut self, property_type: PropertyType) {
        self.property_type = property_type;
    }

    /// Select the bucket if unselected, otherwise deselect it.
    pub fn toggle_room(&mut self, choice: RoomChoice) {
        if !self.rooms.remove(&choice) {
            self.rooms.insert(choice);
        }
    }

    pub fn set_rooms(&mut self, rooms: impl IntoIterator<Item = RoomChoice>) {
        self.rooms = rooms.into_iter().collect();
    }

    pub fn set_price_range(&mut self, min: Option<u64>, max: Option<u64>) {
        self.price_min = min;
        self.price_max = max;
    }

    pub fn set_area_range(&mut self, min: Option<u32>, max: Option<u32>) {
        self.area_min = min;
        self.area_max = max;
    }

    pub fn set_no_commission(&mut self, enabled: bool) {
        self.no_commission = enabled;
    }

    pub fn set_pets_allowed(&mut self, enabled: bool) {
        self.pets_allowed = enabled;
    }

    pub fn set_furnished(&mut self, enabled: bool) {
        self.furnished = enabled;
    }

    pub fn set_floor(&mut self, floor: Option<FloorPosition>) {
        self.floor = floor;
    }

    pub fn set_building_material(&mut self, material: Option<BuildingMaterial>) {
        self.building_material = material;
    }

    /// Back to defaults, keeping the selected city.
    pub fn reset(&mut self) {
        let city = std::mem::take(&mut self.city);
        *self = Self {
            city,
            ..Self::default()
        };
    }

    /// Encode the filters as a page URL query string (without `?`).
    ///
    /// Default and empty values are left out, so the default state
    /// encodes to an empty string.
    pub fn to_query_string(&self) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());

        let default_city = City::default();
        if self.city.id != default_city.id {
            query.append_pair("city", &self.city.id);
        }
        if self.city.name != City::from_id(&self.city.id).name {
            query.append_pair("city_name", &self.city.name);
        }
        if let Some(code) = self.property_type.code() {
            query.append_pair("type", code);
        }
        if !self.rooms.is_empty() {
            let rooms: Vec<&str> = self.rooms.iter().map(|r| r.code()).collect();
            query.append_pair("rooms", &rooms.join(","));
        }
        if let Some(v) = self.price_min {
            query.append_pair("price_min", &v.to_string());
        }
        if let Some(v) = self.price_max {
            query.append_pair("price_max", &v.to_string());
        }
        if let Some(v) = self.area_min {
            query.append_pair("area_min", &v.to_string());
        }
        if let Some(v) = self.area_max {
            query.append_pair("area_max", &v.to_string());
        }
        if self.no_commission {
            query.append_pair("no_commission", "1");
        }
        if self.pets_allowed {
            query.append_pair("pets", "1");
        }
        if self.furnished {
            query.append_pair("furnished", "1");
        }
        if let Some(floor) = self.floor {
            query.append_pair("floor", floor.code());
        }
        if let Some(material) = self.building_material {
            query.append_pair("material", material.code());
        }

        query.finish()
    }

    /// Decode filters from a page URL query string.
    ///
    /// Never fails: unknown keys and malformed values are skipped and the
    /// affected field keeps its default. A leading `?` is accepted.
    pub fn from_query_string(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut filters = Self::default();
        let mut city_name = None;

        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            let value = value.trim();
            match key.as_ref() {
                "city" if !value.is_empty() => filters.city = City::from_id(value),
                "city_name" if !value.is_empty() => city_name = Some(value.to_string()),
                "type" => {
                    if let Some(t) = PropertyType::from_code(value) {
                        filters.property_type = t;
                    }
                }
                "rooms" => {
                    filters.rooms = value.split(',').filter_map(RoomChoice::from_code).collect();
                }
                "price_min" => filters.price_min = value.parse().ok(),
                "price_max" => filters.price_max = value.parse().ok(),
                "area_min" => filters.area_min = value.parse().ok(),
                "area_max" => filters.area_max = value.parse().ok(),
                "no_commission" => filters.no_commission = parse_flag(value),
                "pets" => filters.pets_allowed = parse_flag(value),
                "furnished" => filters.furnished = parse_flag(value),
                "floor" => filters.floor = FloorPosition::from_code(value),
                "material" => filters.building_material = BuildingMaterial::from_code(value),
                _ => {}
            }
        }

        if let Some(name) = city_name {
            filters.city.name = name;
        }

        filters
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value, "1" | "true" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn busy_filters() -> FilterState {
        let mut f = FilterState::default();
        f.set_city(City::from_id("milano"));
        f.set_property_type(PropertyType::Loft);
        f.set_rooms([RoomChoice::Studio, RoomChoice::Two, RoomChoice::FivePlus]);
        f.set_price_range(Some(900), Some(700));
        f.set_area_range(None, Some(80));
        f.set_no_commission(true);
        f.set_furnished(true);
        f.set_floor(Some(FloorPosition::Top));
        f.set_building_material(Some(BuildingMaterial::Brick));
        f
    }

    #[test]
    fn default_city_is_roma() {
        let f = FilterState::default();
        assert_eq!(f.city.id, "roma");
        assert_eq!(f.city.name, "Roma");
        assert_eq!(f.property_type, PropertyType::All);
        assert!(f.rooms.is_empty());
    }

    #[test]
    fn unknown_city_uses_id_as_name() {
        let city = City::from_id("Lecce");
        assert_eq!(city.id, "lecce");
        assert_eq!(city.name, "lecce");
    }

    #[test]
    fn toggle_room_adds_then_removes() {
        let mut f = FilterState::default();
        f.toggle_room(RoomChoice::Three);
        assert!(f.rooms.contains(&RoomChoice::Three));
        f.toggle_room(RoomChoice::Three);
        assert!(f.rooms.is_empty());
    }

    #[test]
    fn reset_keeps_city() {
        let mut f = busy_filters();
        f.reset();
        assert_eq!(f.city.id, "milano");
        assert_eq!(
            f,
            FilterState {
                city: City::from_id("milano"),
                ..FilterState::default()
            }
        );
    }

    #[test]
    fn default_filters_encode_to_empty_query() {
        assert_eq!(FilterState::default().to_query_string(), "");
    }

    #[test]
    fn query_string_round_trip() {
        let f = busy_filters();
        let encoded = f.to_query_string();
        assert_eq!(FilterState::from_query_string(&encoded), f);
    }

    #[test]
    fn query_string_keeps_custom_city_name() {
        let mut f = FilterState::default();
        f.set_city(City {
            id: "roma".into(),
            name: "Rome".into(),
        });
        let encoded = f.to_query_string();
        assert_eq!(encoded, "city_name=Rome");
        assert_eq!(FilterState::from_query_string(&encoded), f);
    }

    #[test]
    fn hand_built_city_survives_query_string() {
        let mut f = FilterState::default();
        f.set_city(City {
            id: " Milano ".into(),
            name: "Milano".into(),
        });
        assert_eq!(f.city, City::from_id("milano"));
        assert_eq!(f.to_query_string(), "city=milano");
        assert_eq!(FilterState::from_query_string(&f.to_query_string()), f);

        f.set_city(City {
            id: String::new(),
            name: "  ".into(),
        });
        assert_eq!(f.city, City::default());
        assert_eq!(FilterState::from_query_string(&f.to_query_string()), f);
    }

    #[test]
    fn rooms_encode_in_bucket_order() {
        let mut f = FilterState::default();
        f.set_rooms([RoomChoice::FivePlus, RoomChoice::One]);
        assert_eq!(f.to_query_string(), "rooms=1%2C5plus");
    }

    #[test]
    fn garbage_values_are_ignored() {
        let f = FilterState::from_query_string(
            "?price_min=cheap&type=castle&rooms=2,x,9&floor=basement&area_max=-4&bogus=1",
        );
        assert_eq!(f.price_min, None);
        assert_eq!(f.property_type, PropertyType::All);
        assert_eq!(f.rooms, BTreeSet::from([RoomChoice::Two]));
        assert_eq!(f.floor, None);
        assert_eq!(f.area_max, None);
        assert_eq!(f.city, City::default());
    }

    #[test]
    fn saved_filter_json_fills_missing_fields_with_defaults() {
        let f: FilterState = serde_json::from_str(r#"{"price_max": 1500}"#).unwrap();
        assert_eq!(f.price_max, Some(1500));
        assert_eq!(f.city, City::default());
    }
}
