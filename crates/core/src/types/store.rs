//! Retail locations carrying Dabs products.

use serde::{Deserialize, Serialize};

use crate::geo::Coordinates;

/// One row of the `Stores` sheet.
///
/// Records are read-only and carry no key: a store's identity is its
/// position in the most recent fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreRecord {
    pub state: String,
    pub name: String,
    pub address: String,
    pub city: String,
    pub zip: String,
    pub phone: String,
    #[serde(rename = "lat")]
    pub latitude: f64,
    #[serde(rename = "lng")]
    pub longitude: f64,
}

impl StoreRecord {
    #[must_use]
    pub const fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }

    /// Digits of the phone number, for `tel:` links.
    #[must_use]
    pub fn phone_digits(&self) -> String {
        self.phone.chars().filter(char::is_ascii_digit).collect()
    }

    /// Google Maps driving directions to this store.
    #[must_use]
    pub fn directions_url(&self) -> String {
        format!(
            "https://www.google.com/maps/dir/?api=1&destination={},{}",
            self.latitude, self.longitude
        )
    }

    /// `"City, ST 87101"`.
    #[must_use]
    pub fn locality(&self) -> String {
        format!("{}, {} {}", self.city, self.state, self.zip)
    }
}

#[cfg(test)]
pub(crate) fn sample_store(name: &str, state: &str, zip: &str, lat: f64, lng: f64) -> StoreRecord {
    StoreRecord {
        state: state.to_string(),
        name: name.to_string(),
        address: "100 Central Ave".to_string(),
        city: "Albuquerque".to_string(),
        zip: zip.to_string(),
        phone: "(505) 555-0100".to_string(),
        latitude: lat,
        longitude: lng,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_phone_digits() {
        let store = sample_store("Green Leaf", "NM", "87102", 35.08, -106.65);
        assert_eq!(store.phone_digits(), "5055550100");
    }

    #[test]
    fn test_wire_field_names() {
        let store = sample_store("Green Leaf", "NM", "87102", 35.08, -106.65);
        let json = serde_json::to_value(&store).unwrap();
        assert_eq!(json["lat"], 35.08);
        assert_eq!(json["lng"], -106.65);
        assert!(json.get("latitude").is_none());
    }

    #[test]
    fn test_directions_and_locality() {
        let store = sample_store("Green Leaf", "NM", "87102", 35.08, -106.65);
        assert_eq!(
            store.directions_url(),
            "https://www.google.com/maps/dir/?api=1&destination=35.08,-106.65"
        );
        assert_eq!(store.locality(), "Albuquerque, NM 87102");
    }
}
