use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const ID_FIELD: &str = "_id";
pub const STATUS_FIELD: &str = "GeocodeStatus";
pub const LAT_FIELD: &str = "GeocodeLat";
pub const LNG_FIELD: &str = "GeocodeLng";
pub const LOCALITY_FIELD: &str = "GeocodeLocality";
pub const ADMIN_AREA_FIELD: &str = "GeocodeAdminAreaLevel1";
pub const COUNTRY_FIELD: &str = "GeocodeCountry";
pub const FULL_ADDRESS_FIELD: &str = "FullAddress";

pub const ZERO_RESULTS: &str = "ZERO_RESULTS";
pub const ERROR_STATUS: &str = "ERROR";

/// One input row. `data` keeps field order so exports come out the way the
/// input went in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(flatten)]
    pub data: Map<String, Value>,
}

impl Record {
    pub fn new(data: Map<String, Value>) -> Self {
        Self { id: None, data }
    }

    /// Builds a record from a JSON object, lifting any `_id` key out of the
    /// field map.
    pub fn from_object(mut data: Map<String, Value>) -> Self {
        let id = match data.remove(ID_FIELD) {
            Some(Value::String(id)) => Some(id),
            Some(other) => Some(other.to_string()),
            None => None,
        };
        Self { id, data }
    }

    pub fn is_processed(&self) -> bool {
        self.data.contains_key(STATUS_FIELD)
    }

    pub fn status(&self) -> Option<&str> {
        self.data.get(STATUS_FIELD).and_then(Value::as_str)
    }

    pub fn merge(&mut self, fields: Map<String, Value>) {
        for (key, value) in fields {
            self.data.insert(key, value);
        }
    }

    pub fn without_id(mut self) -> Self {
        self.id = None;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressComponent {
    pub long_name: String,
    #[serde(default)]
    pub types: Vec<String>,
}

/// Geocoder reply, decoded once at the client boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum GeocodeResponse {
    Resolved {
        location_type: String,
        location: LatLng,
        components: Vec<AddressComponent>,
    },
    ZeroResults,
    Malformed {
        reason: String,
        raw: String,
    },
}

/// Normalized result for one record. Merged into the record, never stored
/// on its own.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeOutcome {
    pub status: String,
    pub location: Option<LatLng>,
    pub locality: String,
    pub admin_area_level_1: String,
    pub country: String,
}

impl GeocodeOutcome {
    pub fn zero_results() -> Self {
        Self::unresolved(ZERO_RESULTS)
    }

    pub fn error() -> Self {
        Self::unresolved(ERROR_STATUS)
    }

    fn unresolved(status: &str) -> Self {
        Self {
            status: status.to_string(),
            location: None,
            locality: String::new(),
            admin_area_level_1: String::new(),
            country: String::new(),
        }
    }

    /// The partial update written back to the store. Coordinates are only
    /// present for a resolved location.
    pub fn into_fields(self, full_address: &str) -> Map<String, Value> {
        let mut fields = Map::new();
        if let Some(location) = self.location {
            fields.insert(LAT_FIELD.to_string(), Value::from(location.lat));
            fields.insert(LNG_FIELD.to_string(), Value::from(location.lng));
        }
        fields.insert(STATUS_FIELD.to_string(), Value::String(self.status));
        fields.insert(LOCALITY_FIELD.to_string(), Value::String(self.locality));
        fields.insert(
            ADMIN_AREA_FIELD.to_string(),
            Value::String(self.admin_area_level_1),
        );
        fields.insert(COUNTRY_FIELD.to_string(), Value::String(self.country));
        fields.insert(
            FULL_ADDRESS_FIELD.to_string(),
            Value::String(full_address.to_string()),
        );
        fields
    }
}
