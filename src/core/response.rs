//! Geocoder response handling.
//!
//! The service answers with a loosely shaped document whose layout depends on
//! `status`. [`decode`] turns the raw body into a [`GeocodeResponse`] right
//! away; [`interpret`] then works on that closed shape only.

use crate::domain::model::{
    AddressComponent, GeocodeOutcome, GeocodeResponse, LatLng, ZERO_RESULTS,
};
use crate::utils::error::GeocodeError;
use serde::Deserialize;
use serde_json::Value;

pub const LOCALITY: &str = "locality";
pub const ADMIN_AREA_LEVEL_1: &str = "administrative_area_level_1";
pub const COUNTRY: &str = "country";

/// Only `status` is typed up front; `results` is left untouched until the
/// status says there is something to read.
#[derive(Debug, Deserialize)]
struct RawResponse {
    status: Option<String>,
    #[serde(default)]
    results: Value,
}

#[derive(Debug, Deserialize)]
struct RawResult {
    geometry: Option<RawGeometry>,
    #[serde(default)]
    address_components: Vec<AddressComponent>,
}

#[derive(Debug, Deserialize)]
struct RawGeometry {
    location: Option<LatLng>,
    location_type: Option<String>,
}

/// Decodes a response body. Never fails: anything unexpected becomes
/// [`GeocodeResponse::Malformed`] carrying the body.
pub fn decode(body: &str) -> GeocodeResponse {
    let malformed = |reason: String| GeocodeResponse::Malformed {
        reason,
        raw: body.to_string(),
    };

    let raw: RawResponse = match serde_json::from_str(body) {
        Ok(raw) => raw,
        Err(e) => return malformed(format!("invalid JSON: {}", e)),
    };

    let Some(status) = raw.status else {
        return malformed("missing status".to_string());
    };

    if status == ZERO_RESULTS {
        return GeocodeResponse::ZeroResults;
    }

    let results: Vec<RawResult> = match serde_json::from_value(raw.results) {
        Ok(results) => results,
        Err(e) => return malformed(format!("unexpected results: {}", e)),
    };
    let Some(first) = results.into_iter().next() else {
        return malformed(format!("status {} without results", status));
    };
    let Some(geometry) = first.geometry else {
        return malformed("results[0] has no geometry".to_string());
    };
    let Some(location_type) = geometry.location_type else {
        return malformed("results[0].geometry has no location_type".to_string());
    };
    let Some(location) = geometry.location else {
        return malformed("results[0].geometry has no location".to_string());
    };

    GeocodeResponse::Resolved {
        location_type,
        location,
        components: first.address_components,
    }
}

/// Normalizes a decoded response. `Malformed` is surfaced as an error with
/// the raw payload so the caller can log it and mark the record.
pub fn interpret(response: &GeocodeResponse) -> Result<GeocodeOutcome, GeocodeError> {
    match response {
        GeocodeResponse::ZeroResults => Ok(GeocodeOutcome::zero_results()),
        GeocodeResponse::Resolved {
            location_type,
            location,
            components,
        } => Ok(GeocodeOutcome {
            status: location_type.clone(),
            location: Some(*location),
            locality: first_of_type(components, LOCALITY),
            admin_area_level_1: first_of_type(components, ADMIN_AREA_LEVEL_1),
            country: first_of_type(components, COUNTRY),
        }),
        GeocodeResponse::Malformed { reason, raw } => Err(GeocodeError::Malformed {
            reason: reason.clone(),
            raw: raw.clone(),
        }),
    }
}

/// `long_name` of the first component tagged with `category`, or "".
fn first_of_type(components: &[AddressComponent], category: &str) -> String {
    components
        .iter()
        .find(|c| c.types.iter().any(|t| t == category))
        .map(|c| c.long_name.clone())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn boston_body() -> String {
        json!({
            "status": "OK",
            "results": [{
                "geometry": {
                    "location": {"lat": 42.3601, "lng": -71.0589},
                    "location_type": "APPROXIMATE"
                },
                "address_components": [
                    {"long_name": "Boston", "short_name": "Boston", "types": ["locality", "political"]},
                    {"long_name": "Suffolk County", "types": ["administrative_area_level_2", "political"]},
                    {"long_name": "Massachusetts", "short_name": "MA", "types": ["administrative_area_level_1", "political"]},
                    {"long_name": "United States", "short_name": "US", "types": ["country", "political"]}
                ]
            }]
        })
        .to_string()
    }

    #[test]
    fn test_zero_results() {
        let response = decode(r#"{"status": "ZERO_RESULTS", "results": []}"#);
        assert_eq!(response, GeocodeResponse::ZeroResults);

        let outcome = interpret(&response).unwrap();
        assert_eq!(outcome.status, "ZERO_RESULTS");
        assert_eq!(outcome.location, None);
        assert_eq!(outcome.locality, "");
        assert_eq!(outcome.admin_area_level_1, "");
        assert_eq!(outcome.country, "");
    }

    #[test]
    fn test_zero_results_without_results_key() {
        assert_eq!(
            decode(r#"{"status": "ZERO_RESULTS"}"#),
            GeocodeResponse::ZeroResults
        );

        // results is never read once the status says there are none
        for body in [
            r#"{"status": "ZERO_RESULTS", "results": null}"#,
            r#"{"status": "ZERO_RESULTS", "results": {"unexpected": true}}"#,
            r#"{"status": "ZERO_RESULTS", "results": [42]}"#,
        ] {
            assert_eq!(decode(body), GeocodeResponse::ZeroResults, "{}", body);
            assert_eq!(interpret(&decode(body)).unwrap().status, "ZERO_RESULTS");
        }
    }

    #[test]
    fn test_resolved_extracts_components() {
        let outcome = interpret(&decode(&boston_body())).unwrap();

        assert_eq!(outcome.status, "APPROXIMATE");
        assert_eq!(
            outcome.location,
            Some(LatLng {
                lat: 42.3601,
                lng: -71.0589
            })
        );
        assert_eq!(outcome.locality, "Boston");
        assert_eq!(outcome.admin_area_level_1, "Massachusetts");
        assert_eq!(outcome.country, "United States");
    }

    #[test]
    fn test_missing_locality_is_empty() {
        let body = json!({
            "status": "OK",
            "results": [{
                "geometry": {
                    "location": {"lat": 46.2, "lng": 2.2},
                    "location_type": "APPROXIMATE"
                },
                "address_components": [
                    {"long_name": "France", "types": ["country", "political"]}
                ]
            }]
        })
        .to_string();

        let outcome = interpret(&decode(&body)).unwrap();
        assert_eq!(outcome.locality, "");
        assert_eq!(outcome.admin_area_level_1, "");
        assert_eq!(outcome.country, "France");
    }

    #[test]
    fn test_first_matching_component_wins() {
        let components = vec![
            AddressComponent {
                long_name: "Cambridge".into(),
                types: vec!["locality".into()],
            },
            AddressComponent {
                long_name: "Boston".into(),
                types: vec!["locality".into()],
            },
        ];
        assert_eq!(first_of_type(&components, LOCALITY), "Cambridge");
    }

    #[test]
    fn test_location_type_overrides_top_level_status() {
        let outcome = interpret(&decode(&boston_body())).unwrap();
        assert_ne!(outcome.status, "OK");
    }

    #[test]
    fn test_structural_anomalies_are_malformed() {
        for body in [
            "not json",
            r#"{"results": []}"#,
            r#"{"status": "OK", "results": []}"#,
            r#"{"status": "OK", "results": null}"#,
            r#"{"status": "OK", "results": {"geometry": {}}}"#,
            r#"{"status": "OVER_QUERY_LIMIT"}"#,
            r#"{"status": "OK", "results": [{}]}"#,
            r#"{"status": "OK", "results": [{"geometry": {"location": {"lat": 1.0, "lng": 2.0}}}]}"#,
            r#"{"status": "OK", "results": [{"geometry": {"location_type": "ROOFTOP"}}]}"#,
        ] {
            let response = decode(body);
            assert!(
                matches!(response, GeocodeResponse::Malformed { ref raw, .. } if raw == body),
                "expected malformed for {}",
                body
            );

            match interpret(&response) {
                Err(GeocodeError::Malformed { raw, .. }) => assert_eq!(raw, body),
                other => panic!("unexpected {:?}", other),
            }
        }
    }

    #[test]
    fn test_missing_address_components_is_not_an_error() {
        let body = r#"{"status": "OK", "results": [{"geometry": {"location": {"lat": 1.0, "lng": 2.0}, "location_type": "ROOFTOP"}}]}"#;
        let outcome = interpret(&decode(body)).unwrap();
        assert_eq!(outcome.status, "ROOFTOP");
        assert_eq!(outcome.country, "");
    }
}
