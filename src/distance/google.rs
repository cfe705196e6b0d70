use async_trait::async_trait;
use serde::Deserialize;

use super::{DistanceError, DistanceMatrix, DistanceService, LatLng, Leg, LegStatus};

// ============================================================================
// Google Distance Matrix Client
// ============================================================================

const BASE_URL: &str = "https://maps.googleapis.com/maps/api/distancematrix/json";

pub struct GoogleMapsService {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GoogleMapsService {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: BASE_URL.to_string(),
        }
    }

    /// Point the client at a different endpoint (test servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn format_point(point: &LatLng) -> String {
        format!("{},{}", point.lat, point.lng)
    }
}

// Wire format of the Distance Matrix API, reduced to the fields we read.

#[derive(Deserialize)]
struct MatrixResponse {
    status: String,
    error_message: Option<String>,
    rows: Vec<MatrixRow>,
}

#[derive(Deserialize)]
struct MatrixRow {
    elements: Vec<MatrixElement>,
}

#[derive(Deserialize)]
struct MatrixElement {
    status: String,
    distance: Option<ValueField>,
    duration: Option<ValueField>,
}

#[derive(Deserialize)]
struct ValueField {
    value: i64,
}

#[async_trait]
impl DistanceService for GoogleMapsService {
    async fn calculate(
        &self,
        origin: LatLng,
        destinations: &[LatLng],
    ) -> Result<DistanceMatrix, DistanceError> {
        if self.api_key.is_empty() {
            return Err(DistanceError::NotConfigured);
        }

        for point in std::iter::once(&origin).chain(destinations) {
            if !point.is_valid() {
                return Err(DistanceError::InvalidCoordinates {
                    lat: point.lat,
                    lng: point.lng,
                });
            }
        }

        let origins = Self::format_point(&origin);
        let dests = destinations
            .iter()
            .map(Self::format_point)
            .collect::<Vec<_>>()
            .join("|");

        let response: MatrixResponse = self
            .client
            .get(&self.base_url)
            .query(&[
                ("origins", origins.as_str()),
                ("destinations", dests.as_str()),
                ("units", "metric"),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if response.status != "OK" {
            let detail = response
                .error_message
                .map(|m| format!("{}: {}", response.status, m))
                .unwrap_or(response.status);
            return Err(DistanceError::Service(detail));
        }

        let elements = response
            .rows
            .first()
            .map(|row| row.elements.as_slice())
            .unwrap_or(&[]);

        if elements.len() != destinations.len() {
            return Err(DistanceError::Service(format!(
                "expected {} legs, got {}",
                destinations.len(),
                elements.len()
            )));
        }

        let mut total_meters: i64 = 0;
        let mut legs = Vec::with_capacity(elements.len());

        for (index, element) in elements.iter().enumerate() {
            let status = LegStatus::from_api(&element.status);
            if status != LegStatus::Ok {
                // One bad leg poisons the whole quote.
                return Err(DistanceError::UnreachableDrop {
                    drop_index: index + 1,
                    status: status.as_str().to_string(),
                });
            }

            let meters = element.distance.as_ref().map(|d| d.value).unwrap_or(0);
            total_meters += meters;

            legs.push(Leg {
                drop_index: index,
                distance_km: meters as f64 / 1000.0,
                duration_secs: element.duration.as_ref().map(|d| d.value).unwrap_or(0),
                status,
            });
        }

        let total_distance_km = (total_meters as f64 / 1000.0 * 100.0).round() / 100.0;

        tracing::debug!(
            total_distance_km = total_distance_km,
            legs = legs.len(),
            "Distance matrix resolved"
        );

        Ok(DistanceMatrix {
            total_distance_km,
            legs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_api_key_is_not_configured() {
        let service = GoogleMapsService::new("");
        let result = service
            .calculate(
                LatLng { lat: 13.75, lng: 100.5 },
                &[LatLng { lat: 13.76, lng: 100.53 }],
            )
            .await;

        assert!(matches!(result, Err(DistanceError::NotConfigured)));
    }

    #[tokio::test]
    async fn test_invalid_coordinates_rejected_before_any_request() {
        let service = GoogleMapsService::new("key");
        let result = service
            .calculate(
                LatLng { lat: 95.0, lng: 100.5 },
                &[LatLng { lat: 13.76, lng: 100.53 }],
            )
            .await;

        assert!(matches!(
            result,
            Err(DistanceError::InvalidCoordinates { lat, .. }) if lat == 95.0
        ));
    }

    #[test]
    fn test_point_formatting() {
        let point = LatLng { lat: 13.7563, lng: 100.5018 };
        assert_eq!(GoogleMapsService::format_point(&point), "13.7563,100.5018");
    }

    #[test]
    fn test_response_parsing() {
        let body = r#"{
            "status": "OK",
            "rows": [{"elements": [
                {"status": "OK", "distance": {"value": 1500}, "duration": {"value": 300}},
                {"status": "OK", "distance": {"value": 500}, "duration": {"value": 120}}
            ]}]
        }"#;

        let parsed: MatrixResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.status, "OK");
        assert_eq!(parsed.rows[0].elements.len(), 2);
        assert_eq!(parsed.rows[0].elements[0].distance.as_ref().unwrap().value, 1500);
    }
}
