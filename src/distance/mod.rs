use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod google;

pub use google::GoogleMapsService;

// ============================================================================
// Distance Collaborator
// ============================================================================
//
// One call per priced order: origin (pickup) against every drop location.
// A single unreachable drop invalidates the whole result, because delivery
// cost is additive across legs.
//
// ============================================================================

/// A WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// Per-drop status reported by the distance service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LegStatus {
    Ok,
    NotFound,
    ZeroResults,
    Other(String),
}

impl LegStatus {
    pub fn from_api(status: &str) -> Self {
        match status {
            "OK" => LegStatus::Ok,
            "NOT_FOUND" => LegStatus::NotFound,
            "ZERO_RESULTS" => LegStatus::ZeroResults,
            other => LegStatus::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            LegStatus::Ok => "OK",
            LegStatus::NotFound => "NOT_FOUND",
            LegStatus::ZeroResults => "ZERO_RESULTS",
            LegStatus::Other(s) => s,
        }
    }
}

/// One origin-to-drop leg of the distance matrix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Leg {
    pub drop_index: usize,
    pub distance_km: f64,
    pub duration_secs: i64,
    pub status: LegStatus,
}

/// Result of a distance calculation: total plus per-leg breakdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistanceMatrix {
    pub total_distance_km: f64,
    pub legs: Vec<Leg>,
}

#[derive(Debug, thiserror::Error)]
pub enum DistanceError {
    #[error("invalid coordinates: lat {lat}, lng {lng}")]
    InvalidCoordinates { lat: f64, lng: f64 },

    #[error("distance service not configured")]
    NotConfigured,

    #[error("distance matrix request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("distance service error: {0}")]
    Service(String),

    #[error("no route to drop {drop_index}: {status}")]
    UnreachableDrop { drop_index: usize, status: String },
}

/// Distance-calculation collaborator used by the pricing engine.
#[async_trait]
pub trait DistanceService: Send + Sync {
    /// Compute distances from one origin to every destination.
    ///
    /// Fails if any destination is unreachable; a partial matrix is never
    /// returned.
    async fn calculate(
        &self,
        origin: LatLng,
        destinations: &[LatLng],
    ) -> Result<DistanceMatrix, DistanceError>;
}
