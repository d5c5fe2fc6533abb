use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn interpolate(self, other: Self, t: f64) -> Self {
        Self {
            lat: self.lat + (other.lat - self.lat) * t,
            lon: self.lon + (other.lon - self.lon) * t,
        }
    }

    pub fn midpoint(self, other: Self) -> Self {
        self.interpolate(other, 0.5)
    }
}

/// Travel profiles understood by the directions API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TravelProfile {
    #[default]
    #[serde(rename = "driving-car")]
    DrivingCar,
    #[serde(rename = "cycling-regular")]
    CyclingRegular,
    #[serde(rename = "foot-walking")]
    FootWalking,
}

impl TravelProfile {
    pub const ALL: [TravelProfile; 3] = [
        TravelProfile::DrivingCar,
        TravelProfile::CyclingRegular,
        TravelProfile::FootWalking,
    ];

    /// Path segment used by the directions API.
    pub fn as_str(self) -> &'static str {
        match self {
            TravelProfile::DrivingCar => "driving-car",
            TravelProfile::CyclingRegular => "cycling-regular",
            TravelProfile::FootWalking => "foot-walking",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TravelProfile::DrivingCar => "Driving",
            TravelProfile::CyclingRegular => "Cycling",
            TravelProfile::FootWalking => "Walking",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == name)
    }
}

// ----------------------------------------------------------------------------
// Route finder
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteRequest {
    /// Free-text start. Blank means "detect from the caller's IP".
    #[serde(default)]
    pub current_location: Option<String>,
    pub destination: String,
    #[serde(default)]
    pub profile: TravelProfile,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteResponse {
    pub start_label: String,
    pub dest_label: String,
    pub start: Coordinate,
    pub end: Coordinate,
    pub path: Vec<Coordinate>,
    pub distance_km: f64,
    pub duration_min: f64,
    pub distance_text: String,
    pub duration_text: String,
    pub profile: TravelProfile,
    pub mode_label: String,
    pub gpx_base64: String,
    pub scene: MapScene,
}

// ----------------------------------------------------------------------------
// Place graph
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub name: String,
    pub position: Coordinate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Road {
    pub from: String,
    pub to: String,
    pub distance_km: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddPlaceRequest {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddRoadRequest {
    pub from: String,
    pub to: String,
    pub distance_km: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointRequest {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphView {
    pub places: Vec<Place>,
    pub roads: Vec<Road>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_path: Option<PathResponse>,
    pub scene: MapScene,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathResponse {
    pub start: String,
    pub end: String,
    pub path: Vec<String>,
    pub distance_km: f64,
    pub distance_text: String,
    pub time_estimate: String,
}

// ----------------------------------------------------------------------------
// Live tracker
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionSample {
    pub lat: f64,
    pub lon: f64,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl PositionSample {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate {
            lat: self.lat,
            lon: self.lon,
        }
    }
}

/// Sample as reported by the browser geolocation watcher.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PositionUpdate {
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub accuracy: Option<f64>,
    #[serde(default)]
    pub heading: Option<f64>,
    #[serde(default)]
    pub speed: Option<f64>,
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub error: bool,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionAck {
    pub accepted: bool,
    pub point_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestinationRequest {
    #[serde(default)]
    pub destination: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerView {
    pub tracking: bool,
    pub positions: Vec<PositionSample>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    pub heading_deg: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scene: Option<MapScene>,
    pub gpx_base64: String,
}

// ----------------------------------------------------------------------------
// Map scene
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TileStyle {
    #[default]
    Standard,
    Dark,
}

/// Everything the browser map widget needs to draw one view.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MapScene {
    pub center: Coordinate,
    pub zoom: u8,
    #[serde(default)]
    pub tiles: TileStyle,
    #[serde(default)]
    pub markers: Vec<MapMarker>,
    #[serde(default)]
    pub circles: Vec<CircleMarker>,
    #[serde(default)]
    pub polylines: Vec<MapPolyline>,
    #[serde(default)]
    pub labels: Vec<MapLabel>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapMarker {
    pub position: Coordinate,
    pub popup: String,
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircleMarker {
    pub position: Coordinate,
    pub radius: u32,
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub popup: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapPolyline {
    pub path: Vec<Coordinate>,
    pub color: String,
    pub weight: u32,
    pub opacity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dash_array: Option<String>,
}

/// Free-floating text or glyph anchored at a position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapLabel {
    pub position: Coordinate,
    pub text: String,
    pub class: String,
    #[serde(default)]
    pub rotation_deg: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub popup: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_uses_directions_api_names() {
        let json = serde_json::to_string(&TravelProfile::CyclingRegular).unwrap();
        assert_eq!(json, "\"cycling-regular\"");
        let parsed: TravelProfile = serde_json::from_str("\"foot-walking\"").unwrap();
        assert_eq!(parsed, TravelProfile::FootWalking);
        assert_eq!(TravelProfile::from_name("driving-car"), Some(TravelProfile::DrivingCar));
        assert_eq!(TravelProfile::from_name("boat"), None);
    }

    #[test]
    fn route_request_defaults_profile_and_start() {
        let req: RouteRequest = serde_json::from_str(r#"{"destination":"Delhi"}"#).unwrap();
        assert_eq!(req.profile, TravelProfile::DrivingCar);
        assert!(req.current_location.is_none());
    }

    #[test]
    fn browser_error_payload_parses() {
        let update: PositionUpdate =
            serde_json::from_str(r#"{"error":true,"message":"denied"}"#).unwrap();
        assert!(update.error);
        assert!(update.latitude.is_none());
    }

    #[test]
    fn midpoint_is_halfway() {
        let mid = Coordinate::new(10.0, 20.0).midpoint(Coordinate::new(20.0, 40.0));
        assert_eq!(mid, Coordinate::new(15.0, 30.0));
    }
}
