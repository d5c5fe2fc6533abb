//! Turn-by-turn route geometry from an OpenRouteService-compatible API.

use std::time::Duration;

use async_trait::async_trait;
use axum::http::StatusCode;
use geojson::FeatureCollection;
use serde_json::{Value, json};

use crate::error::HttpStatus;
use crate::models::{Coordinate, TravelProfile};

const PLACEHOLDER_KEY: &str = "YOUR_API_KEY_HERE";

#[derive(Debug, thiserror::Error)]
pub enum DirectionsError {
    #[error("please set your OpenRouteService API key (ORS_API_KEY)")]
    MissingApiKey,
    #[error("directions request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("directions service responded with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid directions payload: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("no route found")]
    NoRoute,
    #[error("route geometry is not a line: {0}")]
    Geometry(String),
}

impl HttpStatus for DirectionsError {
    fn status(&self) -> StatusCode {
        match self {
            DirectionsError::MissingApiKey => StatusCode::SERVICE_UNAVAILABLE,
            DirectionsError::NoRoute => StatusCode::NOT_FOUND,
            _ => StatusCode::BAD_GATEWAY,
        }
    }
}

/// What the map needs from a directions answer.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteSummary {
    pub distance_km: f64,
    pub duration_min: f64,
    /// Geometry in travel order.
    pub path: Vec<Coordinate>,
}

#[async_trait]
pub trait DirectionsProvider: Send + Sync {
    async fn route(
        &self,
        start: Coordinate,
        end: Coordinate,
        profile: TravelProfile,
    ) -> Result<RouteSummary, DirectionsError>;
}

#[derive(Debug, Clone)]
pub struct OrsConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl Default for OrsConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openrouteservice.org".into(),
            api_key: String::new(),
            timeout: Duration::from_secs(15),
        }
    }
}

impl OrsConfig {
    pub fn has_api_key(&self) -> bool {
        let key = self.api_key.trim();
        !key.is_empty() && !key.contains(PLACEHOLDER_KEY)
    }
}

pub struct OpenRouteService {
    client: reqwest::Client,
    config: OrsConfig,
}

impl OpenRouteService {
    pub fn new(config: OrsConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl DirectionsProvider for OpenRouteService {
    async fn route(
        &self,
        start: Coordinate,
        end: Coordinate,
        profile: TravelProfile,
    ) -> Result<RouteSummary, DirectionsError> {
        if !self.config.has_api_key() {
            return Err(DirectionsError::MissingApiKey);
        }

        let url = format!(
            "{}/v2/directions/{}/geojson",
            self.config.base_url.trim_end_matches('/'),
            profile.as_str()
        );
        // The API wants [lon, lat] pairs.
        let body = json!({
            "coordinates": [[start.lon, start.lat], [end.lon, end.lat]]
        });

        tracing::debug!("requesting {} route from {url}", profile.as_str());
        let response = self
            .client
            .post(url)
            .header("Authorization", self.config.api_key.trim())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DirectionsError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        let summary = parse_route_geojson(&bytes)?;
        tracing::debug!(
            "route has {} points, {:.2} km, {:.1} min",
            summary.path.len(),
            summary.distance_km,
            summary.duration_min
        );
        Ok(summary)
    }
}

/// Read the first feature of a directions `FeatureCollection`.
///
/// `properties.summary.distance` is in metres and `duration` in seconds; both
/// default to zero when missing.
pub fn parse_route_geojson(body: &[u8]) -> Result<RouteSummary, DirectionsError> {
    let collection: FeatureCollection = serde_json::from_slice(body)?;
    let feature = collection
        .features
        .into_iter()
        .next()
        .ok_or(DirectionsError::NoRoute)?;

    let summary = feature
        .properties
        .as_ref()
        .and_then(|props| props.get("summary"));
    let summary_field = |name: &str| {
        summary
            .and_then(|s| s.get(name))
            .and_then(Value::as_f64)
            .unwrap_or(0.0)
    };
    let distance_km = summary_field("distance") / 1000.0;
    let duration_min = summary_field("duration") / 60.0;

    let geometry = feature
        .geometry
        .ok_or_else(|| DirectionsError::Geometry("feature has no geometry".into()))?;
    let line: geo_types::LineString<f64> = geometry
        .value
        .try_into()
        .map_err(|err: geojson::Error| DirectionsError::Geometry(err.to_string()))?;

    let path = line
        .coords()
        .map(|c| Coordinate { lat: c.y, lon: c.x })
        .collect();

    Ok(RouteSummary {
        distance_km,
        duration_min,
        path,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Json, Router, http::HeaderMap, routing::post};

    use super::*;

    const SAMPLE: &str = r#"{
        "type": "FeatureCollection",
        "bbox": [76.7794, 28.6139, 77.209, 30.7333],
        "features": [{
            "type": "Feature",
            "bbox": [76.7794, 28.6139, 77.209, 30.7333],
            "properties": {
                "summary": {"distance": 245310.4, "duration": 15930.0},
                "way_points": [0, 2]
            },
            "geometry": {
                "type": "LineString",
                "coordinates": [[76.7794, 30.7333], [77.0, 29.5], [77.209, 28.6139]]
            }
        }],
        "metadata": {"service": "routing"}
    }"#;

    #[test]
    fn parses_summary_and_flips_coordinates() {
        let summary = parse_route_geojson(SAMPLE.as_bytes()).unwrap();
        assert!((summary.distance_km - 245.3104).abs() < 1e-9);
        assert!((summary.duration_min - 265.5).abs() < 1e-9);
        assert_eq!(summary.path.len(), 3);
        assert_eq!(
            summary.path[0],
            Coordinate {
                lat: 30.7333,
                lon: 76.7794
            }
        );
    }

    #[test]
    fn empty_collection_is_no_route() {
        let body = r#"{"type": "FeatureCollection", "features": []}"#;
        assert!(matches!(
            parse_route_geojson(body.as_bytes()),
            Err(DirectionsError::NoRoute)
        ));
    }

    #[test]
    fn missing_summary_defaults_to_zero() {
        let body = r#"{
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": {},
                "geometry": {"type": "LineString", "coordinates": [[5.0, 45.0], [5.1, 45.1]]}
            }]
        }"#;
        let summary = parse_route_geojson(body.as_bytes()).unwrap();
        assert_eq!(summary.distance_km, 0.0);
        assert_eq!(summary.duration_min, 0.0);
    }

    #[test]
    fn point_geometry_is_rejected() {
        let body = r#"{
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": null,
                "geometry": {"type": "Point", "coordinates": [5.0, 45.0]}
            }]
        }"#;
        assert!(matches!(
            parse_route_geojson(body.as_bytes()),
            Err(DirectionsError::Geometry(_))
        ));
    }

    #[test]
    fn placeholder_key_counts_as_missing() {
        let config = OrsConfig {
            api_key: "YOUR_API_KEY_HERE".into(),
            ..OrsConfig::default()
        };
        assert!(!config.has_api_key());
        assert!(!OrsConfig::default().has_api_key());
    }

    #[tokio::test]
    async fn missing_key_fails_before_any_request() {
        let ors = OpenRouteService::new(OrsConfig {
            base_url: "http://127.0.0.1:9".into(),
            ..OrsConfig::default()
        })
        .unwrap();
        let err = ors
            .route(
                Coordinate { lat: 0.0, lon: 0.0 },
                Coordinate { lat: 1.0, lon: 1.0 },
                TravelProfile::FootWalking,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DirectionsError::MissingApiKey));
    }

    #[derive(Default, Clone)]
    struct Seen {
        auth: Option<String>,
        body: Option<Value>,
    }

    async fn spawn_stub(seen: Arc<Mutex<Seen>>) -> String {
        let app = Router::new().route(
            "/v2/directions/cycling-regular/geojson",
            post(move |headers: HeaderMap, Json(body): Json<Value>| {
                let seen = seen.clone();
                async move {
                    let mut guard = seen.lock().unwrap();
                    guard.auth = headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string);
                    guard.body = Some(body);
                    Json(serde_json::from_str::<Value>(SAMPLE).unwrap())
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn posts_lon_lat_pairs_with_key() {
        let seen = Arc::new(Mutex::new(Seen::default()));
        let base_url = spawn_stub(seen.clone()).await;
        let ors = OpenRouteService::new(OrsConfig {
            base_url,
            api_key: "secret".into(),
            ..OrsConfig::default()
        })
        .unwrap();

        let summary = ors
            .route(
                Coordinate {
                    lat: 30.7333,
                    lon: 76.7794,
                },
                Coordinate {
                    lat: 28.6139,
                    lon: 77.209,
                },
                TravelProfile::CyclingRegular,
            )
            .await
            .unwrap();
        assert_eq!(summary.path.len(), 3);

        let seen = seen.lock().unwrap().clone();
        assert_eq!(seen.auth.as_deref(), Some("secret"));
        assert_eq!(
            seen.body.unwrap(),
            json!({"coordinates": [[76.7794, 30.7333], [77.209, 28.6139]]})
        );
    }

    #[tokio::test]
    async fn upstream_status_is_reported() {
        let app = Router::new().route(
            "/v2/directions/driving-car/geojson",
            post(|| async { (StatusCode::FORBIDDEN, "quota exceeded") }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let ors = OpenRouteService::new(OrsConfig {
            base_url: format!("http://{addr}"),
            api_key: "secret".into(),
            ..OrsConfig::default()
        })
        .unwrap();
        let err = ors
            .route(
                Coordinate { lat: 0.0, lon: 0.0 },
                Coordinate { lat: 1.0, lon: 1.0 },
                TravelProfile::DrivingCar,
            )
            .await
            .unwrap_err();
        match err {
            DirectionsError::Status { status, body } => {
                assert_eq!(status, 403);
                assert_eq!(body, "quota exceeded");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
