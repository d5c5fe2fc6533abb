//! Free-text place lookup against a Nominatim-compatible search API.

use std::time::Duration;

use async_trait::async_trait;
use axum::http::StatusCode;
use serde::Deserialize;
use tokio::{sync::Mutex, time::Instant};

use crate::error::HttpStatus;
use crate::models::Coordinate;

/// Pause before the one-shot fallback lookup in [`resolve_place`].
pub const FALLBACK_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, thiserror::Error)]
pub enum GeocodeError {
    #[error("geocoding request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("geocoding service responded with status {0}")]
    Status(u16),
    #[error("geocoding service returned an invalid coordinate `{0}`")]
    InvalidCoordinate(String),
}

impl GeocodeError {
    fn is_transient(&self) -> bool {
        match self {
            GeocodeError::Http(_) => true,
            GeocodeError::Status(code) => *code >= 500 || *code == 429,
            GeocodeError::InvalidCoordinate(_) => false,
        }
    }
}

impl HttpStatus for GeocodeError {
    fn status(&self) -> StatusCode {
        StatusCode::BAD_GATEWAY
    }

    fn user_message(&self) -> String {
        format!("Error: {self}")
    }
}

/// Resolves a place description to a coordinate.
///
/// `Ok(None)` means the service answered but found nothing.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, query: &str) -> Result<Option<Coordinate>, GeocodeError>;

    /// A single request with no retries of its own.
    async fn geocode_once(&self, query: &str) -> Result<Option<Coordinate>, GeocodeError> {
        self.geocode(query).await
    }
}

#[derive(Debug, Clone)]
pub struct NominatimConfig {
    pub base_url: String,
    pub user_agent: String,
    pub timeout: Duration,
    /// Minimum spacing between two outgoing requests.
    pub min_delay: Duration,
    pub max_retries: u32,
    pub error_wait: Duration,
}

impl Default for NominatimConfig {
    fn default() -> Self {
        Self {
            base_url: "https://nominatim.openstreetmap.org".into(),
            user_agent: "routefinder".into(),
            timeout: Duration::from_secs(10),
            min_delay: Duration::from_secs(1),
            max_retries: 2,
            error_wait: Duration::from_secs(2),
        }
    }
}

pub struct NominatimGeocoder {
    client: reqwest::Client,
    config: NominatimConfig,
    last_request: Mutex<Option<Instant>>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    lat: String,
    lon: String,
    #[serde(default)]
    display_name: Option<String>,
}

impl SearchHit {
    fn coordinate(&self) -> Result<Coordinate, GeocodeError> {
        let parse = |raw: &str| {
            raw.trim()
                .parse::<f64>()
                .map_err(|_| GeocodeError::InvalidCoordinate(raw.to_string()))
        };
        Ok(Coordinate {
            lat: parse(&self.lat)?,
            lon: parse(&self.lon)?,
        })
    }
}

impl NominatimGeocoder {
    pub fn new(config: NominatimConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            client,
            config,
            last_request: Mutex::new(None),
        })
    }

    /// Sleep until `min_delay` has passed since the previous request.
    async fn throttle(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.config.min_delay {
                tokio::time::sleep(self.config.min_delay - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }

    async fn search(&self, query: &str) -> Result<Option<Coordinate>, GeocodeError> {
        let url = format!("{}/search", self.config.base_url.trim_end_matches('/'));
        let response = self
            .client
            .get(url)
            .query(&[("q", query), ("format", "json"), ("limit", "1")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeocodeError::Status(status.as_u16()));
        }

        let hits: Vec<SearchHit> = response.json().await?;
        match hits.first() {
            Some(hit) => {
                let coord = hit.coordinate()?;
                tracing::debug!(
                    "geocoded {query:?} to ({:.5}, {:.5}) {}",
                    coord.lat,
                    coord.lon,
                    hit.display_name.as_deref().unwrap_or_default()
                );
                Ok(Some(coord))
            }
            None => Ok(None),
        }
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, query: &str) -> Result<Option<Coordinate>, GeocodeError> {
        let mut attempt = 0;
        loop {
            self.throttle().await;
            match self.search(query).await {
                Ok(hit) => return Ok(hit),
                Err(err) if err.is_transient() && attempt < self.config.max_retries => {
                    attempt += 1;
                    tracing::warn!(
                        "geocoding {query:?} failed ({err}), retry {attempt}/{}",
                        self.config.max_retries
                    );
                    tokio::time::sleep(self.config.error_wait).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn geocode_once(&self, query: &str) -> Result<Option<Coordinate>, GeocodeError> {
        self.throttle().await;
        self.search(query).await
    }
}

/// Best-effort lookup used by the route finder.
///
/// Blank input resolves to `None` without touching the network. A failed
/// lookup is followed by one plain request after [`FALLBACK_DELAY`]; a
/// second failure is reported as "not found".
pub async fn resolve_place(geocoder: &dyn Geocoder, text: &str) -> Option<Coordinate> {
    let query = text.trim();
    if query.is_empty() {
        return None;
    }

    match geocoder.geocode(query).await {
        Ok(hit) => hit,
        Err(err) => {
            tracing::warn!("geocoding {query:?} failed ({err}), trying once more");
            tokio::time::sleep(FALLBACK_DELAY).await;
            match geocoder.geocode_once(query).await {
                Ok(hit) => hit,
                Err(err) => {
                    tracing::warn!("fallback geocoding {query:?} failed: {err}");
                    None
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use axum::{Json, Router, extract::Query, routing::get};
    use serde_json::json;

    use super::*;

    struct FlakyGeocoder {
        calls: AtomicUsize,
        failures: usize,
    }

    #[async_trait]
    impl Geocoder for FlakyGeocoder {
        async fn geocode(&self, _query: &str) -> Result<Option<Coordinate>, GeocodeError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err(GeocodeError::Status(503))
            } else {
                Ok(Some(Coordinate { lat: 1.0, lon: 2.0 }))
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn blank_input_skips_lookup() {
        let geocoder = FlakyGeocoder {
            calls: AtomicUsize::new(0),
            failures: 0,
        };
        assert_eq!(resolve_place(&geocoder, "   ").await, None);
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn fallback_recovers_from_one_failure() {
        let geocoder = FlakyGeocoder {
            calls: AtomicUsize::new(0),
            failures: 1,
        };
        let hit = resolve_place(&geocoder, " Delhi ").await;
        assert_eq!(hit, Some(Coordinate { lat: 1.0, lon: 2.0 }));
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn second_failure_reads_as_not_found() {
        let geocoder = FlakyGeocoder {
            calls: AtomicUsize::new(0),
            failures: 5,
        };
        assert_eq!(resolve_place(&geocoder, "Delhi").await, None);
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 2);
    }

    #[derive(Deserialize)]
    struct SearchParams {
        q: String,
    }

    /// Local stand-in for the search endpoint. The first `failures` calls
    /// answer 503.
    async fn spawn_search_stub(failures: usize) -> (String, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let app = Router::new().route(
            "/search",
            get(move |Query(params): Query<SearchParams>| {
                let counter = counter.clone();
                async move {
                    let call = counter.fetch_add(1, Ordering::SeqCst);
                    if call < failures {
                        return Err(StatusCode::SERVICE_UNAVAILABLE);
                    }
                    let body = match params.q.as_str() {
                        "Chandigarh" => json!([{
                            "lat": "30.7333148",
                            "lon": "76.7794179",
                            "display_name": "Chandigarh, India"
                        }]),
                        "Broken" => json!([{"lat": "north", "lon": "76.0"}]),
                        _ => json!([]),
                    };
                    Ok(Json(body))
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}"), hits)
    }

    fn fast_config(base_url: String) -> NominatimConfig {
        NominatimConfig {
            base_url,
            min_delay: Duration::ZERO,
            error_wait: Duration::from_millis(10),
            ..NominatimConfig::default()
        }
    }

    #[tokio::test]
    async fn nominatim_parses_first_hit() {
        let (base_url, _) = spawn_search_stub(0).await;
        let geocoder = NominatimGeocoder::new(fast_config(base_url)).unwrap();

        let coord = geocoder.geocode("Chandigarh").await.unwrap().unwrap();
        assert!((coord.lat - 30.7333148).abs() < 1e-9);
        assert!((coord.lon - 76.7794179).abs() < 1e-9);
    }

    #[tokio::test]
    async fn nominatim_empty_result_is_none() {
        let (base_url, _) = spawn_search_stub(0).await;
        let geocoder = NominatimGeocoder::new(fast_config(base_url)).unwrap();
        assert_eq!(geocoder.geocode("Atlantis").await.unwrap(), None);
    }

    #[tokio::test]
    async fn nominatim_rejects_bad_coordinates() {
        let (base_url, _) = spawn_search_stub(0).await;
        let geocoder = NominatimGeocoder::new(fast_config(base_url)).unwrap();
        let err = geocoder.geocode("Broken").await.unwrap_err();
        assert!(matches!(err, GeocodeError::InvalidCoordinate(_)));
    }

    #[tokio::test]
    async fn nominatim_retries_server_errors() {
        let (base_url, hits) = spawn_search_stub(2).await;
        let geocoder = NominatimGeocoder::new(fast_config(base_url)).unwrap();

        let coord = geocoder.geocode("Chandigarh").await.unwrap();
        assert!(coord.is_some());
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn nominatim_gives_up_after_max_retries() {
        let (base_url, hits) = spawn_search_stub(10).await;
        let geocoder = NominatimGeocoder::new(fast_config(base_url)).unwrap();

        let err = geocoder.geocode("Chandigarh").await.unwrap_err();
        assert!(matches!(err, GeocodeError::Status(503)));
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn fallback_makes_a_single_extra_request() {
        let (base_url, hits) = spawn_search_stub(10).await;
        let geocoder = NominatimGeocoder::new(fast_config(base_url)).unwrap();

        assert_eq!(resolve_place(&geocoder, "Chandigarh").await, None);
        // three attempts from the retry loop, one from the fallback
        assert_eq!(hits.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn fallback_request_can_still_succeed() {
        let (base_url, hits) = spawn_search_stub(3).await;
        let geocoder = NominatimGeocoder::new(fast_config(base_url)).unwrap();

        assert!(resolve_place(&geocoder, "Chandigarh").await.is_some());
        assert_eq!(hits.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn throttle_spaces_requests() {
        let (base_url, _) = spawn_search_stub(0).await;
        let geocoder = NominatimGeocoder::new(NominatimConfig {
            min_delay: Duration::from_millis(50),
            ..fast_config(base_url)
        })
        .unwrap();

        let started = std::time::Instant::now();
        geocoder.geocode("Chandigarh").await.unwrap();
        geocoder.geocode("Chandigarh").await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(50));
    }
}
