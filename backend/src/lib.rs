pub mod config;
pub mod directions;
pub mod error;
pub mod format;
pub mod geo;
pub mod geocoding;
pub mod gpx_export;
pub mod graph_handlers;
pub mod ip_location;
pub mod map_scene;
pub mod models;
pub mod place_graph;
pub mod route_finder;
pub mod tracker;
pub mod tracker_handlers;

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post, put},
};
use tokio::sync::Mutex;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::Settings;
use crate::directions::{DirectionsProvider, OpenRouteService};
use crate::error::{ApiFailure, api_failure};
use crate::geocoding::{Geocoder, NominatimGeocoder};
use crate::ip_location::{IpInfoLocator, IpLocator};
use crate::models::{RouteRequest, RouteResponse};
use crate::place_graph::PlaceGraph;
use crate::route_finder::RouteFinder;
use crate::tracker::TrackSession;

/// Shared by every handler. The graph and tracker hold one demo session for
/// the whole server.
#[derive(Clone)]
pub struct AppState {
    pub route_finder: Arc<RouteFinder>,
    pub geocoder: Arc<dyn Geocoder>,
    pub graph: Arc<Mutex<PlaceGraph>>,
    pub tracker: Arc<Mutex<TrackSession>>,
}

impl AppState {
    pub fn new(
        geocoder: Arc<dyn Geocoder>,
        locator: Arc<dyn IpLocator>,
        directions: Arc<dyn DirectionsProvider>,
    ) -> Self {
        Self {
            route_finder: Arc::new(RouteFinder::new(geocoder.clone(), locator, directions)),
            geocoder,
            graph: Arc::new(Mutex::new(PlaceGraph::new())),
            tracker: Arc::new(Mutex::new(TrackSession::new())),
        }
    }

    /// Wire up the real upstream clients.
    pub fn from_settings(settings: &Settings) -> Result<Self, reqwest::Error> {
        if !settings.ors.has_api_key() {
            tracing::warn!("ORS_API_KEY is not set; the route finder will refuse requests");
        }
        let geocoder = NominatimGeocoder::new(settings.nominatim.clone())?;
        let locator = IpInfoLocator::new(settings.ipinfo_url.clone())?;
        let directions = OpenRouteService::new(settings.ors.clone())?;
        Ok(Self::new(
            Arc::new(geocoder),
            Arc::new(locator),
            Arc::new(directions),
        ))
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/api/route", post(route_handler))
        .route("/api/graph", get(graph_handlers::get_graph))
        .route("/api/graph/places", post(graph_handlers::add_place))
        .route("/api/graph/roads", post(graph_handlers::add_road))
        .route("/api/graph/start", put(graph_handlers::set_start))
        .route("/api/graph/end", put(graph_handlers::set_end))
        .route("/api/graph/path", post(graph_handlers::find_path))
        .route("/api/tracker", get(tracker_handlers::get_tracker))
        .route("/api/tracker/start", post(tracker_handlers::start))
        .route("/api/tracker/stop", post(tracker_handlers::stop))
        .route("/api/tracker/clear", post(tracker_handlers::clear))
        .route("/api/tracker/positions", post(tracker_handlers::push_position))
        .route("/api/tracker/destination", put(tracker_handlers::set_destination))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn route_handler(
    State(state): State<AppState>,
    Json(req): Json<RouteRequest>,
) -> Result<Json<RouteResponse>, ApiFailure> {
    state
        .route_finder
        .find_route(&req)
        .await
        .map(Json)
        .map_err(api_failure)
}
