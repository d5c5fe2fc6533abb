use std::sync::Arc;

use axum::http::StatusCode;

use crate::{
    directions::{DirectionsError, DirectionsProvider},
    error::{ExportError, HttpStatus},
    format::{format_distance, format_duration},
    geo::approximate_distance_km,
    geocoding::{Geocoder, resolve_place},
    gpx_export::encode_path_as_gpx,
    ip_location::IpLocator,
    map_scene,
    models::{Coordinate, RouteRequest, RouteResponse},
};

pub const AUTO_DETECTED_LABEL: &str = "Auto-detected (IP)";

#[derive(Debug, thiserror::Error)]
pub enum RouteFinderError {
    #[error("Please enter a destination.")]
    MissingDestination,
    #[error("Could not determine your start location automatically. Please enter it manually.")]
    StartNotFound,
    #[error("Could not find destination. Try adding city/country.")]
    DestinationNotFound,
    #[error("Error fetching route: {0}")]
    Directions(#[from] DirectionsError),
    #[error(transparent)]
    Export(#[from] ExportError),
}

impl HttpStatus for RouteFinderError {
    fn status(&self) -> StatusCode {
        match self {
            RouteFinderError::MissingDestination => StatusCode::BAD_REQUEST,
            RouteFinderError::StartNotFound | RouteFinderError::DestinationNotFound => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            RouteFinderError::Directions(err) => err.status(),
            RouteFinderError::Export(err) => err.status(),
        }
    }

    fn user_message(&self) -> String {
        match self {
            RouteFinderError::Directions(DirectionsError::NoRoute) => "No route found.".into(),
            other => other.to_string(),
        }
    }
}

/// Geocode both ends, ask the directions service, and dress the answer up
/// for the map.
pub struct RouteFinder {
    geocoder: Arc<dyn Geocoder>,
    locator: Arc<dyn IpLocator>,
    directions: Arc<dyn DirectionsProvider>,
}

impl RouteFinder {
    pub fn new(
        geocoder: Arc<dyn Geocoder>,
        locator: Arc<dyn IpLocator>,
        directions: Arc<dyn DirectionsProvider>,
    ) -> Self {
        Self {
            geocoder,
            locator,
            directions,
        }
    }

    pub async fn find_route(&self, req: &RouteRequest) -> Result<RouteResponse, RouteFinderError> {
        let destination = req.destination.trim();
        if destination.is_empty() {
            return Err(RouteFinderError::MissingDestination);
        }

        let (start_label, start) = self.resolve_start(req.current_location.as_deref()).await?;
        let end = resolve_place(self.geocoder.as_ref(), destination)
            .await
            .ok_or(RouteFinderError::DestinationNotFound)?;

        tracing::info!(
            "routing {start_label:?} -> {destination:?} ({})",
            req.profile.as_str()
        );
        let summary = self.directions.route(start, end, req.profile).await?;
        // Some responses omit the summary block; measure the line instead.
        let distance_km = if summary.distance_km > 0.0 {
            summary.distance_km
        } else {
            approximate_distance_km(&summary.path)
        };
        let gpx_base64 = encode_path_as_gpx(&summary.path, "Route")?;
        let scene =
            map_scene::route_scene(start, &start_label, end, destination, &summary.path);

        Ok(RouteResponse {
            dest_label: destination.to_string(),
            start,
            end,
            distance_text: format_distance(distance_km),
            duration_text: format_duration(summary.duration_min),
            distance_km,
            duration_min: summary.duration_min,
            path: summary.path,
            profile: req.profile,
            mode_label: req.profile.label().to_string(),
            gpx_base64,
            scene,
            start_label,
        })
    }

    /// A typed start wins; otherwise fall back to IP location.
    async fn resolve_start(
        &self,
        typed: Option<&str>,
    ) -> Result<(String, Coordinate), RouteFinderError> {
        match typed.map(str::trim).filter(|s| !s.is_empty()) {
            Some(text) => {
                let coord = resolve_place(self.geocoder.as_ref(), text)
                    .await
                    .ok_or(RouteFinderError::StartNotFound)?;
                Ok((text.to_string(), coord))
            }
            None => {
                let coord = self
                    .locator
                    .locate()
                    .await
                    .ok_or(RouteFinderError::StartNotFound)?;
                Ok((AUTO_DETECTED_LABEL.to_string(), coord))
            }
        }
    }
}
