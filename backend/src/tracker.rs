use chrono::{DateTime, Utc};

use crate::{
    geo::{bearing_deg, local_distance_m},
    gpx_export::encode_path_as_gpx,
    map_scene,
    models::{Coordinate, PositionSample, PositionUpdate, TrackerView},
};

/// Samples closer than this to the previous one are treated as jitter.
pub const MIN_MOVEMENT_M: f64 = 1.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Destination {
    pub name: String,
    /// Filled lazily the first time the destination geocodes.
    pub position: Option<Coordinate>,
}

impl Destination {
    pub fn is_resolved(&self) -> bool {
        self.position.is_some()
    }
}

/// One live-tracking session: a toggle, the recorded trail and an optional
/// destination flag.
#[derive(Debug, Default)]
pub struct TrackSession {
    tracking: bool,
    positions: Vec<PositionSample>,
    destination: Option<Destination>,
}

impl TrackSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_tracking(&self) -> bool {
        self.tracking
    }

    pub fn start(&mut self) {
        self.tracking = true;
        tracing::info!("tracking started");
    }

    pub fn stop(&mut self) {
        self.tracking = false;
        tracing::info!("tracking stopped with {} points", self.positions.len());
    }

    /// Forget the trail. Tracking state and destination are kept.
    pub fn clear(&mut self) {
        self.positions.clear();
    }

    pub fn positions(&self) -> &[PositionSample] {
        &self.positions
    }

    /// Store a browser sample. Returns whether it was kept.
    ///
    /// Samples are dropped while tracking is off, when the browser reported an
    /// error, when a coordinate is missing, or when the device has not moved
    /// at least [`MIN_MOVEMENT_M`] since the last kept sample.
    pub fn record(&mut self, update: &PositionUpdate, now: DateTime<Utc>) -> bool {
        if !self.tracking {
            return false;
        }
        if update.error {
            tracing::warn!(
                "browser geolocation error: {}",
                update.message.as_deref().unwrap_or("unknown")
            );
            return false;
        }
        let (lat, lon) = match (update.latitude, update.longitude) {
            (Some(lat), Some(lon)) if lat.is_finite() && lon.is_finite() => (lat, lon),
            _ => return false,
        };

        let next = Coordinate { lat, lon };
        if let Some(last) = self.positions.last() {
            let moved = local_distance_m(last.coordinate(), next);
            if moved < MIN_MOVEMENT_M {
                tracing::debug!("dropping sample {moved:.2} m from the previous one");
                return false;
            }
        }

        self.positions.push(PositionSample {
            lat,
            lon,
            timestamp: update.timestamp.unwrap_or_else(|| now.timestamp_millis()),
        });
        true
    }

    /// Direction of travel between the last two samples, 0 when unknown.
    pub fn heading_deg(&self) -> f64 {
        match self.positions.as_slice() {
            [.., previous, last] => bearing_deg(previous.coordinate(), last.coordinate()),
            _ => 0.0,
        }
    }

    pub fn destination(&self) -> Option<&Destination> {
        self.destination.as_ref()
    }

    /// Set or clear the destination. Blank text clears it.
    pub fn set_destination(&mut self, name: Option<&str>) {
        self.destination = name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(|name| Destination {
                name: name.to_string(),
                position: None,
            });
    }

    /// Name of the destination still waiting for a coordinate.
    pub fn pending_destination(&self) -> Option<String> {
        self.destination
            .as_ref()
            .filter(|d| !d.is_resolved())
            .map(|d| d.name.clone())
    }

    /// Remember where the destination geocoded to, unless it changed meanwhile.
    pub fn resolve_destination(&mut self, name: &str, position: Coordinate) {
        if let Some(destination) = self.destination.as_mut() {
            if destination.name == name {
                destination.position = Some(position);
            }
        }
    }

    pub fn to_view(&self) -> TrackerView {
        let trail: Vec<Coordinate> = self
            .positions
            .iter()
            .map(PositionSample::coordinate)
            .collect();
        let gpx_base64 = encode_path_as_gpx(&trail, "Tracked path").unwrap_or_else(|err| {
            tracing::warn!("could not export tracked path: {err}");
            String::new()
        });

        TrackerView {
            tracking: self.tracking,
            positions: self.positions.clone(),
            destination: self.destination.as_ref().map(|d| d.name.clone()),
            heading_deg: self.heading_deg(),
            scene: map_scene::tracker_scene(self),
            gpx_base64,
        }
    }
}
