use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use geo_types::Point;
use gpx::{Gpx, GpxVersion, Track, TrackSegment, Waypoint};

use crate::error::ExportError;
use crate::models::Coordinate;

const CREATOR: &str = "routefinder";

/// Encode a path as a single-track GPX 1.1 document, base64 encoded.
///
/// An empty path yields an empty string rather than an empty track.
pub fn encode_path_as_gpx(path: &[Coordinate], track_name: &str) -> Result<String, ExportError> {
    if path.is_empty() {
        return Ok(String::new());
    }

    let mut gpx = Gpx {
        version: GpxVersion::Gpx11,
        creator: Some(CREATOR.into()),
        ..Default::default()
    };
    let mut track = Track {
        name: Some(track_name.into()),
        ..Default::default()
    };

    let mut segment = TrackSegment::new();
    segment.points.extend(path.iter().map(to_waypoint));
    track.segments.push(segment);
    gpx.tracks.push(track);

    let mut buffer = Vec::new();
    gpx::write(&gpx, &mut buffer)?;
    Ok(BASE64.encode(buffer))
}

fn to_waypoint(coord: &Coordinate) -> Waypoint {
    Waypoint::new(Point::new(coord.lon, coord.lat))
}
