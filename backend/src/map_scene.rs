//! Render instructions for the browser map widget.
//!
//! Nothing here draws anything; each builder describes markers, lines and
//! labels and the frontend hands the description to Leaflet as-is.

use crate::{
    geo::centroid,
    models::{CircleMarker, Coordinate, MapLabel, MapMarker, MapPolyline, MapScene, TileStyle},
    place_graph::{PlaceGraph, ShortestPath, road_label},
    tracker::TrackSession,
};

const WORLD_CENTER: Coordinate = Coordinate {
    lat: 20.0,
    lon: 0.0,
};
const WORLD_ZOOM: u8 = 2;
const GRAPH_ZOOM: u8 = 5;
const ROUTE_ZOOM: u8 = 10;
const TRACKER_ZOOM: u8 = 17;

const PLACE_COLOR: &str = "#2196f3";
const PATH_COLOR: &str = "#00e5ff";
const PATH_GLOW_COLOR: &str = "#80deea";

/// Scene for the route finder: start, destination and the route line.
pub fn route_scene(
    start: Coordinate,
    start_label: &str,
    end: Coordinate,
    dest_label: &str,
    path: &[Coordinate],
) -> MapScene {
    MapScene {
        center: start,
        zoom: ROUTE_ZOOM,
        tiles: TileStyle::Standard,
        markers: vec![
            marker(start, format!("Start: {start_label}"), "green", None),
            marker(end, format!("Destination: {dest_label}"), "red", None),
        ],
        polylines: vec![polyline(path.to_vec(), "blue", 5, 0.8, None)],
        ..MapScene::default()
    }
}

/// Scene for the place graph, optionally highlighting a computed path.
pub fn graph_scene(graph: &PlaceGraph, path: Option<&ShortestPath>) -> MapScene {
    let positions: Vec<Coordinate> = graph.places().map(|p| p.position).collect();
    let Some(center) = centroid(&positions) else {
        return MapScene {
            center: WORLD_CENTER,
            zoom: WORLD_ZOOM,
            ..MapScene::default()
        };
    };

    let mut scene = MapScene {
        center,
        zoom: GRAPH_ZOOM,
        tiles: TileStyle::Dark,
        ..MapScene::default()
    };

    for (a, b, distance_km) in graph.road_segments() {
        scene
            .polylines
            .push(polyline(vec![a, b], "gray", 2, 0.5, None));
        scene.labels.push(MapLabel {
            position: a.midpoint(b),
            text: road_label(distance_km),
            class: "road-distance".into(),
            rotation_deg: 0.0,
            popup: None,
        });
    }

    for place in graph.places() {
        scene.circles.push(CircleMarker {
            position: place.position,
            radius: 6,
            color: PLACE_COLOR.into(),
            popup: Some(place.name.clone()),
        });
    }

    if let Some(path) = path {
        add_path_highlight(&mut scene, path);
    }

    scene
}

fn add_path_highlight(scene: &mut MapScene, path: &ShortestPath) {
    let coords = &path.coordinates;
    let (Some(&first), Some(&last)) = (coords.first(), coords.last()) else {
        return;
    };

    scene.polylines.push(polyline(
        coords.clone(),
        PATH_COLOR,
        8,
        0.9,
        Some("10".into()),
    ));
    scene
        .polylines
        .push(polyline(coords.clone(), PATH_GLOW_COLOR, 14, 0.3, None));

    let start_name = path.places.first().cloned().unwrap_or_default();
    let end_name = path.places.last().cloned().unwrap_or_default();
    scene.circles.push(CircleMarker {
        position: first,
        radius: 8,
        color: "lime".into(),
        popup: Some(format!("Start: {start_name}")),
    });
    scene.circles.push(CircleMarker {
        position: last,
        radius: 8,
        color: "red".into(),
        popup: Some(format!("End: {end_name}")),
    });

    if path.distance_km > 0.0 {
        if let Some(mid) = centroid(coords) {
            scene.labels.push(MapLabel {
                position: mid,
                text: format!("Shortest Path: {:.2} km", path.distance_km),
                class: "path-badge".into(),
                rotation_deg: 0.0,
                popup: None,
            });
        }
    }
}

/// Scene for the live tracker; `None` until the first sample arrives.
pub fn tracker_scene(session: &TrackSession) -> Option<MapScene> {
    let positions = session.positions();
    let first = positions.first()?.coordinate();
    let last = positions.last()?.coordinate();

    let mut scene = MapScene {
        center: last,
        zoom: TRACKER_ZOOM,
        tiles: TileStyle::Standard,
        ..MapScene::default()
    };

    let trail = positions.iter().map(|p| p.coordinate()).collect();
    scene.polylines.push(polyline(trail, "blue", 4, 0.8, None));
    scene
        .markers
        .push(marker(first, "Start".into(), "green", Some("play")));

    if let Some(destination) = session.destination() {
        if let Some(position) = destination.position {
            scene.markers.push(marker(
                position,
                format!("Destination: {}", destination.name),
                "red",
                Some("flag"),
            ));
        }
    }

    scene.labels.push(MapLabel {
        position: last,
        text: "➤".into(),
        class: "live-arrow".into(),
        rotation_deg: session.heading_deg(),
        popup: Some("You (live)".into()),
    });

    Some(scene)
}

fn marker(position: Coordinate, popup: String, color: &str, icon: Option<&str>) -> MapMarker {
    MapMarker {
        position,
        popup,
        color: color.into(),
        icon: icon.map(str::to_string),
    }
}

fn polyline(
    path: Vec<Coordinate>,
    color: &str,
    weight: u32,
    opacity: f64,
    dash_array: Option<String>,
) -> MapPolyline {
    MapPolyline {
        path,
        color: color.into(),
        weight,
        opacity,
        dash_array,
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::models::PositionUpdate;

    fn c(lat: f64, lon: f64) -> Coordinate {
        Coordinate { lat, lon }
    }

    #[test]
    fn empty_graph_shows_the_world() {
        let scene = graph_scene(&PlaceGraph::new(), None);
        assert_eq!(scene.center, WORLD_CENTER);
        assert_eq!(scene.zoom, WORLD_ZOOM);
        assert!(scene.circles.is_empty());
    }

    #[test]
    fn graph_scene_centres_on_places_and_labels_roads() {
        let mut graph = PlaceGraph::new();
        graph.add_place("A", c(10.0, 20.0)).unwrap();
        graph.add_place("B", c(20.0, 40.0)).unwrap();
        graph.add_road("A", "B", 12.34).unwrap();

        let scene = graph_scene(&graph, None);
        assert_eq!(scene.center, c(15.0, 30.0));
        assert_eq!(scene.zoom, GRAPH_ZOOM);
        assert_eq!(scene.tiles, TileStyle::Dark);
        assert_eq!(scene.circles.len(), 2);
        assert_eq!(scene.polylines.len(), 1);
        assert_eq!(scene.labels[0].text, "12.3 km");
        assert_eq!(scene.labels[0].position, c(15.0, 30.0));
    }

    #[test]
    fn graph_scene_highlights_path() {
        let mut graph = PlaceGraph::new();
        graph.add_place("A", c(0.0, 0.0)).unwrap();
        graph.add_place("B", c(0.0, 1.0)).unwrap();
        graph.add_road("A", "B", 111.0).unwrap();
        graph.set_start("A").unwrap();
        graph.set_end("B").unwrap();
        let path = graph.shortest_path().unwrap();

        let scene = graph_scene(&graph, Some(&path));
        // road + dashed path + glow
        assert_eq!(scene.polylines.len(), 3);
        assert_eq!(scene.polylines[1].dash_array.as_deref(), Some("10"));
        // two places + start + end
        assert_eq!(scene.circles.len(), 4);
        assert_eq!(scene.circles[2].popup.as_deref(), Some("Start: A"));
        assert_eq!(scene.circles[3].popup.as_deref(), Some("End: B"));
        assert!(scene
            .labels
            .iter()
            .any(|l| l.text == "Shortest Path: 111.00 km"));
    }

    #[test]
    fn route_scene_has_endpoints_and_line() {
        let scene = route_scene(
            c(30.7, 76.7),
            "Chandigarh",
            c(28.6, 77.2),
            "Delhi",
            &[c(30.7, 76.7), c(28.6, 77.2)],
        );
        assert_eq!(scene.center, c(30.7, 76.7));
        assert_eq!(scene.zoom, ROUTE_ZOOM);
        assert_eq!(scene.markers[0].popup, "Start: Chandigarh");
        assert_eq!(scene.markers[1].popup, "Destination: Delhi");
        assert_eq!(scene.polylines[0].weight, 5);
    }

    #[test]
    fn tracker_scene_points_arrow_along_travel() {
        let mut session = TrackSession::new();
        assert!(tracker_scene(&session).is_none());

        session.start();
        let sample = |lat, lon| PositionUpdate {
            latitude: Some(lat),
            longitude: Some(lon),
            ..PositionUpdate::default()
        };
        session.record(&sample(0.0, 0.0), Utc::now());
        session.record(&sample(0.0, 0.001), Utc::now());
        session.set_destination(Some("Goal"));
        session.resolve_destination("Goal", c(0.0, 0.01));

        let scene = tracker_scene(&session).unwrap();
        assert_eq!(scene.center, c(0.0, 0.001));
        assert_eq!(scene.zoom, TRACKER_ZOOM);
        assert_eq!(scene.markers.len(), 2);
        assert_eq!(scene.markers[1].icon.as_deref(), Some("flag"));
        let arrow = scene.labels.last().unwrap();
        assert!((arrow.rotation_deg - 90.0).abs() < 1e-6);
    }
}
