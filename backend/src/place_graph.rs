use std::collections::HashMap;

use axum::http::StatusCode;
use petgraph::{
    algo::astar,
    graph::{NodeIndex, UnGraph},
    visit::EdgeRef,
};

use crate::{
    error::HttpStatus,
    format::estimate_travel_time,
    geocoding::{GeocodeError, Geocoder},
    map_scene,
    models::{Coordinate, GraphView, PathResponse, Place, Road},
};

#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("Please enter a place name.")]
    EmptyName,
    #[error("Place not found.")]
    PlaceNotFound(String),
    #[error("Unknown place `{0}`.")]
    UnknownPlace(String),
    #[error("Add at least 2 places first.")]
    NotEnoughPlaces,
    #[error("Add places first.")]
    NoPlaces,
    #[error("Cannot connect a place to itself.")]
    SelfLoop,
    #[error("Distance must be a non-negative number of kilometres, got {0}.")]
    InvalidDistance(f64),
    #[error("Please set both start and end places first.")]
    EndpointsNotSet,
    #[error("No connection between these places.")]
    NoPath { start: String, end: String },
    #[error(transparent)]
    Geocoding(#[from] GeocodeError),
}

impl HttpStatus for GraphError {
    fn status(&self) -> StatusCode {
        match self {
            GraphError::PlaceNotFound(_)
            | GraphError::UnknownPlace(_)
            | GraphError::NoPath { .. } => StatusCode::NOT_FOUND,
            GraphError::Geocoding(err) => err.status(),
            _ => StatusCode::BAD_REQUEST,
        }
    }

    fn user_message(&self) -> String {
        match self {
            GraphError::Geocoding(err) => err.user_message(),
            other => other.to_string(),
        }
    }
}

/// Outcome of a shortest-path query, in travel order.
#[derive(Debug, Clone, PartialEq)]
pub struct ShortestPath {
    pub places: Vec<String>,
    pub coordinates: Vec<Coordinate>,
    pub distance_km: f64,
}

impl ShortestPath {
    pub fn to_response(&self) -> PathResponse {
        PathResponse {
            start: self.places.first().cloned().unwrap_or_default(),
            end: self.places.last().cloned().unwrap_or_default(),
            path: self.places.clone(),
            distance_km: self.distance_km,
            distance_text: format!("{:.2} km", self.distance_km),
            time_estimate: estimate_travel_time(self.distance_km),
        }
    }
}

/// Small undirected road network built by hand, one place per name.
///
/// Edge weights are road lengths in kilometres. Nodes are never removed, so
/// the name index stays valid for the lifetime of the graph.
#[derive(Debug, Default)]
pub struct PlaceGraph {
    graph: UnGraph<Place, f64>,
    by_name: HashMap<String, NodeIndex>,
    start: Option<NodeIndex>,
    end: Option<NodeIndex>,
    last_path: Option<ShortestPath>,
}

impl PlaceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn place_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn road_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Insert a place, or move it if the name is already known.
    pub fn add_place(&mut self, name: &str, position: Coordinate) -> Result<(), GraphError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(GraphError::EmptyName);
        }

        match self.by_name.get(name) {
            Some(&idx) => {
                tracing::debug!(
                    "moving place {name:?} to ({:.4}, {:.4})",
                    position.lat,
                    position.lon
                );
                self.graph[idx].position = position;
            }
            None => {
                let idx = self.graph.add_node(Place {
                    name: name.to_string(),
                    position,
                });
                self.by_name.insert(name.to_string(), idx);
            }
        }
        self.last_path = None;
        Ok(())
    }

    /// Connect two places. An existing road between them gets the new length.
    pub fn add_road(&mut self, from: &str, to: &str, distance_km: f64) -> Result<(), GraphError> {
        if self.place_count() < 2 {
            return Err(GraphError::NotEnoughPlaces);
        }
        if !distance_km.is_finite() || distance_km < 0.0 {
            return Err(GraphError::InvalidDistance(distance_km));
        }
        let a = self.lookup(from)?;
        let b = self.lookup(to)?;
        if a == b {
            return Err(GraphError::SelfLoop);
        }

        self.graph.update_edge(a, b, distance_km);
        self.last_path = None;
        Ok(())
    }

    pub fn set_start(&mut self, name: &str) -> Result<(), GraphError> {
        let idx = self.endpoint(name)?;
        self.start = Some(idx);
        self.last_path = None;
        Ok(())
    }

    pub fn set_end(&mut self, name: &str) -> Result<(), GraphError> {
        let idx = self.endpoint(name)?;
        self.end = Some(idx);
        self.last_path = None;
        Ok(())
    }

    pub fn start(&self) -> Option<&str> {
        self.start.map(|idx| self.graph[idx].name.as_str())
    }

    pub fn end(&self) -> Option<&str> {
        self.end.map(|idx| self.graph[idx].name.as_str())
    }

    pub fn last_path(&self) -> Option<&ShortestPath> {
        self.last_path.as_ref()
    }

    /// Run the shortest-path search between the chosen endpoints and keep the
    /// result for rendering.
    ///
    /// A* with a zero heuristic, i.e. Dijkstra on road length.
    pub fn shortest_path(&mut self) -> Result<ShortestPath, GraphError> {
        let (start, end) = match (self.start, self.end) {
            (Some(start), Some(end)) => (start, end),
            _ => return Err(GraphError::EndpointsNotSet),
        };

        let (distance_km, route) = astar(
            &self.graph,
            start,
            |node| node == end,
            |edge| *edge.weight(),
            |_| 0.0,
        )
        .ok_or_else(|| GraphError::NoPath {
            start: self.graph[start].name.clone(),
            end: self.graph[end].name.clone(),
        })?;

        let path = ShortestPath {
            places: route.iter().map(|&idx| self.graph[idx].name.clone()).collect(),
            coordinates: route.iter().map(|&idx| self.graph[idx].position).collect(),
            distance_km,
        };
        tracing::info!(
            "shortest path {} ({:.2} km)",
            path.places.join(" -> "),
            path.distance_km
        );
        self.last_path = Some(path.clone());
        Ok(path)
    }

    /// Places in insertion order.
    pub fn places(&self) -> impl Iterator<Item = &Place> {
        self.graph.node_indices().map(move |idx| &self.graph[idx])
    }

    pub fn roads(&self) -> impl Iterator<Item = Road> + '_ {
        self.graph.edge_references().map(move |edge| Road {
            from: self.graph[edge.source()].name.clone(),
            to: self.graph[edge.target()].name.clone(),
            distance_km: *edge.weight(),
        })
    }

    /// Each road as its two end positions plus its length.
    pub fn road_segments(&self) -> impl Iterator<Item = (Coordinate, Coordinate, f64)> + '_ {
        self.graph.edge_references().map(move |edge| {
            (
                self.graph[edge.source()].position,
                self.graph[edge.target()].position,
                *edge.weight(),
            )
        })
    }

    pub fn to_view(&self) -> GraphView {
        GraphView {
            places: self.places().cloned().collect(),
            roads: self.roads().collect(),
            start: self.start().map(str::to_string),
            end: self.end().map(str::to_string),
            last_path: self.last_path.as_ref().map(ShortestPath::to_response),
            scene: map_scene::graph_scene(self, self.last_path.as_ref()),
        }
    }

    fn lookup(&self, name: &str) -> Result<NodeIndex, GraphError> {
        self.by_name
            .get(name.trim())
            .copied()
            .ok_or_else(|| GraphError::UnknownPlace(name.to_string()))
    }

    fn endpoint(&self, name: &str) -> Result<NodeIndex, GraphError> {
        if self.place_count() == 0 {
            return Err(GraphError::NoPlaces);
        }
        self.lookup(name)
    }
}

/// Geocode a user-entered name into a [`Place`] ready for the graph.
pub async fn geocode_place(geocoder: &dyn Geocoder, name: &str) -> Result<Place, GraphError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(GraphError::EmptyName);
    }
    let position = geocoder
        .geocode(name)
        .await?
        .ok_or_else(|| GraphError::PlaceNotFound(name.to_string()))?;
    tracing::info!(
        "added place {name:?} at ({:.4}, {:.4})",
        position.lat,
        position.lon
    );
    Ok(Place {
        name: name.to_string(),
        position,
    })
}

/// Distance label used next to each road on the map.
pub fn road_label(distance_km: f64) -> String {
    format!("{distance_km:.1} km")
}
