// Handlers for the shortest-path graph demo.
// One graph per server; geocoding happens before the graph lock is taken.

use axum::{Json, extract::State};

use crate::AppState;
use crate::error::{ApiFailure, api_failure};
use crate::models::{AddPlaceRequest, AddRoadRequest, EndpointRequest, GraphView};
use crate::place_graph::geocode_place;

/// GET /api/graph - Places, roads, endpoints and the map scene
pub async fn get_graph(State(state): State<AppState>) -> Json<GraphView> {
    Json(state.graph.lock().await.to_view())
}

/// POST /api/graph/places - Geocode a name and add it as a place
pub async fn add_place(
    State(state): State<AppState>,
    Json(req): Json<AddPlaceRequest>,
) -> Result<Json<GraphView>, ApiFailure> {
    let place = geocode_place(state.geocoder.as_ref(), &req.name)
        .await
        .map_err(api_failure)?;

    let mut graph = state.graph.lock().await;
    graph
        .add_place(&place.name, place.position)
        .map_err(api_failure)?;
    Ok(Json(graph.to_view()))
}

/// POST /api/graph/roads - Connect two places with a weighted road
pub async fn add_road(
    State(state): State<AppState>,
    Json(req): Json<AddRoadRequest>,
) -> Result<Json<GraphView>, ApiFailure> {
    let mut graph = state.graph.lock().await;
    graph
        .add_road(&req.from, &req.to, req.distance_km)
        .map_err(api_failure)?;
    Ok(Json(graph.to_view()))
}

/// PUT /api/graph/start
pub async fn set_start(
    State(state): State<AppState>,
    Json(req): Json<EndpointRequest>,
) -> Result<Json<GraphView>, ApiFailure> {
    let mut graph = state.graph.lock().await;
    graph.set_start(&req.name).map_err(api_failure)?;
    Ok(Json(graph.to_view()))
}

/// PUT /api/graph/end
pub async fn set_end(
    State(state): State<AppState>,
    Json(req): Json<EndpointRequest>,
) -> Result<Json<GraphView>, ApiFailure> {
    let mut graph = state.graph.lock().await;
    graph.set_end(&req.name).map_err(api_failure)?;
    Ok(Json(graph.to_view()))
}

/// POST /api/graph/path - Run Dijkstra between the chosen endpoints
pub async fn find_path(State(state): State<AppState>) -> Result<Json<GraphView>, ApiFailure> {
    let mut graph = state.graph.lock().await;
    graph.shortest_path().map_err(api_failure)?;
    Ok(Json(graph.to_view()))
}
