// Handlers for the live tracker demo.

use axum::{Json, extract::State};
use chrono::Utc;

use crate::AppState;
use crate::models::{DestinationRequest, PositionAck, PositionUpdate, TrackerView};

/// Geocode the destination if it has no coordinate yet.
///
/// The lookup runs outside the session lock. Failures are logged and retried
/// on the next render.
async fn resolve_pending_destination(state: &AppState) {
    let Some(name) = state.tracker.lock().await.pending_destination() else {
        return;
    };

    match state.geocoder.geocode(&name).await {
        Ok(Some(position)) => {
            state
                .tracker
                .lock()
                .await
                .resolve_destination(&name, position);
        }
        Ok(None) => tracing::warn!("destination {name:?} not found"),
        Err(err) => tracing::warn!("geocoding destination {name:?} failed: {err}"),
    }
}

/// GET /api/tracker
pub async fn get_tracker(State(state): State<AppState>) -> Json<TrackerView> {
    resolve_pending_destination(&state).await;
    Json(state.tracker.lock().await.to_view())
}

/// POST /api/tracker/start
pub async fn start(State(state): State<AppState>) -> Json<TrackerView> {
    let mut session = state.tracker.lock().await;
    session.start();
    Json(session.to_view())
}

/// POST /api/tracker/stop
pub async fn stop(State(state): State<AppState>) -> Json<TrackerView> {
    let mut session = state.tracker.lock().await;
    session.stop();
    Json(session.to_view())
}

/// POST /api/tracker/clear - Drop the recorded trail
pub async fn clear(State(state): State<AppState>) -> Json<TrackerView> {
    let mut session = state.tracker.lock().await;
    session.clear();
    Json(session.to_view())
}

/// POST /api/tracker/positions - One sample relayed from the browser
pub async fn push_position(
    State(state): State<AppState>,
    Json(update): Json<PositionUpdate>,
) -> Json<PositionAck> {
    let mut session = state.tracker.lock().await;
    let accepted = session.record(&update, Utc::now());
    Json(PositionAck {
        accepted,
        point_count: session.positions().len(),
    })
}

/// PUT /api/tracker/destination - Set or clear the destination flag
///
/// A destination that fails to geocode is kept by name and looked up again
/// on the next GET /api/tracker.
pub async fn set_destination(
    State(state): State<AppState>,
    Json(req): Json<DestinationRequest>,
) -> Json<TrackerView> {
    state
        .tracker
        .lock()
        .await
        .set_destination(req.destination.as_deref());
    resolve_pending_destination(&state).await;
    Json(state.tracker.lock().await.to_view())
}
