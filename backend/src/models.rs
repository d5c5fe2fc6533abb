pub use shared::{
    AddPlaceRequest, AddRoadRequest, ApiError, CircleMarker, Coordinate, DestinationRequest,
    EndpointRequest, GraphView, MapLabel, MapMarker, MapPolyline, MapScene, PathResponse, Place,
    PositionAck, PositionSample, PositionUpdate, Road, RouteRequest, RouteResponse, TileStyle,
    TrackerView, TravelProfile,
};
