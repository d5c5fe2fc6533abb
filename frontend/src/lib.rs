use seed::{prelude::*, virtual_dom::AtValue, *};
use serde::de::DeserializeOwned;
use serde_wasm_bindgen::to_value;
use shared::{
    AddPlaceRequest, AddRoadRequest, ApiError, DestinationRequest, EndpointRequest, GraphView,
    MapScene, PositionAck, PositionUpdate, RouteRequest, RouteResponse, TrackerView,
    TravelProfile,
};
use wasm_bindgen::{
    JsCast,
    prelude::{JsValue, wasm_bindgen},
};

#[wasm_bindgen(module = "/map_widget.js")]
extern "C" {
    #[wasm_bindgen(js_name = initMap)]
    fn init_map();
    #[wasm_bindgen(js_name = renderScene)]
    fn render_scene_js(scene: JsValue);
    #[wasm_bindgen(js_name = startWatchingPosition)]
    fn start_watching_position();
    #[wasm_bindgen(js_name = stopWatchingPosition)]
    fn stop_watching_position();
}

fn api_root() -> String {
    if let Some(url) = option_env!("FRONTEND_API_ROOT") {
        return url.trim_end_matches('/').to_string();
    }
    "http://localhost:8080/api".to_string()
}

#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub enum Tab {
    #[default]
    RouteFinder,
    Graph,
    Tracker,
}

impl Tab {
    const ALL: [Tab; 3] = [Tab::RouteFinder, Tab::Graph, Tab::Tracker];

    fn title(self) -> &'static str {
        match self {
            Tab::RouteFinder => "🧭 Route Planner",
            Tab::Graph => "🗺️ Dijkstra Shortest Path",
            Tab::Tracker => "🚗 Live Navigation",
        }
    }
}

#[derive(Default)]
pub struct Model {
    tab: Tab,
    route_form: RouteForm,
    route: Option<RouteResponse>,
    graph_form: GraphForm,
    graph: Option<GraphView>,
    tracker: Option<TrackerView>,
    tracker_destination: String,
    pending: bool,
    error: Option<String>,
    notice: Option<String>,
}

impl Model {
    /// Validate the route form and drop the previous result, so a failed
    /// search never leaves an old route on screen.
    fn begin_route_search(&mut self) -> Result<RouteRequest, String> {
        self.route = None;
        self.notice = None;
        let request = self.route_form.to_request();
        self.error = request.as_ref().err().cloned();
        request
    }
}

#[derive(Default, Clone)]
struct RouteForm {
    current_location: String,
    destination: String,
    profile: TravelProfile,
}

impl RouteForm {
    fn to_request(&self) -> Result<RouteRequest, String> {
        let destination = self.destination.trim();
        if destination.is_empty() {
            return Err("Please enter a destination.".into());
        }
        let current = self.current_location.trim();
        Ok(RouteRequest {
            current_location: (!current.is_empty()).then(|| current.to_string()),
            destination: destination.to_string(),
            profile: self.profile,
        })
    }
}

#[derive(Default, Clone)]
struct GraphForm {
    place_name: String,
    road_from: String,
    road_to: String,
    road_km: String,
    start: String,
    end: String,
}

impl GraphForm {
    fn road_request(&self) -> Result<AddRoadRequest, String> {
        if self.road_from.is_empty() || self.road_to.is_empty() {
            return Err("Add at least 2 places first.".into());
        }
        let distance_km = self
            .road_km
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|km| km.is_finite() && *km >= 0.0)
            .ok_or_else(|| "Distance must be a non-negative number of kilometres.".to_string())?;
        Ok(AddRoadRequest {
            from: self.road_from.clone(),
            to: self.road_to.clone(),
            distance_km,
        })
    }

    /// Keep the dropdowns pointing at existing places after the graph changes.
    fn sync_with(&mut self, view: &GraphView) {
        let first = view.places.first().map(|p| p.name.clone()).unwrap_or_default();
        let known = |name: &str| view.places.iter().any(|p| p.name == name);
        for field in [
            &mut self.road_from,
            &mut self.road_to,
            &mut self.start,
            &mut self.end,
        ] {
            if !known(field) {
                *field = first.clone();
            }
        }
    }
}

pub enum Msg {
    SelectTab(Tab),

    CurrentLocationChanged(String),
    DestinationChanged(String),
    ProfileChanged(String),
    FindRoute,
    RouteFetched(Result<RouteResponse, String>),

    PlaceNameChanged(String),
    AddPlace,
    RoadFromChanged(String),
    RoadToChanged(String),
    RoadDistanceChanged(String),
    AddRoad,
    StartPlaceChanged(String),
    SetStart,
    EndPlaceChanged(String),
    SetEnd,
    FindPath,
    GraphFetched(Result<GraphView, String>, Option<String>),

    StartTracking,
    StopTracking,
    ClearPath,
    TrackerDestinationChanged(String),
    SetTrackerDestination,
    LocationUpdate(PositionUpdate),
    PositionAcked(Result<PositionAck, String>),
    TrackerFetched(Result<TrackerView, String>, Option<String>),
}

pub fn init(_: Url, orders: &mut impl Orders<Msg>) -> Model {
    orders.stream(streams::window_event(Ev::from("location-update"), |event| {
        let update = event
            .dyn_into::<web_sys::CustomEvent>()
            .ok()
            .and_then(|event| serde_wasm_bindgen::from_value::<PositionUpdate>(event.detail()).ok())
            .unwrap_or_else(|| PositionUpdate {
                error: true,
                message: Some("unreadable location event".into()),
                ..PositionUpdate::default()
            });
        Msg::LocationUpdate(update)
    }));

    orders.perform_cmd(async { Msg::GraphFetched(fetch_json(api_get("/graph")).await, None) });
    orders.perform_cmd(async { Msg::TrackerFetched(fetch_json(api_get("/tracker")).await, None) });

    Model {
        tab: Tab::RouteFinder,
        route_form: RouteForm::default(),
        route: None,
        graph_form: GraphForm::default(),
        graph: None,
        tracker: None,
        tracker_destination: String::new(),
        pending: false,
        error: None,
        notice: None,
    }
}

pub fn update(msg: Msg, model: &mut Model, orders: &mut impl Orders<Msg>) {
    match msg {
        Msg::SelectTab(tab) => {
            model.tab = tab;
            model.error = None;
            model.notice = None;
            show_scene(active_scene(model));
        }

        Msg::CurrentLocationChanged(val) => model.route_form.current_location = val,
        Msg::DestinationChanged(val) => model.route_form.destination = val,
        Msg::ProfileChanged(val) => {
            if let Some(profile) = TravelProfile::from_name(&val) {
                model.route_form.profile = profile;
            }
        }
        Msg::FindRoute => {
            if model.pending {
                return;
            }
            let request = model.begin_route_search();
            if model.tab == Tab::RouteFinder {
                show_scene(None);
            }
            if let Ok(payload) = request {
                model.pending = true;
                orders.perform_cmd(async move {
                    Msg::RouteFetched(fetch_json(api_post("/route", &payload)).await)
                });
            }
        }
        Msg::RouteFetched(result) => {
            model.pending = false;
            match result {
                Ok(route) => {
                    model.notice = Some("✅ Route found successfully!".into());
                    model.error = None;
                    model.route = Some(route);
                    if model.tab == Tab::RouteFinder {
                        show_scene(active_scene(model));
                    }
                }
                Err(err) => model.error = Some(err),
            }
        }

        Msg::PlaceNameChanged(val) => model.graph_form.place_name = val,
        Msg::AddPlace => {
            let name = model.graph_form.place_name.trim().to_string();
            if name.is_empty() {
                model.error = Some("Please enter a place name.".into());
                return;
            }
            model.pending = true;
            model.error = None;
            let notice = format!("✅ Added {name}");
            let payload = AddPlaceRequest { name };
            orders.perform_cmd(async move {
                Msg::GraphFetched(
                    fetch_json(api_post("/graph/places", &payload)).await,
                    Some(notice),
                )
            });
        }
        Msg::RoadFromChanged(val) => model.graph_form.road_from = val,
        Msg::RoadToChanged(val) => model.graph_form.road_to = val,
        Msg::RoadDistanceChanged(val) => model.graph_form.road_km = val,
        Msg::AddRoad => match model.graph_form.road_request() {
            Ok(payload) => {
                model.pending = true;
                model.error = None;
                let notice = format!(
                    "🛣️ Added road: {} ↔ {} ({} km)",
                    payload.from, payload.to, payload.distance_km
                );
                orders.perform_cmd(async move {
                    Msg::GraphFetched(
                        fetch_json(api_post("/graph/roads", &payload)).await,
                        Some(notice),
                    )
                });
            }
            Err(err) => model.error = Some(err),
        },
        Msg::StartPlaceChanged(val) => model.graph_form.start = val,
        Msg::EndPlaceChanged(val) => model.graph_form.end = val,
        Msg::SetStart => {
            let name = model.graph_form.start.clone();
            let notice = format!("Start set to {name}");
            let payload = EndpointRequest { name };
            orders.perform_cmd(async move {
                Msg::GraphFetched(
                    fetch_json(api_put("/graph/start", &payload)).await,
                    Some(notice),
                )
            });
        }
        Msg::SetEnd => {
            let name = model.graph_form.end.clone();
            let notice = format!("End set to {name}");
            let payload = EndpointRequest { name };
            orders.perform_cmd(async move {
                Msg::GraphFetched(
                    fetch_json(api_put("/graph/end", &payload)).await,
                    Some(notice),
                )
            });
        }
        Msg::FindPath => {
            model.pending = true;
            orders.perform_cmd(async {
                Msg::GraphFetched(
                    fetch_json(Ok(api_request("/graph/path", Method::Post))).await,
                    Some("✅ Path calculated successfully!".into()),
                )
            });
        }
        Msg::GraphFetched(result, notice) => {
            model.pending = false;
            match result {
                Ok(view) => {
                    model.graph_form.sync_with(&view);
                    model.graph_form.place_name.clear();
                    model.graph = Some(view);
                    model.error = None;
                    model.notice = notice;
                    if model.tab == Tab::Graph {
                        show_scene(active_scene(model));
                    }
                }
                Err(err) => {
                    model.notice = None;
                    model.error = Some(err);
                }
            }
        }

        Msg::StartTracking => {
            start_watching_position();
            orders.perform_cmd(async {
                Msg::TrackerFetched(
                    fetch_json(Ok(api_request("/tracker/start", Method::Post))).await,
                    Some(
                        "Tracking started, allow location permission in your browser when prompted."
                            .into(),
                    ),
                )
            });
        }
        Msg::StopTracking => {
            stop_watching_position();
            orders.perform_cmd(async {
                Msg::TrackerFetched(
                    fetch_json(Ok(api_request("/tracker/stop", Method::Post))).await,
                    Some("Tracking stopped.".into()),
                )
            });
        }
        Msg::ClearPath => {
            orders.perform_cmd(async {
                Msg::TrackerFetched(
                    fetch_json(Ok(api_request("/tracker/clear", Method::Post))).await,
                    Some("Cleared tracked path.".into()),
                )
            });
        }
        Msg::TrackerDestinationChanged(val) => model.tracker_destination = val,
        Msg::SetTrackerDestination => {
            let payload = DestinationRequest {
                destination: Some(model.tracker_destination.trim().to_string())
                    .filter(|d| !d.is_empty()),
            };
            orders.perform_cmd(async move {
                Msg::TrackerFetched(
                    fetch_json(api_put("/tracker/destination", &payload)).await,
                    None,
                )
            });
        }
        Msg::LocationUpdate(update) => {
            if update.error {
                model.error = update.message;
                return;
            }
            if !model.tracker.as_ref().is_some_and(|t| t.tracking) {
                return;
            }
            orders.perform_cmd(async move {
                Msg::PositionAcked(fetch_json(api_post("/tracker/positions", &update)).await)
            });
        }
        Msg::PositionAcked(result) => match result {
            Ok(ack) if ack.accepted => {
                orders.perform_cmd(async {
                    Msg::TrackerFetched(fetch_json(api_get("/tracker")).await, None)
                });
            }
            Ok(_) => {}
            Err(err) => model.error = Some(err),
        },
        Msg::TrackerFetched(result, notice) => match result {
            Ok(view) => {
                model.tracker = Some(view);
                if notice.is_some() {
                    model.notice = notice;
                }
                if model.tab == Tab::Tracker {
                    show_scene(active_scene(model));
                }
            }
            Err(err) => model.error = Some(err),
        },
    }
}

fn active_scene(model: &Model) -> Option<&MapScene> {
    match model.tab {
        Tab::RouteFinder => model.route.as_ref().map(|r| &r.scene),
        Tab::Graph => model.graph.as_ref().map(|g| &g.scene),
        Tab::Tracker => model.tracker.as_ref().and_then(|t| t.scene.as_ref()),
    }
}

fn show_scene(scene: Option<&MapScene>) {
    let value = scene
        .and_then(|scene| to_value(scene).ok())
        .unwrap_or(JsValue::NULL);
    render_scene_js(value);
}

fn api_request(path: &str, method: Method) -> Request<'static> {
    Request::new(format!("{}{path}", api_root())).method(method)
}

fn api_get(path: &str) -> Result<Request<'static>, String> {
    Ok(api_request(path, Method::Get))
}

fn api_post<B: serde::Serialize>(path: &str, body: &B) -> Result<Request<'static>, String> {
    api_request(path, Method::Post)
        .json(body)
        .map_err(|err| format!("{err:?}"))
}

fn api_put<B: serde::Serialize>(path: &str, body: &B) -> Result<Request<'static>, String> {
    api_request(path, Method::Put)
        .json(body)
        .map_err(|err| format!("{err:?}"))
}

/// Send a request and decode the JSON answer. Backend errors surface their
/// `message` so the sidebar can show it as-is.
async fn fetch_json<T: DeserializeOwned + 'static>(
    request: Result<Request<'static>, String>,
) -> Result<T, String> {
    let response = request?.fetch().await.map_err(|err| format!("{err:?}"))?;
    let status = response.status();
    if !status.is_ok() {
        return Err(match response.json::<ApiError>().await {
            Ok(api_error) => api_error.message,
            Err(_) => format!("Request failed with status {}", status.code),
        });
    }
    response.json::<T>().await.map_err(|err| format!("{err:?}"))
}

pub fn view(model: &Model) -> Node<Msg> {
    let tabs = nav![
        C!["tabs"],
        Tab::ALL.iter().map(|&tab| {
            button![
                C![IF!(tab == model.tab => "active")],
                tab.title(),
                ev(Ev::Click, move |event| {
                    event.prevent_default();
                    Msg::SelectTab(tab)
                }),
            ]
        })
    ];

    let sidebar = match model.tab {
        Tab::RouteFinder => view_route_form(model),
        Tab::Graph => view_graph_form(model),
        Tab::Tracker => view_tracker_controls(model),
    };
    let result = match model.tab {
        Tab::RouteFinder => view_route_result(model),
        Tab::Graph => view_graph_result(model),
        Tab::Tracker => view_tracker_details(model),
    };

    div![
        C!["app-container"],
        tabs,
        div![
            C!["controls"],
            sidebar,
            if let Some(notice) = &model.notice {
                p![C!["notice"], notice]
            } else {
                empty![]
            },
            if let Some(error) = &model.error {
                p![C!["error"], format!("❌ {error}")]
            } else {
                empty![]
            }
        ],
        result,
    ]
}

fn input_field(label: &str, value: &str, msg: fn(String) -> Msg) -> Node<Msg> {
    div![
        C!["input-field"],
        label![label],
        input![
            attrs! {
                At::Value => value,
                At::AutoComplete => "off",
                At::SpellCheck => "false",
            },
            input_ev(Ev::Input, msg),
        ]
    ]
}

fn action_button(text: &str, disabled: bool, msg: fn() -> Msg) -> Node<Msg> {
    button![
        text,
        attrs! { At::Disabled => bool_attr(disabled) },
        ev(Ev::Click, move |event| {
            event.prevent_default();
            msg()
        }),
    ]
}

fn place_select(
    label: &str,
    selected: &str,
    places: &[String],
    msg: fn(String) -> Msg,
) -> Node<Msg> {
    div![
        C!["input-field"],
        label![label],
        select![
            places.iter().map(|name| {
                option![
                    attrs! {
                        At::Value => name,
                        At::Selected => bool_attr(name == selected),
                    },
                    name,
                ]
            }),
            input_ev(Ev::Change, msg),
        ]
    ]
}

fn view_route_form(model: &Model) -> Node<Msg> {
    form![
        h2![Tab::RouteFinder.title()],
        small!["Enter locations (leave current blank to auto-detect):"],
        input_field(
            "📍 Current Location (optional):",
            &model.route_form.current_location,
            Msg::CurrentLocationChanged
        ),
        input_field(
            "🎯 Destination (required):",
            &model.route_form.destination,
            Msg::DestinationChanged
        ),
        div![
            C!["input-field"],
            label!["🚦 Travel Mode"],
            select![
                TravelProfile::ALL.iter().map(|profile| {
                    option![
                        attrs! {
                            At::Value => profile.as_str(),
                            At::Selected => bool_attr(*profile == model.route_form.profile),
                        },
                        profile.label(),
                    ]
                }),
                input_ev(Ev::Change, Msg::ProfileChanged),
            ]
        ],
        action_button("Find Shortest Path", model.pending, || Msg::FindRoute),
    ]
}

fn view_route_result(model: &Model) -> Node<Msg> {
    let Some(route) = &model.route else {
        return div![
            C!["preview"],
            p!["Enter a destination and press Find Shortest Path."]
        ];
    };

    div![
        C!["preview", "result-card"],
        h3!["Route Summary"],
        p![strong!["From: "], &route.start_label],
        p![strong!["To: "], &route.dest_label],
        p![strong!["Mode: "], &route.mode_label],
        p![strong!["Distance: "], &route.distance_text],
        p![strong!["Duration: "], &route.duration_text],
        gpx_link(&route.gpx_base64, "route.gpx"),
    ]
}

fn view_graph_form(model: &Model) -> Node<Msg> {
    let places: Vec<String> = model
        .graph
        .as_ref()
        .map(|g| g.places.iter().map(|p| p.name.clone()).collect())
        .unwrap_or_default();
    let form = &model.graph_form;

    form![
        h2!["Graph Controls"],
        fieldset![
            legend!["Add Place"],
            input_field("Place name", &form.place_name, Msg::PlaceNameChanged),
            action_button("Add Place", model.pending, || Msg::AddPlace),
        ],
        if places.len() >= 2 {
            fieldset![
                legend!["Add Road"],
                place_select("From", &form.road_from, &places, Msg::RoadFromChanged),
                place_select("To", &form.road_to, &places, Msg::RoadToChanged),
                input_field("Distance (km)", &form.road_km, Msg::RoadDistanceChanged),
                action_button("Add Edge", model.pending, || Msg::AddRoad),
            ]
        } else {
            small!["Add at least 2 places to connect them with roads."]
        },
        if places.is_empty() {
            empty![]
        } else {
            fieldset![
                legend!["Endpoints"],
                place_select("Select Start Place", &form.start, &places, Msg::StartPlaceChanged),
                action_button("Set as Start", model.pending, || Msg::SetStart),
                place_select("Select End Place", &form.end, &places, Msg::EndPlaceChanged),
                action_button("Set as End", model.pending, || Msg::SetEnd),
                action_button("Find Path", model.pending, || Msg::FindPath),
            ]
        },
    ]
}

fn view_graph_result(model: &Model) -> Node<Msg> {
    let Some(graph) = &model.graph else {
        return empty![];
    };
    if graph.places.is_empty() {
        return div![
            C!["preview"],
            p!["Start by adding some places using their names."]
        ];
    }
    let Some(path) = &graph.last_path else {
        return div![
            C!["preview"],
            p![format!(
                "{} places, {} roads",
                graph.places.len(),
                graph.roads.len()
            )]
        ];
    };

    div![
        C!["preview", "result-card"],
        h3!["🌟 Shortest Path Found!"],
        p![strong!["🚦 Start: "], &path.start],
        p![strong!["🏁 End: "], &path.end],
        p![strong!["📏 Distance: "], &path.distance_text],
        p![strong!["⏱ Estimated Time: "], &path.time_estimate],
        p![strong!["🛣 Path: "], path.path.join(" ➡️ ")],
        p![strong!["🚗 Mode of Transport: "], "Road (Average Speed 50 km/h)"],
    ]
}

fn view_tracker_controls(model: &Model) -> Node<Msg> {
    form![
        h2!["Navigation / Controls"],
        input_field(
            "Destination (optional, e.g., 'Chandigarh')",
            &model.tracker_destination,
            Msg::TrackerDestinationChanged
        ),
        action_button("Set Destination", false, || Msg::SetTrackerDestination),
        action_button("Clear Path", false, || Msg::ClearPath),
        action_button("Start Tracking", false, || Msg::StartTracking),
        action_button("Stop Tracking", false, || Msg::StopTracking),
    ]
}

fn view_tracker_details(model: &Model) -> Node<Msg> {
    let Some(tracker) = &model.tracker else {
        return empty![];
    };

    let last = tracker
        .positions
        .last()
        .map(|p| format!("{:.6}, {:.6} @ {}", p.lat, p.lon, p.timestamp))
        .unwrap_or_else(|| "–".into());

    div![
        C!["preview"],
        if tracker.positions.is_empty() {
            p![concat!(
                "No GPS points yet. Press Start Tracking, allow location permission ",
                "in your browser, then move to see the moving arrow."
            )]
        } else {
            empty![]
        },
        h3!["Tracking details"],
        p![format!("Tracking: {}", if tracker.tracking { "ON" } else { "OFF" })],
        p![format!("Number of points: {}", tracker.positions.len())],
        p![format!("Last position: {last}")],
        p![format!("Heading: {:.0}°", tracker.heading_deg)],
        gpx_link(&tracker.gpx_base64, "tracked-path.gpx"),
    ]
}

fn gpx_link(gpx_base64: &str, file_name: &str) -> Node<Msg> {
    if gpx_base64.is_empty() {
        return empty![];
    }
    a![
        C!["gpx-download"],
        attrs! {
            At::Href => gpx_href(gpx_base64),
            At::Download => file_name,
        },
        "⬇ Download GPX",
    ]
}

fn gpx_href(gpx_base64: &str) -> String {
    format!("data:application/gpx+xml;base64,{gpx_base64}")
}

#[wasm_bindgen(start)]
pub fn start() {
    init_map();
    App::start("app", init, update, view);
}

fn bool_attr(value: bool) -> AtValue {
    if value {
        AtValue::Some("true".into())
    } else {
        AtValue::Ignored
    }
}
