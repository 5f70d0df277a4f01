pub mod app;
pub mod environment;
pub mod sync;

pub use app::{
    environment_placement, idle_motion_offset, marker_color, marker_radius, render_scene,
    run_app, world_to_screen, Agent, AppError, ControlAction, EnvironmentPlacement, EventQueue,
    EventSender, HudData, LoopConfig, LoopMetricsSnapshot, Playback, PlaybackState, Renderer,
    SceneState, Session, SessionConfig, SessionEvent, Vec2, Viewport, BACKGROUND_COLOR,
    DEFAULT_AGENT_COUNT, MAX_ZOOM, MIN_ZOOM, PALETTE,
};
pub use environment::{
    load_built_in, BuiltInEnvironment, EnvironmentBitmap, EnvironmentError, EnvironmentLoader,
    EnvironmentRequest, EnvironmentSource, HttpImageFetcher, ImageFetcher, LoadOutcome,
    CUSTOM_ENVIRONMENT_NAME,
};
pub use sync::{
    apply_server_message, parse_server_message, ClientMessage, ConnectionId, ConnectionState,
    ConnectionStatus, Connector, MessageEffect, ServerMessage, SyncClient, Transport,
    TransportError, TransportEvent, WsConnector,
};

pub const WS_URL_ENV_VAR: &str = "AGENTVIEW_WS_URL";
pub const AGENT_COUNT_ENV_VAR: &str = "AGENTVIEW_AGENT_COUNT";
pub const ENVIRONMENT_ENV_VAR: &str = "AGENTVIEW_ENVIRONMENT";
pub const AUTOCONNECT_ENV_VAR: &str = "AGENTVIEW_AUTOCONNECT";
pub const DEFAULT_WS_URL: &str = "ws://127.0.0.1:8765";
