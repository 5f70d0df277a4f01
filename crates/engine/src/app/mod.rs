mod events;
mod input;
mod loop_runner;
mod metrics;
mod playback;
mod rendering;
mod scene;
mod session;

pub use events::{EventQueue, EventSender, SessionEvent};
pub use input::ControlAction;
pub use loop_runner::{run_app, AppError, LoopConfig};
pub use metrics::LoopMetricsSnapshot;
pub use playback::{idle_motion_offset, Playback, PlaybackState};
pub use rendering::{
    environment_placement, marker_color, marker_radius, render_scene, world_to_screen,
    EnvironmentPlacement, HudData, Renderer, Viewport, BACKGROUND_COLOR, PALETTE,
};
pub use scene::{Agent, SceneState, Vec2, MAX_ZOOM, MIN_ZOOM};
pub use session::{Session, SessionConfig, DEFAULT_AGENT_COUNT};

pub(crate) use rendering::raster;
