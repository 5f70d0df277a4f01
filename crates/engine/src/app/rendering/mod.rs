mod hud;
pub(crate) mod raster;
mod renderer;
mod text;
mod transform;

pub use hud::HudData;
pub use renderer::{marker_color, render_scene, Renderer, BACKGROUND_COLOR, PALETTE};
pub use transform::{
    environment_placement, marker_radius, world_to_screen, EnvironmentPlacement, Viewport,
};
