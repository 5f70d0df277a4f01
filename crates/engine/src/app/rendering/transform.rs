use crate::app::Vec2;

const GRID_BASE_STEP_PX: f32 = 40.0;
const MARKER_BASE_RADIUS_PX: f32 = 10.0;
const MARKER_MIN_RADIUS_ZOOM: f32 = 0.7;
const ID_FONT_BASE_PX: i32 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// Marker placement only. The environment bitmap ignores pan.
pub fn world_to_screen(world: Vec2, zoom: f32, pan: Vec2) -> (f32, f32) {
    (world.x * zoom + pan.x, world.y * zoom + pan.y)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvironmentPlacement {
    pub left: f32,
    pub top: f32,
    pub scale: f32,
}

pub fn environment_placement(
    viewport: Viewport,
    bitmap_width: u32,
    bitmap_height: u32,
    zoom: f32,
) -> Option<EnvironmentPlacement> {
    if bitmap_width == 0 || bitmap_height == 0 || viewport.width == 0 || viewport.height == 0 {
        return None;
    }
    let surface_width = viewport.width as f32;
    let surface_height = viewport.height as f32;
    let fit = (surface_width / bitmap_width as f32).min(surface_height / bitmap_height as f32);
    let scale = fit * zoom;
    Some(EnvironmentPlacement {
        left: (surface_width - bitmap_width as f32 * scale) / 2.0,
        top: (surface_height - bitmap_height as f32 * scale) / 2.0,
        scale,
    })
}

pub(crate) fn grid_step(zoom: f32) -> f32 {
    GRID_BASE_STEP_PX * zoom
}

pub(crate) fn grid_origin(extent: u32, step: f32) -> f32 {
    (extent as f32 % step) / 2.0
}

pub(crate) fn grid_lines(extent: u32, zoom: f32) -> Vec<i32> {
    let step = grid_step(zoom);
    if !(step >= 1.0) {
        return Vec::new();
    }
    let mut lines = Vec::new();
    let mut position = grid_origin(extent, step);
    while position < extent as f32 {
        lines.push(position.floor() as i32);
        position += step;
    }
    lines
}

pub fn marker_radius(zoom: f32) -> f32 {
    MARKER_BASE_RADIUS_PX * zoom.max(MARKER_MIN_RADIUS_ZOOM)
}

pub(crate) fn id_font_px(zoom: f32) -> i32 {
    ID_FONT_BASE_PX + (2.0 * zoom).round() as i32
}
