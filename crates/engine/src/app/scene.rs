use rand::Rng;

use crate::environment::EnvironmentBitmap;

pub const MIN_ZOOM: f32 = 0.5;
pub const MAX_ZOOM: f32 = 3.0;
const INITIAL_ENVIRONMENT_NAME: &str = "demo-grid";
const RANDOM_ORIGIN: Vec2 = Vec2 { x: 100.0, y: 100.0 };
const RANDOM_SPAN: Vec2 = Vec2 {
    x: 1000.0,
    y: 500.0,
};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };
}

/// Id convention: unique within the current list only; bulk replacements reuse ids.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Agent {
    pub id: i64,
    pub position: Vec2,
}

#[derive(Debug, Clone)]
pub struct SceneState {
    environment: Option<EnvironmentBitmap>,
    environment_name: String,
    agents: Vec<Agent>,
    zoom: f32,
    pan: Vec2,
    show_grid: bool,
    show_ids: bool,
    tick: u64,
}

impl Default for SceneState {
    fn default() -> Self {
        Self {
            environment: None,
            environment_name: INITIAL_ENVIRONMENT_NAME.to_string(),
            agents: Vec::new(),
            zoom: 1.0,
            pan: Vec2::ZERO,
            show_grid: true,
            show_ids: true,
            tick: 0,
        }
    }
}

impl SceneState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn environment(&self) -> Option<&EnvironmentBitmap> {
        self.environment.as_ref()
    }

    pub fn environment_name(&self) -> &str {
        &self.environment_name
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub(crate) fn agents_mut(&mut self) -> &mut [Agent] {
        &mut self.agents
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn pan(&self) -> Vec2 {
        self.pan
    }

    pub fn show_grid(&self) -> bool {
        self.show_grid
    }

    pub fn show_ids(&self) -> bool {
        self.show_ids
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn set_zoom(&mut self, zoom: f32) -> f32 {
        if zoom.is_finite() {
            self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        }
        self.zoom
    }

    pub fn set_pan(&mut self, pan: Vec2) {
        if pan.x.is_finite() && pan.y.is_finite() {
            self.pan = pan;
        }
    }

    pub fn reset_view(&mut self) {
        self.zoom = 1.0;
        self.pan = Vec2::ZERO;
    }

    pub fn set_show_grid(&mut self, show_grid: bool) {
        self.show_grid = show_grid;
    }

    pub fn set_show_ids(&mut self, show_ids: bool) {
        self.show_ids = show_ids;
    }

    pub fn set_environment(&mut self, bitmap: EnvironmentBitmap, name: impl Into<String>) {
        self.environment = Some(bitmap);
        self.environment_name = name.into();
    }

    pub fn replace_environment_bitmap(&mut self, bitmap: EnvironmentBitmap) {
        self.environment = Some(bitmap);
    }

    pub fn replace_agents(&mut self, agents: Vec<Agent>) {
        self.agents = agents;
    }

    pub fn randomize_agents<R: Rng + ?Sized>(&mut self, count: usize, rng: &mut R) {
        self.agents = (0..count)
            .map(|index| Agent {
                id: index as i64 + 1,
                position: Vec2 {
                    x: RANDOM_ORIGIN.x + rng.gen::<f32>() * RANDOM_SPAN.x,
                    y: RANDOM_ORIGIN.y + rng.gen::<f32>() * RANDOM_SPAN.y,
                },
            })
            .collect();
    }

    pub fn clear_agents(&mut self) {
        self.agents.clear();
    }

    pub(crate) fn advance_tick(&mut self) -> u64 {
        self.tick = self.tick.wrapping_add(1);
        self.tick
    }

    pub fn reset_tick(&mut self) {
        self.tick = 0;
    }
}
