use super::scene::{Agent, SceneState, Vec2};

const IDLE_X_PERIOD_TICKS: f64 = 40.0;
const IDLE_Y_PERIOD_TICKS: f64 = 50.0;
const IDLE_AMPLITUDE: f64 = 0.6;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Running,
}

impl PlaybackState {
    pub fn label(self) -> &'static str {
        match self {
            PlaybackState::Stopped => "paused",
            PlaybackState::Running => "running",
        }
    }
}

#[derive(Debug, Default)]
pub struct Playback {
    state: PlaybackState,
    frame_scheduled: bool,
}

impl Playback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == PlaybackState::Running
    }

    pub fn has_scheduled_frame(&self) -> bool {
        self.frame_scheduled
    }

    pub fn start(&mut self) -> bool {
        if self.is_running() {
            return false;
        }
        self.state = PlaybackState::Running;
        self.frame_scheduled = true;
        true
    }

    pub fn pause(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }
        self.state = PlaybackState::Stopped;
        self.frame_scheduled = false;
        true
    }

    pub fn run_scheduled_frame(&mut self, scene: &mut SceneState) -> bool {
        if !self.frame_scheduled {
            return false;
        }
        self.frame_scheduled = false;

        let tick = scene.advance_tick();
        apply_idle_motion(scene.agents_mut(), tick);

        self.frame_scheduled = self.is_running();
        true
    }
}

/// Phase convention: follows list order, not agent identity.
pub fn idle_motion_offset(tick: u64, index: usize) -> Vec2 {
    let phase = tick as f64 + index as f64;
    Vec2 {
        x: ((phase / IDLE_X_PERIOD_TICKS).sin() * IDLE_AMPLITUDE) as f32,
        y: ((phase / IDLE_Y_PERIOD_TICKS).cos() * IDLE_AMPLITUDE) as f32,
    }
}

fn apply_idle_motion(agents: &mut [Agent], tick: u64) {
    for (index, agent) in agents.iter_mut().enumerate() {
        let offset = idle_motion_offset(tick, index);
        agent.position.x += offset.x;
        agent.position.y += offset.y;
    }
}
