use std::mem;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use crate::environment::{
    load_built_in, BuiltInEnvironment, EnvironmentLoader, EnvironmentRequest, EnvironmentSource,
    HttpImageFetcher, ImageFetcher, LoadOutcome, CUSTOM_ENVIRONMENT_NAME,
};
use crate::sync::{
    apply_server_message, ConnectionId, ConnectionState, ConnectionStatus, Connector,
    MessageEffect, SyncClient, TransportEvent, WsConnector,
};
use crate::DEFAULT_WS_URL;

use super::events::{EventQueue, EventSender, SessionEvent};
use super::input::ControlAction;
use super::metrics::LoopMetricsSnapshot;
use super::playback::{Playback, PlaybackState};
use super::rendering::HudData;
use super::scene::{SceneState, Vec2};

pub const DEFAULT_AGENT_COUNT: usize = 5;
const ZOOM_STEP: f32 = 1.15;

#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub agent_count: usize,
    pub endpoint: String,
    pub initial_environment: EnvironmentSource,
    pub autoconnect: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            agent_count: DEFAULT_AGENT_COUNT,
            endpoint: DEFAULT_WS_URL.to_string(),
            initial_environment: EnvironmentSource::BuiltIn(
                BuiltInEnvironment::DemoGrid.name().to_string(),
            ),
            autoconnect: false,
        }
    }
}

pub struct Session {
    scene: SceneState,
    playback: Playback,
    sync: SyncClient,
    loader: EnvironmentLoader,
    queue: EventQueue,
    pending_events: Vec<SessionEvent>,
    initial_environment: EnvironmentSource,
    autoconnect: bool,
    agent_count: usize,
    endpoint: String,
    rng: StdRng,
    redraw_requested: bool,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Self::with_backends(
            config,
            Box::new(WsConnector),
            Arc::new(HttpImageFetcher),
        )
    }

    pub fn with_backends(
        config: SessionConfig,
        connector: Box<dyn Connector>,
        fetcher: Arc<dyn ImageFetcher>,
    ) -> Self {
        let queue = EventQueue::new();
        let loader = EnvironmentLoader::new(fetcher, queue.sender());
        Self {
            scene: SceneState::new(),
            playback: Playback::new(),
            sync: SyncClient::new(connector),
            loader,
            queue,
            pending_events: Vec::new(),
            initial_environment: config.initial_environment,
            autoconnect: config.autoconnect,
            agent_count: config.agent_count,
            endpoint: config.endpoint,
            rng: StdRng::from_entropy(),
            redraw_requested: true,
        }
    }

    pub fn boot(&mut self) {
        info!(
            agent_count = self.agent_count,
            endpoint = self.endpoint.as_str(),
            environment = ?self.initial_environment,
            autoconnect = self.autoconnect,
            "session_boot"
        );
        self.load_environment(self.initial_environment.clone());
        self.reset_agents(self.agent_count);
        if self.autoconnect {
            self.connect_to_endpoint();
        }
    }

    pub fn scene(&self) -> &SceneState {
        &self.scene
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.playback.state()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.sync.state()
    }

    pub fn connection_status(&self) -> ConnectionStatus {
        self.sync.status()
    }

    pub fn agent_count(&self) -> usize {
        self.agent_count
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn event_sender(&self) -> EventSender {
        self.queue.sender()
    }

    pub fn load_environment(&mut self, source: EnvironmentSource) {
        match source {
            EnvironmentSource::BuiltIn(name) => match load_built_in(&name) {
                Ok(bitmap) => {
                    self.scene.set_environment(bitmap, name.as_str());
                    self.scene.reset_view();
                    info!(environment = name.as_str(), "environment_loaded");
                    self.request_redraw();
                }
                Err(error) => warn!(error = %error, "environment_load_failed"),
            },
            EnvironmentSource::Upload(path) => {
                info!(path = %path.display(), "environment_upload_requested");
                self.loader.request(EnvironmentRequest::Upload(path));
            }
            EnvironmentSource::Remote(url) => {
                self.loader.request(EnvironmentRequest::Remote(url));
            }
        }
    }

    pub fn cycle_environment(&mut self) {
        let next = BuiltInEnvironment::from_name(self.scene.environment_name())
            .map(BuiltInEnvironment::next)
            .unwrap_or(BuiltInEnvironment::ALL[0]);
        self.load_environment(EnvironmentSource::BuiltIn(next.name().to_string()));
    }

    pub fn reset_agents(&mut self, count: usize) {
        self.scene.randomize_agents(count, &mut self.rng);
        debug!(agent_count = count, "agents_randomized");
        self.request_redraw();
    }

    pub fn clear_agents(&mut self) {
        self.scene.clear_agents();
        debug!("agents_cleared");
        self.request_redraw();
    }

    pub fn set_agent_count(&mut self, count: usize) {
        self.agent_count = count;
        info!(agent_count = count, "agent_count_changed");
        self.reset_agents(count);
    }

    pub fn adjust_agent_count(&mut self, delta: isize) {
        let count = self.agent_count.saturating_add_signed(delta);
        if count != self.agent_count {
            self.set_agent_count(count);
        }
    }

    pub fn set_zoom(&mut self, zoom: f32) -> f32 {
        let stored = self.scene.set_zoom(zoom);
        self.request_redraw();
        stored
    }

    pub fn zoom_in(&mut self) -> f32 {
        self.set_zoom(self.scene.zoom() * ZOOM_STEP)
    }

    pub fn zoom_out(&mut self) -> f32 {
        self.set_zoom(self.scene.zoom() / ZOOM_STEP)
    }

    pub fn set_pan(&mut self, pan: Vec2) {
        self.scene.set_pan(pan);
        self.request_redraw();
    }

    pub fn start_playback(&mut self) {
        if self.playback.start() {
            info!("playback_started");
        }
    }

    pub fn pause_playback(&mut self) {
        if self.playback.pause() {
            info!(tick = self.scene.tick(), "playback_paused");
        }
    }

    pub fn set_show_grid(&mut self, show_grid: bool) {
        self.scene.set_show_grid(show_grid);
        self.request_redraw();
    }

    pub fn set_show_ids(&mut self, show_ids: bool) {
        self.scene.set_show_ids(show_ids);
        self.request_redraw();
    }

    pub fn connect(&mut self, url: &str) -> Option<ConnectionId> {
        let url = url.trim();
        if url.is_empty() {
            warn!("sync_connect_skipped_empty_url");
            return None;
        }
        self.endpoint = url.to_string();
        let sender = self.queue.sender();
        let connection = self.sync.connect(url, &sender);
        self.request_redraw();
        Some(connection)
    }

    pub fn connect_to_endpoint(&mut self) -> Option<ConnectionId> {
        let endpoint = self.endpoint.clone();
        self.connect(&endpoint)
    }

    pub fn disconnect(&mut self) {
        self.sync.disconnect();
        self.request_redraw();
    }

    pub fn apply_control(&mut self, action: ControlAction) -> bool {
        match action {
            ControlAction::RandomizeAgents => self.reset_agents(self.agent_count),
            ControlAction::ClearAgents => self.clear_agents(),
            ControlAction::IncreaseAgentCount => self.adjust_agent_count(1),
            ControlAction::DecreaseAgentCount => self.adjust_agent_count(-1),
            ControlAction::CycleEnvironment => self.cycle_environment(),
            ControlAction::ZoomIn => {
                self.zoom_in();
            }
            ControlAction::ZoomOut => {
                self.zoom_out();
            }
            ControlAction::StartPlayback => self.start_playback(),
            ControlAction::PausePlayback => self.pause_playback(),
            ControlAction::ToggleGrid => self.set_show_grid(!self.scene.show_grid()),
            ControlAction::ToggleIds => self.set_show_ids(!self.scene.show_ids()),
            ControlAction::Connect => {
                self.connect_to_endpoint();
            }
            ControlAction::Disconnect => self.disconnect(),
            ControlAction::ToggleHud | ControlAction::Quit => return false,
        }
        true
    }

    pub fn pump(&mut self) -> usize {
        let mut events = mem::take(&mut self.pending_events);
        let drained = self.queue.drain_into(&mut events);
        for event in events.drain(..) {
            match event {
                SessionEvent::Transport { connection, event } => {
                    self.handle_transport_event(connection, event);
                }
                SessionEvent::EnvironmentLoaded(outcome) => self.apply_load_outcome(outcome),
            }
        }
        self.pending_events = events;
        drained
    }

    fn handle_transport_event(&mut self, connection: ConnectionId, event: TransportEvent) {
        let changes_status = !matches!(event, TransportEvent::Text(_));
        let message = self
            .sync
            .handle_transport_event(connection, event, self.agent_count);
        if changes_status {
            self.request_redraw();
        }
        let Some(message) = message else {
            return;
        };
        match apply_server_message(&mut self.scene, message) {
            MessageEffect::None => {}
            MessageEffect::Redraw => self.request_redraw(),
            MessageEffect::FetchEnvironment(url) => {
                self.load_environment(EnvironmentSource::Remote(url));
            }
        }
    }

    fn apply_load_outcome(&mut self, outcome: LoadOutcome) {
        let LoadOutcome { request, result } = outcome;
        match (request, result) {
            (EnvironmentRequest::Upload(path), Ok(bitmap)) => {
                info!(
                    path = %path.display(),
                    width = bitmap.width(),
                    height = bitmap.height(),
                    "environment_upload_loaded"
                );
                self.scene.set_environment(bitmap, CUSTOM_ENVIRONMENT_NAME);
                self.scene.reset_view();
                self.request_redraw();
            }
            (EnvironmentRequest::Remote(url), Ok(bitmap)) => {
                info!(
                    url = url.as_str(),
                    width = bitmap.width(),
                    height = bitmap.height(),
                    "environment_remote_loaded"
                );
                self.scene.replace_environment_bitmap(bitmap);
                self.request_redraw();
            }
            (request, Err(error)) => {
                warn!(request = ?request, error = %error, "environment_load_failed");
            }
        }
    }

    pub fn advance_frame(&mut self) -> bool {
        let ran = self.playback.run_scheduled_frame(&mut self.scene);
        if ran {
            self.request_redraw();
        }
        ran
    }

    pub fn request_redraw(&mut self) {
        self.redraw_requested = true;
    }

    pub fn wants_frame(&self) -> bool {
        self.redraw_requested || self.playback.has_scheduled_frame()
    }

    pub fn take_redraw_request(&mut self) -> bool {
        mem::take(&mut self.redraw_requested)
    }

    pub fn hud_data(&self, metrics: LoopMetricsSnapshot) -> HudData {
        HudData {
            environment_name: self.scene.environment_name().to_string(),
            agent_count: self.agent_count,
            visible_agents: self.scene.agents().len(),
            tick: self.scene.tick(),
            zoom: self.scene.zoom(),
            playback: self.playback.state(),
            connection: self.sync.status(),
            endpoint: self.sync.endpoint().map(str::to_owned),
            metrics,
        }
    }

    pub fn shutdown(&mut self) {
        self.playback.pause();
        self.sync.disconnect();
        info!("session_shutdown");
    }
}
