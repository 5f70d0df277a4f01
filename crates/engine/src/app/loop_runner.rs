use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use pixels::Error as PixelsError;
use thiserror::Error;
use tracing::{debug, info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{ElementState, Event, KeyEvent, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowBuilder;

use crate::environment::EnvironmentSource;

use super::input::ControlAction;
use super::metrics::{LoopMetricsSnapshot, MetricsAccumulator};
use super::rendering::Renderer;
use super::session::Session;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(16);
const DEFAULT_METRICS_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,
    pub max_render_fps: Option<u32>,
    pub event_poll_interval: Duration,
    pub metrics_log_interval: Duration,
    pub hud_visible: bool,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_title: "Agent View".to_string(),
            window_width: 1280,
            window_height: 720,
            max_render_fps: Some(60),
            event_poll_interval: DEFAULT_POLL_INTERVAL,
            metrics_log_interval: DEFAULT_METRICS_INTERVAL,
            hud_visible: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize renderer: {0}")]
    CreateRenderer(#[source] PixelsError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

pub fn run_app(config: LoopConfig, mut session: Session) -> Result<(), AppError> {
    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window_title.clone())
            .with_inner_size(LogicalSize::new(
                config.window_width as f64,
                config.window_height as f64,
            ))
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    );
    let mut renderer = Renderer::new(Arc::clone(&window)).map_err(AppError::CreateRenderer)?;

    let metrics_log_interval = non_zero_or(config.metrics_log_interval, DEFAULT_METRICS_INTERVAL);
    let event_poll_interval = non_zero_or(config.event_poll_interval, DEFAULT_POLL_INTERVAL);
    let render_budget = frame_budget(config.max_render_fps);
    info!(
        render_fps_cap = %describe_render_cap(config.max_render_fps),
        event_poll_interval_ms = event_poll_interval.as_millis() as u64,
        metrics_log_interval_ms = metrics_log_interval.as_millis() as u64,
        hud_visible = config.hud_visible,
        "loop_config"
    );

    session.boot();

    let mut hud_visible = config.hud_visible;
    let mut last_frame_instant = Instant::now();
    let mut last_present_instant = Instant::now();
    let mut metrics_accumulator = MetricsAccumulator::new(metrics_log_interval);
    let mut last_snapshot = LoopMetricsSnapshot::default();
    let mut last_applied_title: Option<String> = None;

    event_loop
        .run(move |event, window_target| match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested => {
                    info!(reason = "window_close", "shutdown_requested");
                    window_target.exit();
                }
                WindowEvent::Resized(new_size) => {
                    if let Err(error) = renderer.resize(new_size.width, new_size.height) {
                        warn!(error = %error, "renderer_resize_failed");
                        window_target.exit();
                    }
                    session.request_redraw();
                }
                WindowEvent::ScaleFactorChanged { .. } => {
                    let size = window.inner_size();
                    if let Err(error) = renderer.resize(size.width, size.height) {
                        warn!(error = %error, "renderer_resize_failed");
                        window_target.exit();
                    }
                    session.request_redraw();
                }
                WindowEvent::DroppedFile(path) => {
                    session.load_environment(EnvironmentSource::Upload(path));
                }
                WindowEvent::KeyboardInput { event, .. } => {
                    let Some(action) = action_for_key_event(&event) else {
                        return;
                    };
                    debug!(action = ?action, "control_action");
                    if !action.is_window_action() {
                        session.apply_control(action);
                        return;
                    }
                    match action {
                        ControlAction::Quit => {
                            info!(reason = "escape_key", "shutdown_requested");
                            window_target.exit();
                        }
                        ControlAction::ToggleHud => {
                            hud_visible = !hud_visible;
                            info!(hud_visible, "hud_toggled");
                            session.request_redraw();
                        }
                        _ => {}
                    }
                }
                WindowEvent::RedrawRequested => {
                    let now = Instant::now();
                    let raw_frame_dt = now.saturating_duration_since(last_frame_instant);
                    last_frame_instant = now;

                    if session.advance_frame() {
                        metrics_accumulator.record_playback_frame();
                    }
                    session.take_redraw_request();

                    // Single pacing point; also bounds the playback rate.
                    let since_present = last_present_instant.elapsed();
                    let cap_sleep = remaining_budget(since_present, render_budget);
                    if !cap_sleep.is_zero() {
                        thread::sleep(cap_sleep);
                    }

                    let hud = hud_visible.then(|| session.hud_data(last_snapshot));
                    if let Err(error) = renderer.render(session.scene(), hud.as_ref()) {
                        warn!(error = %error, "renderer_draw_failed");
                        window_target.exit();
                    }
                    last_present_instant = Instant::now();

                    let next_title =
                        window_title_for(&config.window_title, session.scene().environment_name());
                    if last_applied_title.as_deref() != Some(next_title.as_str()) {
                        window.set_title(&next_title);
                        last_applied_title = Some(next_title);
                    }

                    metrics_accumulator.record_frame(raw_frame_dt);
                    if let Some(snapshot) = metrics_accumulator.maybe_snapshot(now) {
                        last_snapshot = snapshot;
                        info!(
                            fps = snapshot.fps,
                            playback_fps = snapshot.playback_fps,
                            frame_time_ms = snapshot.frame_time_ms,
                            events_drained = snapshot.events_drained,
                            agent_count = session.scene().agents().len(),
                            tick = session.scene().tick(),
                            "loop_metrics"
                        );
                    }
                }
                _ => {}
            },
            Event::AboutToWait => {
                let drained = session.pump();
                metrics_accumulator.record_events(drained);
                if session.wants_frame() {
                    window.request_redraw();
                }
                window_target.set_control_flow(ControlFlow::WaitUntil(
                    Instant::now() + event_poll_interval,
                ));
            }
            Event::LoopExiting => {
                session.shutdown();
                info!("shutdown");
            }
            _ => {}
        })
        .map_err(AppError::EventLoopRun)
}

fn action_for_key_event(key_event: &KeyEvent) -> Option<ControlAction> {
    if key_event.state != ElementState::Pressed || key_event.repeat {
        return None;
    }
    match key_event.physical_key {
        PhysicalKey::Code(code) => action_for_key(code),
        PhysicalKey::Unidentified(_) => None,
    }
}

pub(crate) fn action_for_key(code: KeyCode) -> Option<ControlAction> {
    let action = match code {
        KeyCode::KeyR => ControlAction::RandomizeAgents,
        KeyCode::Delete | KeyCode::Backspace => ControlAction::ClearAgents,
        KeyCode::BracketRight => ControlAction::IncreaseAgentCount,
        KeyCode::BracketLeft => ControlAction::DecreaseAgentCount,
        KeyCode::KeyE => ControlAction::CycleEnvironment,
        KeyCode::Equal | KeyCode::NumpadAdd => ControlAction::ZoomIn,
        KeyCode::Minus | KeyCode::NumpadSubtract => ControlAction::ZoomOut,
        KeyCode::Enter | KeyCode::NumpadEnter => ControlAction::StartPlayback,
        KeyCode::Space => ControlAction::PausePlayback,
        KeyCode::KeyG => ControlAction::ToggleGrid,
        KeyCode::KeyI => ControlAction::ToggleIds,
        KeyCode::KeyC => ControlAction::Connect,
        KeyCode::KeyX => ControlAction::Disconnect,
        KeyCode::F3 => ControlAction::ToggleHud,
        KeyCode::Escape => ControlAction::Quit,
        _ => return None,
    };
    Some(action)
}

fn window_title_for(base: &str, environment_name: &str) -> String {
    format!("{base} - {environment_name}")
}

fn non_zero_or(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

fn frame_budget(max_render_fps: Option<u32>) -> Option<Duration> {
    max_render_fps
        .filter(|fps| *fps > 0)
        .map(|fps| Duration::from_secs_f64(1.0 / f64::from(fps)))
}

fn remaining_budget(since_present: Duration, budget: Option<Duration>) -> Duration {
    budget.map_or(Duration::ZERO, |budget| budget.saturating_sub(since_present))
}

fn describe_render_cap(max_render_fps: Option<u32>) -> String {
    max_render_fps
        .filter(|fps| *fps > 0)
        .map_or_else(|| "off".to_string(), |fps| fps.to_string())
}
