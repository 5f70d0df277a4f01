use crate::app::{LoopMetricsSnapshot, PlaybackState};
use crate::sync::ConnectionStatus;

use super::raster::{fill_rect, stroke_rect};
use super::text::{draw_text, text_height, text_width};

const HUD_TEXT_SCALE: i32 = 2;
const HUD_LINE_GAP: i32 = 2 * HUD_TEXT_SCALE;
const HUD_MARGIN: i32 = 8;
const HUD_INSET: i32 = 4 * HUD_TEXT_SCALE;
const HUD_PANEL_COLOR: [u8; 4] = [10, 12, 16, 200];
const HUD_BORDER_COLOR: [u8; 4] = [92, 106, 126, 255];
const HUD_TEXT_COLOR: [u8; 4] = [244, 248, 252, 255];
const HUD_CONNECTED_COLOR: [u8; 4] = [163, 255, 182, 255];
const HUD_DISCONNECTED_COLOR: [u8; 4] = [255, 157, 182, 255];

#[derive(Debug, Clone, PartialEq)]
pub struct HudData {
    pub environment_name: String,
    pub agent_count: usize,
    pub visible_agents: usize,
    pub tick: u64,
    pub zoom: f32,
    pub playback: PlaybackState,
    pub connection: ConnectionStatus,
    pub endpoint: Option<String>,
    pub metrics: LoopMetricsSnapshot,
}

pub(crate) fn draw_hud(frame: &mut [u8], width: u32, height: u32, data: &HudData) {
    if width == 0 || height == 0 {
        return;
    }
    let lines = hud_lines(data);
    let line_height = text_height(HUD_TEXT_SCALE);
    let widest = lines
        .iter()
        .map(|(line, _)| text_width(line, HUD_TEXT_SCALE))
        .max()
        .unwrap_or(0);
    let panel_width = widest + HUD_INSET * 2;
    let panel_height =
        lines.len() as i32 * (line_height + HUD_LINE_GAP) - HUD_LINE_GAP + HUD_INSET * 2;

    fill_rect(
        frame,
        width,
        height,
        HUD_MARGIN,
        HUD_MARGIN,
        panel_width,
        panel_height,
        HUD_PANEL_COLOR,
    );
    stroke_rect(
        frame,
        width,
        height,
        HUD_MARGIN,
        HUD_MARGIN,
        panel_width,
        panel_height,
        HUD_BORDER_COLOR,
    );

    let mut y = HUD_MARGIN + HUD_INSET;
    for (line, color) in &lines {
        draw_text(
            frame,
            width,
            height,
            HUD_MARGIN + HUD_INSET,
            y,
            line,
            HUD_TEXT_SCALE,
            *color,
        );
        y += line_height + HUD_LINE_GAP;
    }
}

fn hud_lines(data: &HudData) -> Vec<(String, [u8; 4])> {
    let connection_color = match data.connection {
        ConnectionStatus::Connected => HUD_CONNECTED_COLOR,
        ConnectionStatus::Disconnected => HUD_DISCONNECTED_COLOR,
    };
    let mut lines = vec![
        (format!("env: {}", data.environment_name), HUD_TEXT_COLOR),
        (
            format!("agents: {}/{}", data.visible_agents, data.agent_count),
            HUD_TEXT_COLOR,
        ),
        (format!("ticks: {}", data.tick), HUD_TEXT_COLOR),
        (format!("zoom: {:.2}x", data.zoom), HUD_TEXT_COLOR),
        (
            format!("playback: {}", data.playback.label()),
            HUD_TEXT_COLOR,
        ),
        (
            format!("ws: {}", data.connection.label()),
            connection_color,
        ),
    ];
    if let Some(endpoint) = &data.endpoint {
        lines.push((endpoint.clone(), HUD_TEXT_COLOR));
    }
    lines.push((format!("fps: {:.0}", data.metrics.fps), HUD_TEXT_COLOR));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data() -> HudData {
        HudData {
            environment_name: "warehouse".to_string(),
            agent_count: 5,
            visible_agents: 3,
            tick: 42,
            zoom: 1.5,
            playback: PlaybackState::Running,
            connection: ConnectionStatus::Connected,
            endpoint: Some("ws://127.0.0.1:8765".to_string()),
            metrics: LoopMetricsSnapshot::default(),
        }
    }

    #[test]
    fn lines_cover_scene_and_connection_state() {
        let texts: Vec<String> = hud_lines(&data()).into_iter().map(|(line, _)| line).collect();
        assert!(texts.contains(&"env: warehouse".to_string()));
        assert!(texts.contains(&"agents: 3/5".to_string()));
        assert!(texts.contains(&"ticks: 42".to_string()));
        assert!(texts.contains(&"zoom: 1.50x".to_string()));
        assert!(texts.contains(&"playback: running".to_string()));
        assert!(texts.contains(&"ws: connected".to_string()));
        assert!(texts.contains(&"ws://127.0.0.1:8765".to_string()));
    }

    #[test]
    fn endpoint_line_is_omitted_when_never_connected() {
        let mut hud = data();
        hud.endpoint = None;
        assert_eq!(hud_lines(&hud).len(), hud_lines(&data()).len() - 1);
    }

    #[test]
    fn panel_is_drawn_in_top_left() {
        let mut frame = vec![0u8; 400 * 300 * 4];
        draw_hud(&mut frame, 400, 300, &data());
        let border = (HUD_MARGIN as usize * 400 + HUD_MARGIN as usize) * 4;
        assert_eq!(&frame[border..border + 4], &HUD_BORDER_COLOR);
        assert!(frame[..4].iter().all(|byte| *byte == 0));
    }

    #[test]
    fn tiny_frames_do_not_panic() {
        let mut frame = vec![0u8; 3 * 2 * 4];
        draw_hud(&mut frame, 3, 2, &data());
        draw_hud(&mut [], 0, 0, &data());
    }
}
