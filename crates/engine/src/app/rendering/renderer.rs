use std::sync::Arc;

use pixels::{Error, Pixels, SurfaceTexture};
use winit::window::Window;

use crate::app::SceneState;

use super::hud::{draw_hud, HudData};
use super::raster::{
    clear, draw_bitmap_scaled, fill_circle, horizontal_line, stroke_circle, vertical_line,
};
use super::text::{draw_text_centered, scale_for_font_px};
use super::transform::{
    environment_placement, grid_lines, id_font_px, marker_radius, world_to_screen, Viewport,
};

pub const BACKGROUND_COLOR: [u8; 4] = [11, 15, 29, 255];
const GRID_COLOR: [u8; 4] = [255, 255, 255, 18];
const MARKER_OUTLINE_COLOR: [u8; 4] = [0, 0, 0, 115];
const MARKER_OUTLINE_WIDTH_PX: f32 = 2.0;
const MARKER_LABEL_COLOR: [u8; 4] = [0, 0, 0, 191];

pub const PALETTE: [[u8; 4]; 16] = [
    [0x7c, 0xde, 0xff, 255],
    [0xa3, 0xff, 0xb6, 255],
    [0xff, 0xd1, 0x7c, 255],
    [0xff, 0x9d, 0xb6, 255],
    [0xd6, 0xa3, 0xff, 255],
    [0x9e, 0xe8, 0xb4, 255],
    [0xf6, 0xa0, 0x6c, 255],
    [0x9a, 0xd0, 0xff, 255],
    [0xb0, 0xf7, 0xff, 255],
    [0xff, 0xb5, 0xa3, 255],
    [0xc2, 0xa3, 0xff, 255],
    [0xcf, 0xff, 0x7c, 255],
    [0xc0, 0xff, 0xd9, 255],
    [0xff, 0xc2, 0x7c, 255],
    [0xff, 0xa8, 0xf0, 255],
    [0xa8, 0xff, 0xd5, 255],
];

/// Palette convention: color follows list position, not agent id.
pub fn marker_color(index: usize) -> [u8; 4] {
    PALETTE[index % PALETTE.len()]
}

pub fn render_scene(frame: &mut [u8], viewport: Viewport, scene: &SceneState) {
    let Viewport { width, height } = viewport;
    if width == 0 || height == 0 {
        return;
    }
    clear(frame, BACKGROUND_COLOR);

    if let Some(bitmap) = scene.environment() {
        if let Some(placement) =
            environment_placement(viewport, bitmap.width(), bitmap.height(), scene.zoom())
        {
            draw_bitmap_scaled(
                frame,
                width,
                height,
                bitmap,
                (placement.left, placement.top),
                placement.scale,
            );
        }
    }

    if scene.show_grid() {
        draw_grid(frame, viewport, scene.zoom());
    }

    draw_agents(frame, viewport, scene);
}

fn draw_grid(frame: &mut [u8], viewport: Viewport, zoom: f32) {
    let Viewport { width, height } = viewport;
    for x in grid_lines(width, zoom) {
        vertical_line(frame, width, height, x, GRID_COLOR);
    }
    for y in grid_lines(height, zoom) {
        horizontal_line(frame, width, height, y, GRID_COLOR);
    }
}

fn draw_agents(frame: &mut [u8], viewport: Viewport, scene: &SceneState) {
    let Viewport { width, height } = viewport;
    let zoom = scene.zoom();
    let radius = marker_radius(zoom);
    let label_scale = scale_for_font_px(id_font_px(zoom));

    for (index, agent) in scene.agents().iter().enumerate() {
        let center = world_to_screen(agent.position, zoom, scene.pan());
        fill_circle(frame, width, height, center, radius, marker_color(index));
        stroke_circle(
            frame,
            width,
            height,
            center,
            radius,
            MARKER_OUTLINE_WIDTH_PX,
            MARKER_OUTLINE_COLOR,
        );
        if scene.show_ids() {
            draw_text_centered(
                frame,
                width,
                height,
                center,
                &agent.id.to_string(),
                label_scale,
                MARKER_LABEL_COLOR,
            );
        }
    }
}

pub struct Renderer {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    viewport: Viewport,
}

impl Renderer {
    pub fn new(window: Arc<Window>) -> Result<Self, Error> {
        let size = window.inner_size();
        let pixels = Self::build_pixels(Arc::clone(&window), size.width, size.height)?;
        Ok(Self {
            window,
            pixels,
            viewport: Viewport {
                width: size.width,
                height: size.height,
            },
        })
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), Error> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels = Self::build_pixels(Arc::clone(&self.window), width, height)?;
        self.viewport = Viewport { width, height };
        Ok(())
    }

    fn build_pixels(
        window: Arc<Window>,
        width: u32,
        height: u32,
    ) -> Result<Pixels<'static>, Error> {
        let surface = SurfaceTexture::new(width.max(1), height.max(1), window);
        Pixels::new(width.max(1), height.max(1), surface)
    }

    pub fn render(&mut self, scene: &SceneState, hud: Option<&HudData>) -> Result<(), Error> {
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Ok(());
        }
        let viewport = self.viewport;
        let frame = self.pixels.frame_mut();
        render_scene(frame, viewport, scene);
        if let Some(hud) = hud {
            draw_hud(frame, viewport.width, viewport.height, hud);
        }
        self.pixels.render()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{Agent, Vec2};
    use crate::environment::{load_built_in, EnvironmentBitmap};

    const VIEWPORT: Viewport = Viewport {
        width: 320,
        height: 180,
    };

    fn frame() -> Vec<u8> {
        vec![0u8; VIEWPORT.width as usize * VIEWPORT.height as usize * 4]
    }

    fn pixel(frame: &[u8], x: u32, y: u32) -> [u8; 4] {
        let offset = (y as usize * VIEWPORT.width as usize + x as usize) * 4;
        [
            frame[offset],
            frame[offset + 1],
            frame[offset + 2],
            frame[offset + 3],
        ]
    }

    fn scene_with_agent_at(x: f32, y: f32) -> SceneState {
        let mut scene = SceneState::new();
        scene.set_show_grid(false);
        scene.set_show_ids(false);
        scene.replace_agents(vec![Agent {
            id: 1,
            position: Vec2 { x, y },
        }]);
        scene
    }

    #[test]
    fn empty_scene_is_background_only() {
        let mut scene = SceneState::new();
        scene.set_show_grid(false);
        let mut buf = frame();
        render_scene(&mut buf, VIEWPORT, &scene);
        assert!(buf.chunks_exact(4).all(|px| px == BACKGROUND_COLOR));
    }

    #[test]
    fn rendering_is_deterministic_and_read_only() {
        let mut scene = SceneState::new();
        let bitmap = load_built_in("warehouse").expect("built-in");
        scene.set_environment(bitmap, "warehouse");
        scene.replace_agents(
            (0..20)
                .map(|index| Agent {
                    id: index + 1,
                    position: Vec2 {
                        x: 30.0 + index as f32 * 13.0,
                        y: 40.0 + index as f32 * 5.0,
                    },
                })
                .collect(),
        );
        scene.set_zoom(1.3);
        let before = scene.clone();

        let mut first = frame();
        let mut second = frame();
        render_scene(&mut first, VIEWPORT, &scene);
        render_scene(&mut second, VIEWPORT, &scene);

        assert_eq!(first, second);
        assert_eq!(scene.agents(), before.agents());
        assert_eq!(scene.zoom(), before.zoom());
        assert_eq!(scene.tick(), before.tick());
    }

    #[test]
    fn marker_is_drawn_at_zoomed_and_panned_position() {
        let mut scene = scene_with_agent_at(50.0, 40.0);
        scene.set_zoom(2.0);
        scene.set_pan(Vec2 { x: 10.0, y: 5.0 });
        let mut buf = frame();
        render_scene(&mut buf, VIEWPORT, &scene);

        assert_eq!(pixel(&buf, 110, 85), marker_color(0));
        assert_eq!(pixel(&buf, 50, 40), BACKGROUND_COLOR);
    }

    #[test]
    fn marker_color_follows_list_position_not_id() {
        let mut scene = SceneState::new();
        scene.set_show_grid(false);
        scene.set_show_ids(false);
        scene.replace_agents(vec![
            Agent {
                id: 99,
                position: Vec2 { x: 40.0, y: 40.0 },
            },
            Agent {
                id: 1,
                position: Vec2 { x: 120.0, y: 40.0 },
            },
        ]);
        let mut buf = frame();
        render_scene(&mut buf, VIEWPORT, &scene);
        assert_eq!(pixel(&buf, 40, 40), PALETTE[0]);
        assert_eq!(pixel(&buf, 120, 40), PALETTE[1]);
        assert_eq!(marker_color(17), PALETTE[1]);
    }

    #[test]
    fn cleared_agents_draw_no_markers() {
        let mut scene = scene_with_agent_at(100.0, 100.0);
        scene.clear_agents();
        let mut buf = frame();
        render_scene(&mut buf, VIEWPORT, &scene);
        assert!(buf.chunks_exact(4).all(|px| px == BACKGROUND_COLOR));
    }

    #[test]
    fn id_label_darkens_marker_center() {
        let mut scene = scene_with_agent_at(100.0, 100.0);
        scene.set_show_ids(true);
        let mut buf = frame();
        render_scene(&mut buf, VIEWPORT, &scene);

        let label_pixels = (90..110)
            .flat_map(|y| (90..110).map(move |x| (x, y)))
            .filter(|(x, y)| {
                let px = pixel(&buf, *x, *y);
                px != marker_color(0) && px != BACKGROUND_COLOR && px[0] < 100
            })
            .count();
        assert!(label_pixels > 0);
    }

    #[test]
    fn grid_overlay_lightens_line_pixels() {
        let mut scene = SceneState::new();
        scene.set_show_grid(true);
        let mut buf = frame();
        render_scene(&mut buf, VIEWPORT, &scene);

        // 320 % 40 == 0, so the first vertical line sits at x = 0.
        let on_line = pixel(&buf, 0, 7);
        let off_line = pixel(&buf, 7, 7);
        assert_eq!(off_line, BACKGROUND_COLOR);
        assert!(on_line[0] > BACKGROUND_COLOR[0]);
    }

    #[test]
    fn environment_is_centered_and_ignores_pan() {
        let mut scene = SceneState::new();
        scene.set_show_grid(false);
        scene.set_environment(EnvironmentBitmap::filled(2, 2, [200, 10, 10, 255]), "custom");
        scene.set_pan(Vec2 { x: 300.0, y: 300.0 });
        scene.set_zoom(0.5);
        let mut buf = frame();
        render_scene(&mut buf, VIEWPORT, &scene);

        // Fit scale is 90, halved by zoom: a 90 px square centered on (160, 90).
        assert_eq!(pixel(&buf, 160, 90), [200, 10, 10, 255]);
        assert_eq!(pixel(&buf, 114, 44), BACKGROUND_COLOR);
        assert_eq!(pixel(&buf, 116, 46), [200, 10, 10, 255]);
        assert_eq!(pixel(&buf, 205, 90), BACKGROUND_COLOR);
    }
}
