use crate::environment::EnvironmentBitmap;

pub(crate) fn clear(frame: &mut [u8], color: [u8; 4]) {
    for chunk in frame.chunks_exact_mut(4) {
        chunk.copy_from_slice(&color);
    }
}

pub(crate) fn blend_pixel(
    frame: &mut [u8],
    width: u32,
    height: u32,
    x: i32,
    y: i32,
    color: [u8; 4],
) {
    if x < 0 || y < 0 || x >= width as i32 || y >= height as i32 {
        return;
    }
    let alpha = color[3];
    if alpha == 0 {
        return;
    }
    let offset = (y as usize * width as usize + x as usize) * 4;
    let Some(dst) = frame.get_mut(offset..offset + 4) else {
        return;
    };
    if alpha == 255 {
        dst.copy_from_slice(&color);
        return;
    }

    let src_alpha = u32::from(alpha);
    let inv_alpha = 255 - src_alpha;
    for channel in 0..3 {
        let blended =
            u32::from(color[channel]) * src_alpha + u32::from(dst[channel]) * inv_alpha + 127;
        dst[channel] = (blended / 255) as u8;
    }
    dst[3] = (src_alpha + (u32::from(dst[3]) * inv_alpha + 127) / 255).min(255) as u8;
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn fill_rect(
    frame: &mut [u8],
    width: u32,
    height: u32,
    x: i32,
    y: i32,
    rect_width: i32,
    rect_height: i32,
    color: [u8; 4],
) {
    let start_x = x.max(0);
    let start_y = y.max(0);
    let end_x = x.saturating_add(rect_width).min(width as i32);
    let end_y = y.saturating_add(rect_height).min(height as i32);
    for py in start_y..end_y {
        for px in start_x..end_x {
            blend_pixel(frame, width, height, px, py, color);
        }
    }
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn stroke_rect(
    frame: &mut [u8],
    width: u32,
    height: u32,
    x: i32,
    y: i32,
    rect_width: i32,
    rect_height: i32,
    color: [u8; 4],
) {
    if rect_width <= 1 || rect_height <= 1 {
        return;
    }
    fill_rect(frame, width, height, x, y, rect_width, 1, color);
    fill_rect(frame, width, height, x, y + rect_height - 1, rect_width, 1, color);
    fill_rect(frame, width, height, x, y + 1, 1, rect_height - 2, color);
    fill_rect(frame, width, height, x + rect_width - 1, y + 1, 1, rect_height - 2, color);
}

pub(crate) fn vertical_line(frame: &mut [u8], width: u32, height: u32, x: i32, color: [u8; 4]) {
    for y in 0..height as i32 {
        blend_pixel(frame, width, height, x, y, color);
    }
}

pub(crate) fn horizontal_line(frame: &mut [u8], width: u32, height: u32, y: i32, color: [u8; 4]) {
    for x in 0..width as i32 {
        blend_pixel(frame, width, height, x, y, color);
    }
}

pub(crate) fn fill_circle(
    frame: &mut [u8],
    width: u32,
    height: u32,
    center: (f32, f32),
    radius: f32,
    color: [u8; 4],
) {
    if !(radius > 0.0) {
        return;
    }
    for_each_pixel_in_ring(width, height, center, 0.0, radius, |x, y| {
        blend_pixel(frame, width, height, x, y, color);
    });
}

pub(crate) fn stroke_circle(
    frame: &mut [u8],
    width: u32,
    height: u32,
    center: (f32, f32),
    radius: f32,
    line_width: f32,
    color: [u8; 4],
) {
    if !(radius > 0.0) || !(line_width > 0.0) {
        return;
    }
    let half = line_width * 0.5;
    let inner = (radius - half).max(0.0);
    for_each_pixel_in_ring(width, height, center, inner, radius + half, |x, y| {
        blend_pixel(frame, width, height, x, y, color);
    });
}

fn for_each_pixel_in_ring(
    width: u32,
    height: u32,
    (cx, cy): (f32, f32),
    inner: f32,
    outer: f32,
    mut visit: impl FnMut(i32, i32),
) {
    if !cx.is_finite() || !cy.is_finite() {
        return;
    }
    let min_x = ((cx - outer).floor() as i32).max(0);
    let max_x = ((cx + outer).ceil() as i32).min(width as i32 - 1);
    let min_y = ((cy - outer).floor() as i32).max(0);
    let max_y = ((cy + outer).ceil() as i32).min(height as i32 - 1);
    let inner_sq = inner * inner;
    let outer_sq = outer * outer;

    for y in min_y..=max_y {
        let dy = y as f32 + 0.5 - cy;
        for x in min_x..=max_x {
            let dx = x as f32 + 0.5 - cx;
            let dist_sq = dx * dx + dy * dy;
            let inside_inner = inner > 0.0 && dist_sq < inner_sq;
            if dist_sq <= outer_sq && !inside_inner {
                visit(x, y);
            }
        }
    }
}

pub(crate) fn draw_bitmap_scaled(
    frame: &mut [u8],
    width: u32,
    height: u32,
    bitmap: &EnvironmentBitmap,
    (left, top): (f32, f32),
    scale: f32,
) {
    if !(scale > 0.0) || !scale.is_finite() || width == 0 || height == 0 {
        return;
    }
    let dst_width = bitmap.width() as f32 * scale;
    let dst_height = bitmap.height() as f32 * scale;
    let start_x = (left.floor() as i32).max(0);
    let end_x = ((left + dst_width).ceil() as i32).min(width as i32);
    let start_y = (top.floor() as i32).max(0);
    let end_y = ((top + dst_height).ceil() as i32).min(height as i32);
    let inv_scale = scale.recip();

    for py in start_y..end_y {
        let src_y = ((py as f32 + 0.5 - top) * inv_scale).floor();
        if src_y < 0.0 || src_y >= bitmap.height() as f32 {
            continue;
        }
        for px in start_x..end_x {
            let src_x = ((px as f32 + 0.5 - left) * inv_scale).floor();
            if src_x < 0.0 || src_x >= bitmap.width() as f32 {
                continue;
            }
            if let Some(color) = bitmap.pixel(src_x as u32, src_y as u32) {
                blend_pixel(frame, width, height, px, py, color);
            }
        }
    }
}
