use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::app::raster::{blend_pixel, fill_rect, horizontal_line, vertical_line};

use super::EnvironmentBitmap;

const DEMO_GRID_SEED: u64 = 0x0a0f_1c1d_2740;
const DEMO_GRID_FLOOR: [u8; 4] = [10, 15, 28, 255];
const DEMO_GRID_BLOCK: [u8; 4] = [29, 39, 64, 255];
const DEMO_GRID_LINE: [u8; 4] = [255, 255, 255, 15];
const DEMO_GRID_BLOCK_COUNT: usize = 10;
const DEMO_GRID_STEP: usize = 40;

const WAREHOUSE_FLOOR: [u8; 4] = [11, 19, 38, 255];
const WAREHOUSE_SHELF: [u8; 4] = [41, 54, 90, 255];
const WAREHOUSE_AISLE: [u8; 4] = [124, 222, 255, 89];
const SHELF_ROWS: i32 = 6;
const SHELF_COLUMNS: i32 = 8;
const SHELF_MARGIN: i32 = 60;
const SHELF_HEIGHT: i32 = 24;
const SHELF_WIDTH: i32 = 120;
const SHELF_FIRST_X: i32 = 80;
const SHELF_PITCH_X: i32 = 160;
const AISLE_COUNT: i32 = 4;
const AISLE_FIRST_X: i32 = 160;
const AISLE_PITCH_X: i32 = 320;
const AISLE_INSET_Y: i32 = 40;
const AISLE_DASH_ON: i32 = 6;
const AISLE_DASH_OFF: i32 = 10;

pub(super) fn demo_grid(width: u32, height: u32) -> EnvironmentBitmap {
    let mut bitmap = EnvironmentBitmap::filled(width, height, DEMO_GRID_FLOOR);
    let (width, height) = (bitmap.width(), bitmap.height());
    let frame = bitmap.rgba_mut();
    let mut rng = StdRng::seed_from_u64(DEMO_GRID_SEED);

    for _ in 0..DEMO_GRID_BLOCK_COUNT {
        let x = rng.gen::<f32>() * width as f32 * 0.8;
        let y = rng.gen::<f32>() * height as f32 * 0.8;
        let block_width = 80.0 + rng.gen::<f32>() * 140.0;
        let block_height = 40.0 + rng.gen::<f32>() * 120.0;
        fill_rect(
            frame,
            width,
            height,
            x as i32,
            y as i32,
            block_width as i32,
            block_height as i32,
            DEMO_GRID_BLOCK,
        );
    }

    for x in (0..width as i32).step_by(DEMO_GRID_STEP) {
        vertical_line(frame, width, height, x, DEMO_GRID_LINE);
    }
    for y in (0..height as i32).step_by(DEMO_GRID_STEP) {
        horizontal_line(frame, width, height, y, DEMO_GRID_LINE);
    }

    bitmap
}

pub(super) fn warehouse(width: u32, height: u32) -> EnvironmentBitmap {
    let mut bitmap = EnvironmentBitmap::filled(width, height, WAREHOUSE_FLOOR);
    let (width, height) = (bitmap.width(), bitmap.height());
    let frame = bitmap.rgba_mut();

    let gap = (height as f32 - (SHELF_MARGIN * 2) as f32 - (SHELF_ROWS * SHELF_HEIGHT) as f32)
        / (SHELF_ROWS - 1) as f32;
    for row in 0..SHELF_ROWS {
        let y = (SHELF_MARGIN as f32 + row as f32 * (SHELF_HEIGHT as f32 + gap)).round() as i32;
        for column in 0..SHELF_COLUMNS {
            let x = SHELF_FIRST_X + column * SHELF_PITCH_X;
            fill_rect(
                frame,
                width,
                height,
                x,
                y,
                SHELF_WIDTH,
                SHELF_HEIGHT,
                WAREHOUSE_SHELF,
            );
        }
    }

    let aisle_end = height as i32 - AISLE_INSET_Y;
    for aisle in 0..AISLE_COUNT {
        let x = AISLE_FIRST_X + aisle * AISLE_PITCH_X;
        let mut y = AISLE_INSET_Y;
        while y < aisle_end {
            let dash_end = (y + AISLE_DASH_ON).min(aisle_end);
            for py in y..dash_end {
                // 2 px line centered on x.
                blend_pixel(frame, width, height, x - 1, py, WAREHOUSE_AISLE);
                blend_pixel(frame, width, height, x, py, WAREHOUSE_AISLE);
            }
            y += AISLE_DASH_ON + AISLE_DASH_OFF;
        }
    }

    bitmap
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warehouse_places_first_shelf_at_margin() {
        let bitmap = warehouse(1600, 900);
        assert_eq!(bitmap.pixel(80, 60), Some(WAREHOUSE_SHELF));
        assert_eq!(bitmap.pixel(199, 83), Some(WAREHOUSE_SHELF));
        assert_eq!(bitmap.pixel(10, 10), Some(WAREHOUSE_FLOOR));
    }

    #[test]
    fn warehouse_aisles_are_dashed() {
        let bitmap = warehouse(1600, 900);
        let on = bitmap.pixel(160, 41).expect("dash pixel");
        let off = bitmap.pixel(160, 48).expect("gap pixel");
        assert_ne!(on, WAREHOUSE_FLOOR);
        assert_eq!(off, WAREHOUSE_FLOOR);
    }

    #[test]
    fn demo_grid_bakes_grid_lines() {
        let bitmap = demo_grid(1600, 900);
        let floor_or_block = bitmap.pixel(1599, 899).expect("corner");
        let line = bitmap.pixel(1560, 899).expect("grid column");
        assert_ne!(floor_or_block, line);
    }

    #[test]
    fn generators_tolerate_tiny_sizes() {
        let tiny = demo_grid(1, 1);
        assert_eq!((tiny.width(), tiny.height()), (1, 1));
        let tiny = warehouse(3, 2);
        assert_eq!((tiny.width(), tiny.height()), (3, 2));
    }
}
