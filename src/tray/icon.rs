//! Tray icon artwork, drawn at startup.
//!
//! A rounded tile split into a wide and a narrow pane, the narrow one
//! highlighted.

use image::{Rgba, RgbaImage};

pub const ICON_SIZE: u32 = 32;

const BACKGROUND: Rgba<u8> = Rgba([0x2b, 0x5c, 0xd6, 0xff]);
const PANE: Rgba<u8> = Rgba([0xf2, 0xf4, 0xf8, 0xff]);
const NARROW_PANE: Rgba<u8> = Rgba([0xff, 0xc8, 0x3d, 0xff]);
const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

const CORNER_RADIUS: u32 = 6;
const MARGIN: u32 = 6;
const GAP: u32 = 2;

pub fn render() -> RgbaImage {
    let size = ICON_SIZE;
    let inner = size - 2 * MARGIN;
    let wide = (inner - GAP) * 3 / 5;

    RgbaImage::from_fn(size, size, |x, y| {
        if !inside_rounded_square(x, y, size, CORNER_RADIUS) {
            return TRANSPARENT;
        }

        let in_rows = (MARGIN..size - MARGIN).contains(&y);
        if in_rows && (MARGIN..MARGIN + wide).contains(&x) {
            PANE
        } else if in_rows && (MARGIN + wide + GAP..size - MARGIN).contains(&x) {
            NARROW_PANE
        } else {
            BACKGROUND
        }
    })
}

fn inside_rounded_square(x: u32, y: u32, size: u32, radius: u32) -> bool {
    // Distance from the nearest corner circle centre, if in a corner region
    let cx = if x < radius {
        radius - x
    } else if x >= size - radius {
        x + 1 + radius - size
    } else {
        return true;
    };
    let cy = if y < radius {
        radius - y
    } else if y >= size - radius {
        y + 1 + radius - size
    } else {
        return true;
    };

    cx * cx + cy * cy <= radius * radius
}
