//! Equirectangular world projection used by the SVG map.
//!
//! The world image is 1024x512 pixels: x grows east from -180°, y grows
//! south from +90°. Map zoom levels are translated into a CSS scale relative
//! to the world view.

use crate::models::LatLng;
use crate::viewport::{CLOSE_UP_ZOOM, WORLD_ZOOM};

pub const WORLD_WIDTH_PX: f64 = 1024.0;
pub const WORLD_HEIGHT_PX: f64 = 512.0;

pub const PX_PER_DEGREE: f64 = WORLD_WIDTH_PX / 360.0;

/// Spacing of the graticule lines drawn over the basemap.
pub const GRATICULE_STEP_DEG: f64 = 30.0;

pub const MIN_SCALE: f64 = 1.0;
pub const MAX_SCALE: f64 = (1u32 << (CLOSE_UP_ZOOM - WORLD_ZOOM)) as f64;

/// Convert a coordinate to world-image pixels.
pub fn lat_lng_to_px(pos: LatLng) -> (f64, f64) {
    (
        (pos.lng + 180.0) * PX_PER_DEGREE,
        (90.0 - pos.lat) * PX_PER_DEGREE,
    )
}

/// Convert world-image pixels back to a coordinate.
pub fn px_to_lat_lng(px_x: f64, px_y: f64) -> LatLng {
    LatLng::new(90.0 - px_y / PX_PER_DEGREE, px_x / PX_PER_DEGREE - 180.0)
}

/// Pixel X of a meridian.
pub fn meridian_px(lng: f64) -> f64 {
    (lng + 180.0) * PX_PER_DEGREE
}

/// Pixel Y of a parallel.
pub fn parallel_px(lat: f64) -> f64 {
    (90.0 - lat) * PX_PER_DEGREE
}

/// CSS scale for a map zoom level. Each level doubles the scale.
pub fn zoom_scale(zoom: u8) -> f64 {
    let levels = i32::from(zoom) - i32::from(WORLD_ZOOM);
    2f64.powi(levels).clamp(MIN_SCALE, MAX_SCALE)
}

/// Nearest map zoom level for a CSS scale.
pub fn scale_to_zoom(scale: f64) -> u8 {
    let levels = scale.clamp(MIN_SCALE, MAX_SCALE).log2().round() as u8;
    WORLD_ZOOM + levels
}

/// Pan offsets that put `center` in the middle of a container.
///
/// The world image is rendered `width: 100%`, so one world pixel is
/// `container_w / WORLD_WIDTH_PX` CSS pixels before scaling.
pub fn pan_for_center(center: LatLng, scale: f64, container_w: f64, container_h: f64) -> (f64, f64) {
    let k = container_w / WORLD_WIDTH_PX;
    let (x, y) = lat_lng_to_px(center);
    (
        container_w / 2.0 - x * k * scale,
        container_h / 2.0 - y * k * scale,
    )
}

/// Coordinate shown in the middle of a container for the given pan/scale.
pub fn center_for_pan(pan_x: f64, pan_y: f64, scale: f64, container_w: f64, container_h: f64) -> LatLng {
    let k = container_w / WORLD_WIDTH_PX;
    let x = (container_w / 2.0 - pan_x) / (k * scale);
    let y = (container_h / 2.0 - pan_y) / (k * scale);
    px_to_lat_lng(x, y)
}

/// Human-readable coordinate, e.g. "43.6532° N, 79.3832° W".
pub fn format_coordinate(pos: LatLng) -> String {
    let ns = if pos.lat < 0.0 { 'S' } else { 'N' };
    let ew = if pos.lng < 0.0 { 'W' } else { 'E' };
    format!("{:.4}° {}, {:.4}° {}", pos.lat.abs(), ns, pos.lng.abs(), ew)
}
