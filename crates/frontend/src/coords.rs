use member_map_shared::models::LatLng;
use member_map_shared::projection;

/// Convert client (viewport) coordinates to container-relative pixel coordinates.
#[cfg(test)]
pub fn client_to_container(
    client_x: f64,
    client_y: f64,
    rect_left: f64,
    rect_top: f64,
) -> (f64, f64) {
    (client_x - rect_left, client_y - rect_top)
}

/// Pure function: convert container-relative coordinates to world-image pixels,
/// undoing the zoom/pan CSS transform.
///
/// Only `container_w` is needed because the world renders with `width:100%; height:auto`,
/// so both axes share the same scale factor (`WORLD_WIDTH_PX / container_w`).
pub fn container_to_world_px(
    container_x: f64,
    container_y: f64,
    container_w: f64,
    scale: f64,
    pan_x: f64,
    pan_y: f64,
) -> Option<(f64, f64)> {
    if container_w <= 0.0 || scale <= 0.0 {
        return None;
    }

    // Undo CSS transform: translate(pan_x, pan_y) scale(scale)
    let rendered_x = (container_x - pan_x) / scale;
    let rendered_y = (container_y - pan_y) / scale;

    let k = projection::WORLD_WIDTH_PX / container_w;
    let px = (rendered_x * k).clamp(0.0, projection::WORLD_WIDTH_PX);
    let py = (rendered_y * k).clamp(0.0, projection::WORLD_HEIGHT_PX);

    Some((px, py))
}

/// Inverse of [`container_to_world_px`]: where a world pixel ends up inside the container.
pub fn world_px_to_container(
    px_x: f64,
    px_y: f64,
    container_w: f64,
    scale: f64,
    pan_x: f64,
    pan_y: f64,
) -> (f64, f64) {
    let k = container_w / projection::WORLD_WIDTH_PX;
    (px_x * k * scale + pan_x, px_y * k * scale + pan_y)
}

/// Get container-relative coordinates using web_sys, then convert to a
/// world-image pixel position.
pub fn client_to_world_px(
    client_x: f64,
    client_y: f64,
    container_id: &str,
    scale: f64,
    pan_x: f64,
    pan_y: f64,
) -> Option<(f64, f64)> {
    let document = web_sys::window()?.document()?;
    let element = document.get_element_by_id(container_id)?;
    let rect = element.get_bounding_client_rect();

    let container_x = client_x - rect.left();
    let container_y = client_y - rect.top();

    container_to_world_px(container_x, container_y, rect.width(), scale, pan_x, pan_y)
}

/// Coordinate under the cursor, formatted for the readout.
pub fn format_world_px(px_x: f64, px_y: f64) -> String {
    projection::format_coordinate(projection::px_to_lat_lng(px_x, px_y))
}

pub fn lat_lng_to_world_px(pos: LatLng) -> (f64, f64) {
    projection::lat_lng_to_px(pos)
}
