use dioxus::html::geometry::WheelDelta;
use dioxus::html::input_data::MouseButton;
use dioxus::prelude::*;
use member_map_shared::models::PlacedMarker;
use member_map_shared::projection;
use member_map_shared::selection::SelectionState;
use member_map_shared::viewport::{ApplyOutcome, Viewport, ViewportApplier, WORLD_VIEW};

use crate::components::marker_popup::MarkerPopup;
use crate::coords;

const MAP_CONTAINER_ID: &str = "member-map-container";

/// Drag threshold in pixels — movement below this is treated as a click.
const DRAG_THRESHOLD: f64 = 3.0;

/// Touch drag threshold — larger than mouse because touch is less precise.
const TOUCH_DRAG_THRESHOLD: f64 = 8.0;

const ZOOM_STEP: f64 = 1.25;

/// Marker hit radius in screen-sized units, scaled like the marker itself.
const HIT_RADIUS: f64 = 10.0;

const MARKER_COLOR: &str = "#2563eb";
const SELECTED_COLOR: &str = "#dc2626";
const LEG_STROKE: &str = "rgba(37,99,235,0.6)";

/// Something the map could not render. Reported to the owning boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum MapFault {
    ContainerMissing,
    InvalidMarker { profile_id: String },
}

impl std::fmt::Display for MapFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MapFault::ContainerMissing => write!(f, "map container is not in the page"),
            MapFault::InvalidMarker { profile_id } => {
                write!(f, "profile {profile_id} has no drawable position")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// DOM helpers
// ---------------------------------------------------------------------------

fn container_rect() -> Option<web_sys::DomRect> {
    let document = web_sys::window()?.document()?;
    let element = document.get_element_by_id(MAP_CONTAINER_ID)?;
    Some(element.get_bounding_client_rect())
}

// ---------------------------------------------------------------------------
// Zoom / pan math (pure functions, easily testable)
// ---------------------------------------------------------------------------

/// Compute new pan offsets so that `cursor` stays over the same content point
/// when zooming from `old_scale` to `new_scale`.
fn zoom_pan_at_cursor(
    cursor_x: f64,
    cursor_y: f64,
    old_scale: f64,
    new_scale: f64,
    old_pan_x: f64,
    old_pan_y: f64,
) -> (f64, f64) {
    let content_x = (cursor_x - old_pan_x) / old_scale;
    let content_y = (cursor_y - old_pan_y) / old_scale;
    (
        cursor_x - content_x * new_scale,
        cursor_y - content_y * new_scale,
    )
}

/// Clamp pan values so the world can't be dragged off-screen.
///
/// The world is rendered at `width: 100%`, so its height is half the
/// container width. When the world is smaller than the container on an
/// axis it is pinned to the top-left on that axis.
fn clamp_pan(pan_x: f64, pan_y: f64, scale: f64, container_w: f64, container_h: f64) -> (f64, f64) {
    let content_w = container_w * scale;
    let content_h =
        container_w * (projection::WORLD_HEIGHT_PX / projection::WORLD_WIDTH_PX) * scale;
    let min_pan_x = -(content_w - container_w).max(0.0);
    let min_pan_y = -(content_h - container_h).max(0.0);
    (pan_x.clamp(min_pan_x, 0.0), pan_y.clamp(min_pan_y, 0.0))
}

fn clamp_pan_to_container(pan_x: f64, pan_y: f64, scale: f64) -> (f64, f64) {
    match container_rect() {
        Some(rect) => clamp_pan(pan_x, pan_y, scale, rect.width(), rect.height()),
        None => (pan_x, pan_y),
    }
}

/// Pan/scale that shows `viewport`, clamped to the container.
fn pan_for_viewport(viewport: Viewport, container_w: f64, container_h: f64) -> (f64, f64, f64) {
    let scale = projection::zoom_scale(viewport.zoom);
    let (px, py) = projection::pan_for_center(viewport.center, scale, container_w, container_h);
    let (px, py) = clamp_pan(px, py, scale, container_w, container_h);
    (scale, px, py)
}

/// Convert a wheel delta (pixels / lines / pages) to a uniform pixel-like value.
fn wheel_delta_y(delta: WheelDelta) -> f64 {
    match delta {
        WheelDelta::Pixels(d) => d.y,
        WheelDelta::Lines(d) => d.y * 40.0,
        WheelDelta::Pages(d) => d.y * 400.0,
    }
}

fn point_distance(a: (f64, f64), b: (f64, f64)) -> f64 {
    let dx = a.0 - b.0;
    let dy = a.1 - b.1;
    (dx * dx + dy * dy).sqrt()
}

/// Find the index of the nearest position within `threshold`.
fn find_nearest(positions: &[(f64, f64)], click: (f64, f64), threshold: f64) -> Option<usize> {
    let mut best_idx = None;
    let mut best_dist = threshold;
    for (i, pos) in positions.iter().enumerate() {
        let dist = point_distance(*pos, click);
        if dist < best_dist {
            best_dist = dist;
            best_idx = Some(i);
        }
    }
    best_idx
}

/// World-pixel position each marker is drawn at.
fn marker_positions(markers: &[PlacedMarker]) -> Vec<(f64, f64)> {
    markers
        .iter()
        .map(|m| coords::lat_lng_to_world_px(m.display_position()))
        .collect()
}

/// Popup to show after a selection change, or `None` to leave it as is.
///
/// Only a revision the applier has not seen yet opens or closes the popup,
/// so a re-sent selection never reopens one the user closed.
fn popup_for_request(applier: &ViewportApplier, state: &SelectionState) -> Option<Option<String>> {
    if applier.last_revision() == Some(state.revision()) {
        return None;
    }
    Some(state.selected().map(|p| p.id.clone()))
}

// ---------------------------------------------------------------------------
// SVG builder
// ---------------------------------------------------------------------------

/// Reference container width (desktop map panel) used to normalize marker sizes.
const REFERENCE_WIDTH: f64 = 960.0;

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Build the overlay SVG content in world-pixel space (1024×512).
fn build_svg_content(
    markers: &[PlacedMarker],
    selected_id: Option<&str>,
    scale: f64,
    container_width: f64,
) -> Result<String, MapFault> {
    let mut svg = String::with_capacity(4096 + markers.len() * 256);

    // Markers, strokes and labels keep a constant on-screen size at any
    // zoom; small containers get a boost so markers stay tappable.
    let mobile_boost = (REFERENCE_WIDTH / container_width).max(1.0);
    let s = mobile_boost / scale;

    build_graticule(&mut svg, s);
    build_graticule_labels(&mut svg, s);
    build_markers(&mut svg, markers, selected_id, s)?;

    Ok(svg)
}

fn build_graticule(svg: &mut String, s: f64) {
    let sw = 0.8 * s;
    let step = projection::GRATICULE_STEP_DEG;
    let mut lng = -180.0;
    while lng <= 180.0 {
        let x = projection::meridian_px(lng);
        svg.push_str(&format!(
            r#"<line x1="{x}" y1="0" x2="{x}" y2="{}" stroke="rgba(255,255,255,0.25)" stroke-width="{sw}"/>"#,
            projection::WORLD_HEIGHT_PX
        ));
        lng += step;
    }
    let mut lat = -90.0;
    while lat <= 90.0 {
        let y = projection::parallel_px(lat);
        let (stroke, width) = if lat == 0.0 {
            ("rgba(255,255,255,0.5)", 1.4 * s)
        } else {
            ("rgba(255,255,255,0.25)", sw)
        };
        svg.push_str(&format!(
            r#"<line x1="0" y1="{y}" x2="{}" y2="{y}" stroke="{stroke}" stroke-width="{width}"/>"#,
            projection::WORLD_WIDTH_PX
        ));
        lat += step;
    }
}

fn build_graticule_labels(svg: &mut String, s: f64) {
    let fs = 9.0 * s;
    let step = projection::GRATICULE_STEP_DEG;
    let mut lat = -60.0;
    while lat <= 60.0 {
        let y = projection::parallel_px(lat) - 2.0 * s;
        let label = match lat {
            l if l > 0.0 => format!("{l}°N"),
            l if l < 0.0 => format!("{}°S", -l),
            _ => "0°".to_string(),
        };
        svg.push_str(&format!(
            r#"<text x="{}" y="{y}" fill="rgba(255,255,255,0.6)" font-size="{fs}" font-family="sans-serif">{label}</text>"#,
            3.0 * s
        ));
        lat += step;
    }
}

fn push_pin(svg: &mut String, x: f64, y: f64, name: &str, color: &str, s: f64) {
    let r = 6.0 * s;
    let sw = 2.0 * s;
    svg.push_str(&format!(
        r##"<g role="img"><title>{}</title><circle cx="{x}" cy="{y}" r="{r}" fill="{color}" stroke="white" stroke-width="{sw}"/></g>"##,
        escape_xml(name)
    ));
}

fn build_markers(
    svg: &mut String,
    markers: &[PlacedMarker],
    selected_id: Option<&str>,
    s: f64,
) -> Result<(), MapFault> {
    let mut selected = None;

    for marker in markers {
        let pos = marker.display_position();
        if !pos.lat.is_finite() || !pos.lng.is_finite() {
            return Err(MapFault::InvalidMarker {
                profile_id: marker.profile.id.clone(),
            });
        }
        let (x, y) = coords::lat_lng_to_world_px(pos);

        // Spread markers get a leg back to the shared location
        if marker.is_offset() {
            let (ax, ay) = coords::lat_lng_to_world_px(marker.profile.position());
            let sw = 1.0 * s;
            svg.push_str(&format!(
                r#"<line x1="{ax}" y1="{ay}" x2="{x}" y2="{y}" stroke="{LEG_STROKE}" stroke-width="{sw}"/>"#
            ));
        }

        if selected_id == Some(marker.profile.id.as_str()) {
            selected = Some((x, y, marker.profile.name.as_str()));
            continue;
        }
        push_pin(svg, x, y, &marker.profile.name, MARKER_COLOR, s);
    }

    // Selected marker last so it sits on top
    if let Some((x, y, name)) = selected {
        push_pin(svg, x, y, name, SELECTED_COLOR, 1.3 * s);
        build_selection_ring(svg, x, y, s);
    }
    Ok(())
}

/// Emit an animated dashed selection ring around a marker.
fn build_selection_ring(svg: &mut String, cx: f64, cy: f64, s: f64) {
    let r = 14.0 * s;
    let sw = 2.0 * s;
    let da1 = 4.0 * s;
    let da2 = 3.0 * s;
    svg.push_str(&format!(
        r##"<circle cx="{cx}" cy="{cy}" r="{r}" fill="none" stroke="{SELECTED_COLOR}" stroke-width="{sw}" stroke-dasharray="{da1} {da2}" opacity="0.9"><animate attributeName="opacity" values="0.5;1;0.5" dur="1.2s" repeatCount="indefinite"/></circle>"##
    ));
}

// ---------------------------------------------------------------------------
// Component
// ---------------------------------------------------------------------------

#[component]
pub fn MapView(
    markers: ReadSignal<Vec<PlacedMarker>>,
    selection: ReadSignal<SelectionState>,
    on_fault: EventHandler<MapFault>,
    on_mounted: EventHandler<()>,
    on_unmounted: EventHandler<()>,
) -> Element {
    // Zoom / pan state (local — resets when the boundary re-creates the map via `key`)
    let mut scale = use_signal(|| projection::MIN_SCALE);
    let mut pan_x = use_signal(|| 0.0_f64);
    let mut pan_y = use_signal(|| 0.0_f64);
    let mut applier = use_signal(ViewportApplier::new);

    // Profile whose popup is open
    let mut popup = use_signal(|| None::<String>);
    let mut hover_px = use_signal(|| None::<(f64, f64)>);

    use_effect(move || on_mounted.call(()));
    use_drop(move || on_unmounted.call(()));

    // Follow viewport requests from the selection, newest revision only
    use_effect(move || {
        let state = selection.read();
        let request = state.viewport_request();
        let popup_update = popup_for_request(&applier.peek(), &state);
        let outcome = applier.write().apply(&request);
        if let ApplyOutcome::Moved(viewport) = outcome {
            match container_rect() {
                Some(rect) => {
                    let (s, px, py) = pan_for_viewport(viewport, rect.width(), rect.height());
                    scale.set(s);
                    pan_x.set(px);
                    pan_y.set(py);
                }
                None => on_fault.call(MapFault::ContainerMissing),
            }
        }
        if let Some(open) = popup_update {
            popup.set(open);
        }
    });

    // Remember manual pan/zoom so re-selecting the same profile moves back
    let mut record_user_move = move || {
        let Some(rect) = container_rect() else { return };
        let s = *scale.read();
        let center = projection::center_for_pan(
            *pan_x.read(),
            *pan_y.read(),
            s,
            rect.width(),
            rect.height(),
        );
        applier.write().user_moved(Viewport {
            center,
            zoom: projection::scale_to_zoom(s),
        });
    };

    let mut zoom_by = move |factor: f64, cx: f64, cy: f64| {
        let Some(rect) = container_rect() else { return };
        let old_s = *scale.read();
        let new_s = (old_s * factor).clamp(projection::MIN_SCALE, projection::MAX_SCALE);
        if (new_s - old_s).abs() < 1e-9 {
            return;
        }
        let (new_px, new_py) = zoom_pan_at_cursor(cx, cy, old_s, new_s, *pan_x.read(), *pan_y.read());
        let (px, py) = clamp_pan(new_px, new_py, new_s, rect.width(), rect.height());
        scale.set(new_s);
        pan_x.set(px);
        pan_y.set(py);
        record_user_move();
    };

    let mut reset_view = move || {
        let Some(rect) = container_rect() else { return };
        let (s, px, py) = pan_for_viewport(WORLD_VIEW, rect.width(), rect.height());
        scale.set(s);
        pan_x.set(px);
        pan_y.set(py);
        record_user_move();
    };

    let mut open_popup_at = move |client_x: f64, client_y: f64| {
        let Some(click) = coords::client_to_world_px(
            client_x,
            client_y,
            MAP_CONTAINER_ID,
            *scale.read(),
            *pan_x.read(),
            *pan_y.read(),
        ) else {
            return;
        };
        let markers = markers.read();
        let cw = container_rect().map(|r| r.width()).unwrap_or(REFERENCE_WIDTH);
        let threshold = HIT_RADIUS * (REFERENCE_WIDTH / cw).max(1.0) / *scale.read();
        let hit = find_nearest(&marker_positions(&markers), click, threshold);
        popup.set(hit.map(|i| markers[i].profile.id.clone()));
    };

    // Drag state (mouse)
    let mut is_dragging = use_signal(|| false);
    let mut did_drag = use_signal(|| false);
    let mut drag_start_x = use_signal(|| 0.0_f64);
    let mut drag_start_y = use_signal(|| 0.0_f64);
    let mut drag_start_pan_x = use_signal(|| 0.0_f64);
    let mut drag_start_pan_y = use_signal(|| 0.0_f64);

    // Touch state
    let mut touch_start_pos = use_signal(|| None::<(f64, f64)>);
    let mut touch_did_pan = use_signal(|| false);
    let mut touch_start_pan_x = use_signal(|| 0.0_f64);
    let mut touch_start_pan_y = use_signal(|| 0.0_f64);
    let mut is_pinching = use_signal(|| false);
    let mut pinch_start_distance = use_signal(|| 0.0_f64);
    let mut pinch_start_scale = use_signal(|| 1.0_f64);
    let mut pinch_midpoint = use_signal(|| (0.0_f64, 0.0_f64));
    let mut pinch_start_pan_x = use_signal(|| 0.0_f64);
    let mut pinch_start_pan_y = use_signal(|| 0.0_f64);

    // Memoize SVG generation; pan is read outside so dragging doesn't rebuild it
    let svg_html = use_memo(move || {
        let markers = markers.read();
        let state = selection.read();
        let selected_id = state.selected().map(|p| p.id.as_str());
        let cur_scale = *scale.read();
        let cw = container_rect().map(|r| r.width()).unwrap_or(REFERENCE_WIDTH);
        build_svg_content(&markers, selected_id, cur_scale, cw).map(|content| {
            format!(
                r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {} {}" preserveAspectRatio="none" style="position:absolute;top:0;left:0;width:100%;height:100%;pointer-events:none;z-index:5;">{}</svg>"#,
                projection::WORLD_WIDTH_PX,
                projection::WORLD_HEIGHT_PX,
                content
            )
        })
    });

    use_effect(move || {
        if let Err(fault) = &*svg_html.read() {
            on_fault.call(fault.clone());
        }
    });

    let svg_markup = svg_html.read().clone().unwrap_or_default();

    let cur_pan_x = *pan_x.read();
    let cur_pan_y = *pan_y.read();
    let cur_scale = *scale.read();
    let dragging = *is_dragging.read();

    let transform_style = format!(
        "transform: translate({cur_pan_x}px, {cur_pan_y}px) scale({cur_scale}); transform-origin: 0 0;"
    );
    let container_class = if dragging {
        "map-container dragging"
    } else {
        "map-container"
    };

    // Popup anchored to its marker, positioned outside the transform
    let popup_view = popup.read().as_ref().and_then(|id| {
        let markers = markers.read();
        let marker = markers.iter().find(|m| &m.profile.id == id)?;
        let rect = container_rect()?;
        let (wx, wy) = coords::lat_lng_to_world_px(marker.display_position());
        let (left, top) =
            coords::world_px_to_container(wx, wy, rect.width(), cur_scale, cur_pan_x, cur_pan_y);
        Some((marker.profile.clone(), left, top))
    });

    let readout = (*hover_px.read())
        .map(|(x, y)| coords::format_world_px(x, y));

    rsx! {
        div {
            id: MAP_CONTAINER_ID,
            class: "{container_class}",

            onwheel: move |evt: Event<WheelData>| {
                evt.prevent_default();
                let delta_y = wheel_delta_y(evt.data().delta());
                let factor = if delta_y < 0.0 { ZOOM_STEP } else { 1.0 / ZOOM_STEP };
                let Some(rect) = container_rect() else { return };
                let client = evt.data().client_coordinates();
                zoom_by(factor, client.x - rect.left(), client.y - rect.top());
            },

            onmousedown: move |evt: Event<MouseData>| {
                // Only track drag/click for left mouse button
                if evt.trigger_button() != Some(MouseButton::Primary) {
                    return;
                }
                let client = evt.client_coordinates();
                is_dragging.set(true);
                did_drag.set(false);
                drag_start_x.set(client.x);
                drag_start_y.set(client.y);
                drag_start_pan_x.set(*pan_x.read());
                drag_start_pan_y.set(*pan_y.read());
            },

            onmousemove: move |evt: Event<MouseData>| {
                let client = evt.client_coordinates();
                if !*is_dragging.read() {
                    hover_px.set(coords::client_to_world_px(
                        client.x, client.y, MAP_CONTAINER_ID,
                        *scale.read(), *pan_x.read(), *pan_y.read(),
                    ));
                    return;
                }
                let dx = client.x - *drag_start_x.read();
                let dy = client.y - *drag_start_y.read();
                if !*did_drag.read() && (dx.abs() > DRAG_THRESHOLD || dy.abs() > DRAG_THRESHOLD) {
                    did_drag.set(true);
                }
                if *did_drag.read() {
                    let new_px = *drag_start_pan_x.read() + dx;
                    let new_py = *drag_start_pan_y.read() + dy;
                    let (px, py) = clamp_pan_to_container(new_px, new_py, *scale.read());
                    pan_x.set(px);
                    pan_y.set(py);
                }
            },

            onmouseup: move |evt: Event<MouseData>| {
                let was_dragging = *is_dragging.read();
                let was_drag = *did_drag.read();
                is_dragging.set(false);
                if was_dragging && was_drag {
                    record_user_move();
                } else if was_dragging {
                    // A mouseup without drag movement = a click
                    let client = evt.client_coordinates();
                    open_popup_at(client.x, client.y);
                }
            },

            onmouseleave: move |_| {
                if *is_dragging.read() && *did_drag.read() {
                    record_user_move();
                }
                is_dragging.set(false);
                hover_px.set(None);
            },

            ondoubleclick: move |evt: Event<MouseData>| {
                evt.prevent_default();
                reset_view();
            },

            // --- Touch event handlers ---

            ontouchstart: move |evt: Event<TouchData>| {
                evt.prevent_default();
                let touches = evt.data().touches();
                if touches.len() == 1 {
                    let t = &touches[0];
                    touch_start_pos.set(Some((t.client_coordinates().x, t.client_coordinates().y)));
                    touch_did_pan.set(false);
                    touch_start_pan_x.set(*pan_x.read());
                    touch_start_pan_y.set(*pan_y.read());
                } else if touches.len() >= 2 {
                    let t0 = &touches[0];
                    let t1 = &touches[1];
                    let p0 = (t0.client_coordinates().x, t0.client_coordinates().y);
                    let p1 = (t1.client_coordinates().x, t1.client_coordinates().y);
                    is_pinching.set(true);
                    pinch_start_distance.set(point_distance(p0, p1));
                    pinch_start_scale.set(*scale.read());
                    pinch_midpoint.set(((p0.0 + p1.0) / 2.0, (p0.1 + p1.1) / 2.0));
                    pinch_start_pan_x.set(*pan_x.read());
                    pinch_start_pan_y.set(*pan_y.read());
                    // Cancel any tap tracking
                    touch_start_pos.set(None);
                    touch_did_pan.set(true);
                }
            },

            ontouchmove: move |evt: Event<TouchData>| {
                evt.prevent_default();
                let touches = evt.data().touches();
                if *is_pinching.read() && touches.len() >= 2 {
                    let t0 = &touches[0];
                    let t1 = &touches[1];
                    let p0 = (t0.client_coordinates().x, t0.client_coordinates().y);
                    let p1 = (t1.client_coordinates().x, t1.client_coordinates().y);
                    let start_d = *pinch_start_distance.read();
                    if start_d < 1.0 { return; }
                    let old_s = *pinch_start_scale.read();
                    let new_s = (old_s * point_distance(p0, p1) / start_d)
                        .clamp(projection::MIN_SCALE, projection::MAX_SCALE);
                    let Some(rect) = container_rect() else { return };
                    let mid = *pinch_midpoint.read();
                    let (new_px, new_py) = zoom_pan_at_cursor(
                        mid.0 - rect.left(), mid.1 - rect.top(), old_s, new_s,
                        *pinch_start_pan_x.read(), *pinch_start_pan_y.read(),
                    );
                    let (px, py) = clamp_pan(new_px, new_py, new_s, rect.width(), rect.height());
                    scale.set(new_s);
                    pan_x.set(px);
                    pan_y.set(py);
                } else if touches.len() == 1 {
                    let t = &touches[0];
                    let cur = (t.client_coordinates().x, t.client_coordinates().y);
                    if let Some(start) = *touch_start_pos.read() {
                        if !*touch_did_pan.read() && point_distance(start, cur) > TOUCH_DRAG_THRESHOLD {
                            touch_did_pan.set(true);
                        }
                        if *touch_did_pan.read() {
                            let new_px = *touch_start_pan_x.read() + cur.0 - start.0;
                            let new_py = *touch_start_pan_y.read() + cur.1 - start.1;
                            let (px, py) = clamp_pan_to_container(new_px, new_py, *scale.read());
                            pan_x.set(px);
                            pan_y.set(py);
                        }
                    }
                }
            },

            ontouchend: move |evt: Event<TouchData>| {
                evt.prevent_default();
                let remaining = evt.data().touches().len();
                if *is_pinching.read() {
                    // Wait for all fingers to lift before resetting pinch state
                    if remaining == 0 {
                        is_pinching.set(false);
                        touch_start_pos.set(None);
                        record_user_move();
                    }
                    return;
                }
                if remaining == 0 {
                    if *touch_did_pan.read() {
                        record_user_move();
                    } else if let Some(start) = *touch_start_pos.read() {
                        open_popup_at(start.0, start.1);
                    }
                    touch_start_pos.set(None);
                }
            },

            ontouchcancel: move |_evt: Event<TouchData>| {
                touch_start_pos.set(None);
                touch_did_pan.set(false);
                is_pinching.set(false);
            },

            // Inner wrapper — CSS transform applies zoom/pan to basemap + overlay together
            div {
                class: "map-inner",
                style: "{transform_style}",
                div { class: "world-basemap" }
                div {
                    dangerous_inner_html: "{svg_markup}",
                    style: "position:absolute;top:0;left:0;width:100%;height:100%;pointer-events:none;",
                }
            }

            if let Some((profile, left, top)) = popup_view {
                MarkerPopup {
                    profile: profile,
                    left: left,
                    top: top,
                    on_close: move |_| popup.set(None),
                }
            }

            div { class: "map-controls",
                onmousedown: move |evt: Event<MouseData>| evt.stop_propagation(),
                onmouseup: move |evt: Event<MouseData>| evt.stop_propagation(),
                button {
                    title: "Zoom in",
                    onclick: move |_| {
                        if let Some(rect) = container_rect() {
                            zoom_by(2.0, rect.width() / 2.0, rect.height() / 2.0);
                        }
                    },
                    "+"
                }
                button {
                    title: "Zoom out",
                    onclick: move |_| {
                        if let Some(rect) = container_rect() {
                            zoom_by(0.5, rect.width() / 2.0, rect.height() / 2.0);
                        }
                    },
                    "−"
                }
                button {
                    title: "Whole world",
                    onclick: move |_| reset_view(),
                    "⌂"
                }
            }

            // Coordinate readout (outside the transform so it stays fixed)
            if let Some(text) = readout {
                div { class: "coord-readout",
                    span { class: "coord-tag", "{text}" }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use member_map_shared::layout::layout;
    use member_map_shared::models::{Owner, Profile};

    fn profile(id: &str, name: &str, lat: f64, lng: f64) -> Profile {
        Profile {
            id: id.to_string(),
            name: name.to_string(),
            program: "Biology".to_string(),
            graduation_year: None,
            current_term: None,
            location: "Somewhere".to_string(),
            latitude: lat,
            longitude: lng,
            owner: Owner::default(),
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    // --- SVG builder ---

    #[test]
    fn test_svg_selected_marker_drawn_last_in_distinct_color() {
        let markers = layout(&[
            profile("a", "Ana", 10.0, 10.0),
            profile("b", "Ben", -10.0, -10.0),
        ]);
        let svg = build_svg_content(&markers, Some("a"), 1.0, REFERENCE_WIDTH).unwrap();
        let ana = svg.find("<title>Ana</title>").unwrap();
        let ben = svg.find("<title>Ben</title>").unwrap();
        assert!(ben < ana);
        assert_eq!(svg.matches(SELECTED_COLOR).count(), 2, "pin and ring");
        assert!(svg.contains("<animate"));
    }

    #[test]
    fn test_svg_without_selection_has_no_ring() {
        let markers = layout(&[profile("a", "Ana", 10.0, 10.0)]);
        let svg = build_svg_content(&markers, None, 1.0, REFERENCE_WIDTH).unwrap();
        assert!(!svg.contains(SELECTED_COLOR));
        assert_eq!(svg.matches("<circle").count(), 1);
    }

    #[test]
    fn test_svg_spread_markers_get_legs() {
        let markers = layout(&[
            profile("a", "A", 43.6532, -79.3832),
            profile("b", "B", 43.6532, -79.3832),
            profile("c", "C", 43.6532, -79.3832),
        ]);
        let mut svg = String::new();
        build_markers(&mut svg, &markers, None, 1.0).unwrap();
        assert_eq!(svg.matches(LEG_STROKE).count(), 2);
        assert_eq!(svg.matches("<circle").count(), 3);
    }

    #[test]
    fn test_svg_escapes_names() {
        let markers = layout(&[profile("a", "<script>x</script> & co", 0.0, 0.0)]);
        let svg = build_svg_content(&markers, None, 1.0, REFERENCE_WIDTH).unwrap();
        assert!(!svg.contains("<script>"));
        assert!(svg.contains("&lt;script&gt;x&lt;/script&gt; &amp; co"));
    }

    #[test]
    fn test_svg_non_finite_marker_is_a_fault() {
        let markers = layout(&[profile("bad", "Bad", f64::NAN, 0.0)]);
        let err = build_svg_content(&markers, None, 1.0, REFERENCE_WIDTH).unwrap_err();
        assert_eq!(
            err,
            MapFault::InvalidMarker {
                profile_id: "bad".to_string()
            }
        );
    }

    #[test]
    fn test_graticule_line_count() {
        let mut svg = String::new();
        build_graticule(&mut svg, 1.0);
        // 13 meridians (-180..=180 step 30) + 7 parallels (-90..=90)
        assert_eq!(svg.matches("<line").count(), 20);
    }

    #[test]
    fn test_marker_size_constant_on_screen() {
        let markers = layout(&[profile("a", "A", 0.0, 0.0)]);
        let near = build_svg_content(&markers, None, 4.0, REFERENCE_WIDTH).unwrap();
        assert!(near.contains(r#"r="1.5""#));
        let far = build_svg_content(&markers, None, 1.0, REFERENCE_WIDTH).unwrap();
        assert!(far.contains(r#"r="6""#));
    }

    // --- Selection to popup ---

    #[test]
    fn test_popup_follows_new_revisions_only() {
        use member_map_shared::selection::SelectionEvent;

        let mut applier = ViewportApplier::new();
        let state = SelectionState::new().update(SelectionEvent::Select(profile("a", "Ana", 10.0, 10.0)));
        assert_eq!(popup_for_request(&applier, &state), Some(Some("a".to_string())));
        applier.apply(&state.viewport_request());

        // Typing in the search box re-sends the same selection
        let state = state.update(SelectionEvent::QueryChanged("an".to_string()));
        assert_eq!(popup_for_request(&applier, &state), None);

        let state = state.update(SelectionEvent::Clear);
        assert_eq!(popup_for_request(&applier, &state), Some(None));
    }

    // --- Hit testing ---

    #[test]
    fn test_find_nearest_picks_closest_within_threshold() {
        let positions = vec![(100.0, 100.0), (110.0, 110.0)];
        assert_eq!(find_nearest(&positions, (108.0, 108.0), 30.0), Some(1));
        assert_eq!(find_nearest(&positions, (102.0, 102.0), 30.0), Some(0));
        assert_eq!(find_nearest(&positions, (300.0, 300.0), 30.0), None);
    }

    #[test]
    fn test_marker_positions_use_display_position() {
        let markers = layout(&[profile("a", "A", 0.0, 0.0), profile("b", "B", 0.0, 0.0)]);
        let positions = marker_positions(&markers);
        assert_ne!(positions[0], positions[1]);
        assert!((positions[0].0 - projection::WORLD_WIDTH_PX / 2.0).abs() < 1e-9);
    }

    // --- Zoom / pan ---

    #[test]
    fn test_zoom_pan_at_cursor_keeps_point_fixed() {
        let (px, py) = zoom_pan_at_cursor(200.0, 100.0, 1.0, 2.0, 0.0, 0.0);
        assert!((px - (-200.0)).abs() < 1e-9);
        assert!((py - (-100.0)).abs() < 1e-9);
    }

    #[test]
    fn test_clamp_pan_world_fits_at_scale_1() {
        // 800 wide → world is 400 tall, container 600 tall: nothing to pan
        let (px, py) = clamp_pan(-50.0, -50.0, 1.0, 800.0, 600.0);
        assert!(px.abs() < 1e-9);
        assert!(py.abs() < 1e-9);
    }

    #[test]
    fn test_clamp_pan_limits_when_zoomed() {
        // scale 4: content 3200×1600 in an 800×600 container
        let (px, py) = clamp_pan(-5000.0, -5000.0, 4.0, 800.0, 600.0);
        assert!((px - (-2400.0)).abs() < 1e-9);
        assert!((py - (-1000.0)).abs() < 1e-9);
        let (px, py) = clamp_pan(50.0, 50.0, 4.0, 800.0, 600.0);
        assert!(px.abs() < 1e-9);
        assert!(py.abs() < 1e-9);
    }

    #[test]
    fn test_pan_for_viewport_centers_close_up() {
        let target = Viewport::close_up(member_map_shared::models::LatLng::new(43.6532, -79.3832));
        let (s, px, py) = pan_for_viewport(target, 800.0, 600.0);
        assert!((s - projection::MAX_SCALE).abs() < 1e-9);
        let center = projection::center_for_pan(px, py, s, 800.0, 600.0);
        assert!((center.lat - 43.6532).abs() < 1e-6);
        assert!((center.lng - (-79.3832)).abs() < 1e-6);
    }
}
