use std::collections::HashMap;
use std::f64::consts::PI;

use crate::models::{PlacedMarker, Profile};

/// Decimal places coordinates are rounded to before grouping (~10 m).
pub const GROUP_KEY_PRECISION: usize = 4;

/// Distance in degrees between a group's anchor and its spread-out members.
pub const MARKER_SPREAD_RADIUS_DEG: f64 = 0.01;

/// Grouping key for a coordinate: both axes rounded to 4 decimals.
///
/// Points straddling a rounding boundary land in different groups even when
/// they are only a few meters apart. Signed zero is folded into `0.0`.
pub fn group_key(lat: f64, lng: f64) -> String {
    // -0.0 + 0.0 == +0.0, so "-0.0000" never appears
    format!(
        "{:.prec$},{:.prec$}",
        lat + 0.0,
        lng + 0.0,
        prec = GROUP_KEY_PRECISION
    )
}

/// Split profiles into coordinate groups.
/// Groups come out in order of first appearance, members in input order.
pub fn coordinate_groups(profiles: &[Profile]) -> Vec<Vec<&Profile>> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<Vec<&Profile>> = Vec::new();

    for profile in profiles {
        let key = group_key(profile.latitude, profile.longitude);
        match index.get(&key) {
            Some(&i) => groups[i].push(profile),
            None => {
                index.insert(key, groups.len());
                groups.push(vec![profile]);
            }
        }
    }

    groups
}

/// Offset of member `index` in a group of `size`, relative to the anchor.
/// Returns (d_lat, d_lng). The anchor itself (index 0) never moves.
pub fn spread_offset(index: usize, size: usize) -> (f64, f64) {
    if index == 0 || size < 2 {
        return (0.0, 0.0);
    }
    let angle = 2.0 * PI * index as f64 / size as f64;
    (
        MARKER_SPREAD_RADIUS_DEG * angle.sin(),
        MARKER_SPREAD_RADIUS_DEG * angle.cos(),
    )
}

/// Compute a display position for every profile.
///
/// Lone profiles keep their coordinates. In a group of several, the first
/// member stays on the anchor and the others are spread evenly on a circle
/// of [`MARKER_SPREAD_RADIUS_DEG`] around it. Every input profile appears
/// exactly once in the output. Coordinates are not validated.
pub fn layout(profiles: &[Profile]) -> Vec<PlacedMarker> {
    let mut placed = Vec::with_capacity(profiles.len());

    for group in coordinate_groups(profiles) {
        let size = group.len();
        let anchor_lat = group[0].latitude;
        let anchor_lng = group[0].longitude;

        for (i, profile) in group.into_iter().enumerate() {
            let (offset_latitude, offset_longitude) = if size == 1 {
                (profile.latitude, profile.longitude)
            } else {
                let (d_lat, d_lng) = spread_offset(i, size);
                (anchor_lat + d_lat, anchor_lng + d_lng)
            };
            placed.push(PlacedMarker {
                profile: profile.clone(),
                offset_latitude,
                offset_longitude,
            });
        }
    }

    placed
}
