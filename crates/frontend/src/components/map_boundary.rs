use dioxus::logger::tracing;
use dioxus::prelude::*;
use member_map_shared::models::PlacedMarker;
use member_map_shared::selection::SelectionState;
use member_map_shared::viewport::{FaultAction, MapLifecycle};

use crate::components::map_view::{MapFault, MapView};

/// Hosts the map and keeps its failures from reaching the rest of the page.
///
/// The map subtree is keyed on the lifecycle generation: a recreate mounts a
/// fresh instance with its own zoom/pan state.
#[component]
pub fn MapBoundary(
    markers: ReadSignal<Vec<PlacedMarker>>,
    selection: ReadSignal<SelectionState>,
    data_revision: ReadSignal<u64>,
) -> Element {
    let mut lifecycle = use_signal(MapLifecycle::new);

    use_effect(move || {
        let rev = *data_revision.read();
        lifecycle.write().data_changed(rev);
    });

    let on_fault = move |fault: MapFault| {
        let action = lifecycle.write().report_fault();
        match action {
            FaultAction::Contained => {
                tracing::warn!(%fault, "Map fault contained");
            }
            FaultAction::Recreate => {
                tracing::warn!(%fault, "Map faulted repeatedly, recreating");
            }
        }
    };

    let state = lifecycle.read();
    let generation = state.generation();
    let faulted = state.is_faulted();
    drop(state);

    rsx! {
        div { class: "map-boundary",
            if faulted {
                div { class: "map-fallback",
                    p { "The map could not be displayed." }
                    button {
                        class: "btn",
                        onclick: move |_| lifecycle.write().retry(),
                        "Retry"
                    }
                }
            } else {
                MapView {
                    key: "{generation}",
                    markers: markers,
                    selection: selection,
                    on_fault: on_fault,
                    on_mounted: move |_| lifecycle.write().mount(),
                    on_unmounted: move |_| lifecycle.write().unmount(),
                }
            }
        }
    }
}
