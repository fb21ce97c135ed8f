use dioxus::prelude::*;
use gloo_timers::future::TimeoutFuture;
use member_map_shared::models::GeocodeCandidate;
use member_map_shared::sequence::RequestSequencer;

use crate::api;

const DEBOUNCE_MS: u32 = 300;

/// Shorter input is not sent to the geocoder.
const MIN_LOOKUP_CHARS: usize = 3;

#[derive(Debug, Clone, PartialEq)]
enum LookupStatus {
    Idle,
    Loading,
    Ready,
    Failed(String),
}

/// Move the keyboard highlight one step, wrapping at both ends.
fn next_index(current: Option<usize>, len: usize, down: bool) -> Option<usize> {
    if len == 0 {
        return None;
    }
    Some(match (current, down) {
        (None, true) => 0,
        (None, false) => len - 1,
        (Some(i), true) => (i + 1) % len,
        (Some(i), false) => (i + len - 1) % len,
    })
}

fn wants_lookup(text: &str) -> bool {
    text.trim().chars().count() >= MIN_LOOKUP_CHARS
}

/// Location field with debounced geocoder suggestions.
///
/// Typing clears `picked`; choosing a suggestion fills both the text and
/// `picked`. Only the newest lookup may update the suggestion list.
#[component]
pub fn LocationAutocomplete(
    location: Signal<String>,
    picked: Signal<Option<GeocodeCandidate>>,
) -> Element {
    let mut sequencer = use_signal(RequestSequencer::new);
    let mut suggestions = use_signal(Vec::<GeocodeCandidate>::new);
    let mut status = use_signal(|| LookupStatus::Idle);
    let mut highlighted = use_signal(|| None::<usize>);
    let mut open = use_signal(|| false);

    let mut choose = move |candidate: GeocodeCandidate| {
        sequencer.write().cancel();
        location.set(candidate.label.clone());
        picked.set(Some(candidate));
        suggestions.set(Vec::new());
        status.set(LookupStatus::Idle);
        highlighted.set(None);
        open.set(false);
    };

    let text = location.read().clone();
    let list = suggestions.read().clone();
    let current_status = status.read().clone();
    let current_highlight = *highlighted.read();
    let is_open = *open.read();

    rsx! {
        div { class: "autocomplete",
            input {
                r#type: "text",
                id: "location",
                class: "form-input",
                placeholder: "e.g., Toronto, ON, Canada",
                autocomplete: "off",
                value: "{text}",
                oninput: move |evt: Event<FormData>| {
                    let value = evt.value();
                    location.set(value.clone());
                    picked.set(None);
                    highlighted.set(None);
                    let ticket = sequencer.write().issue();

                    if !wants_lookup(&value) {
                        suggestions.set(Vec::new());
                        status.set(LookupStatus::Idle);
                        open.set(false);
                        return;
                    }

                    spawn(async move {
                        TimeoutFuture::new(DEBOUNCE_MS).await;
                        if !sequencer.peek().is_current(ticket) {
                            return;
                        }
                        status.set(LookupStatus::Loading);
                        open.set(true);
                        let result = api::geocode(value.trim()).await;
                        // A newer keystroke or a pick superseded this lookup
                        if !sequencer.peek().is_current(ticket) {
                            return;
                        }
                        match result {
                            Ok(found) => {
                                suggestions.set(found);
                                status.set(LookupStatus::Ready);
                            }
                            Err(e) => {
                                suggestions.set(Vec::new());
                                status.set(LookupStatus::Failed(e));
                            }
                        }
                    });
                },
                onkeydown: move |evt: Event<KeyboardData>| {
                    let len = suggestions.read().len();
                    match evt.key() {
                        Key::ArrowDown => {
                            evt.prevent_default();
                            open.set(true);
                            let current = *highlighted.read();
                            highlighted.set(next_index(current, len, true));
                        }
                        Key::ArrowUp => {
                            evt.prevent_default();
                            let current = *highlighted.read();
                            highlighted.set(next_index(current, len, false));
                        }
                        Key::Enter => {
                            let current = *highlighted.read();
                            let pick = current.and_then(|i| suggestions.read().get(i).cloned());
                            if let Some(candidate) = pick {
                                evt.prevent_default();
                                choose(candidate);
                            }
                        }
                        Key::Escape => {
                            open.set(false);
                            highlighted.set(None);
                        }
                        _ => {}
                    }
                },
            }

            if is_open {
                div { class: "autocomplete-list",
                    {match current_status {
                        LookupStatus::Loading => rsx! {
                            div { class: "autocomplete-note", "Searching..." }
                        },
                        LookupStatus::Failed(message) => rsx! {
                            div { class: "autocomplete-note error", "{message}" }
                        },
                        LookupStatus::Ready if list.is_empty() => rsx! {
                            div { class: "autocomplete-note",
                                "No locations found. Try a different search term."
                            }
                        },
                        LookupStatus::Ready | LookupStatus::Idle => rsx! {
                            for (i, (label, candidate)) in list.into_iter().map(|c| (c.label.clone(), c)).enumerate() {
                                div {
                                    key: "{i}",
                                    class: if current_highlight == Some(i) { "autocomplete-item active" } else { "autocomplete-item" },
                                    // mousedown so the pick lands before the input loses focus
                                    onmousedown: move |evt: Event<MouseData>| {
                                        evt.prevent_default();
                                        choose(candidate.clone());
                                    },
                                    "{label}"
                                }
                            }
                        },
                    }}
                }
            }
        }
    }
}
