use dioxus::prelude::*;
use member_map_shared::models::Profile;
use member_map_shared::search::{result_label, results_summary, search_outcome, SearchOutcome};
use member_map_shared::selection::{SelectionEvent, SelectionState};

fn dispatch(mut selection: Signal<SelectionState>, event: SelectionEvent) {
    let next = selection.peek().clone().update(event);
    if next != *selection.peek() {
        selection.set(next);
    }
}

/// Header line of the results panel, or `None` while the panel is hidden.
fn panel_message(query: &str, outcome: &SearchOutcome) -> Option<String> {
    match outcome {
        SearchOutcome::TooShort => None,
        SearchOutcome::Matches(found) if found.is_empty() => {
            Some(format!("No people found matching \"{query}\""))
        }
        SearchOutcome::Matches(found) => Some(results_summary(found.len())),
    }
}

#[component]
pub fn PeopleSearch(profiles: ReadSignal<Vec<Profile>>, selection: Signal<SelectionState>) -> Element {
    let mut query = use_signal(String::new);
    // Results stay hidden after a pick until the user types again
    let mut show_results = use_signal(|| false);

    let text = query.read().clone();
    let profiles_read = profiles.read();
    let outcome = search_outcome(&profiles_read, &text);
    let message = panel_message(&text, &outcome);
    let results: Vec<Profile> = outcome.into_results().into_iter().cloned().collect();
    drop(profiles_read);

    let panel_open = *show_results.read() && message.is_some();

    rsx! {
        div { class: "people-search",
            div { class: "search-input-row",
                input {
                    r#type: "search",
                    class: "search-input",
                    placeholder: "Search by name, program, location, or graduation year...",
                    value: "{text}",
                    oninput: move |evt: Event<FormData>| {
                        let value = evt.value();
                        query.set(value.clone());
                        show_results.set(true);
                        dispatch(selection, SelectionEvent::QueryChanged(value));
                    },
                }
                if !text.is_empty() {
                    button {
                        class: "search-clear",
                        title: "Clear search",
                        onclick: move |_| {
                            query.set(String::new());
                            show_results.set(false);
                            dispatch(selection, SelectionEvent::Clear);
                        },
                        "×"
                    }
                }
            }

            if panel_open {
                div { class: "search-results",
                    if let Some(msg) = message {
                        p { class: "search-summary", "{msg}" }
                    }
                    for profile in results {
                        SearchResult {
                            key: "{profile.id}",
                            profile: profile.clone(),
                            on_pick: move |picked: Profile| {
                                query.set(result_label(&picked));
                                show_results.set(false);
                                dispatch(selection, SelectionEvent::Select(picked));
                            },
                        }
                    }
                }
            }
        }
    }
}

#[component]
fn SearchResult(profile: Profile, on_pick: EventHandler<Profile>) -> Element {
    let picked = profile.clone();
    rsx! {
        div {
            class: "search-result",
            onclick: move |_| on_pick.call(picked.clone()),
            div { class: "result-name", "{profile.name}" }
            div { class: "result-detail", "{profile.program}" }
            div { class: "result-detail", "{profile.location}" }
            if let Some(year) = &profile.graduation_year {
                div { class: "result-detail", "Class of {year}" }
            }
            if let Some(term) = &profile.current_term {
                div { class: "result-detail", "Current: {term}" }
            }
            span { class: "result-action", "View on map" }
        }
    }
}
