use dioxus::prelude::*;
use member_map_shared::layout::layout;
use member_map_shared::models::{PlacedMarker, Profile};
use member_map_shared::selection::SelectionState;

use crate::api::{self, DirectoryData};
use crate::components::map_boundary::MapBoundary;
use crate::components::people_search::PeopleSearch;
use crate::components::profile_form::ProfileForm;

fn member_count_line(count: u64) -> String {
    match count {
        1 => "1 member has shared their location".to_string(),
        n => format!("{n} members have shared their locations"),
    }
}

#[component]
pub fn Directory() -> Element {
    let mut directory = use_resource(api::fetch_directory);
    let selection = use_signal(SelectionState::new);
    let mut data_revision = use_signal(|| 0_u64);
    let mut editing = use_signal(|| false);

    let profiles = use_memo(move || match &*directory.read() {
        Some(Ok(data)) => data.profiles.clone(),
        _ => Vec::<Profile>::new(),
    });
    let markers = use_memo(move || -> Vec<PlacedMarker> { layout(&profiles.read()) });

    // Every new profile set is a new data revision for the map boundary
    use_effect(move || {
        let _ = profiles.read();
        *data_revision.write() += 1;
    });

    let loaded: Option<Result<DirectoryData, String>> = directory.read().clone();

    rsx! {
        div { class: "directory-page",
            header { class: "page-header",
                h1 { "Member Map" }
                if let Some(Ok(data)) = &loaded {
                    p { class: "member-count", "{member_count_line(data.member_count)}" }
                }
            }

            {match loaded {
                None => rsx! {
                    div { class: "loading", "Loading members..." }
                },
                Some(Err(message)) => rsx! {
                    div { class: "load-error",
                        p { "Could not load the directory: {message}" }
                        button {
                            class: "btn",
                            onclick: move |_| directory.restart(),
                            "Try again"
                        }
                    }
                },
                Some(Ok(data)) => rsx! {
                    div { class: "directory-layout",
                        aside { class: "side-panel",
                            if data.my_profile.is_none() {
                                section { class: "panel-section",
                                    h2 { "Complete Your Profile" }
                                    p { class: "hint", "Add yourself to the map so other members can find you." }
                                    ProfileForm {
                                        existing: None,
                                        on_saved: move |_| directory.restart(),
                                    }
                                }
                            } else if *editing.read() {
                                section { class: "panel-section",
                                    h2 { "Edit Profile" }
                                    ProfileForm {
                                        existing: data.my_profile.clone(),
                                        on_saved: move |_| {
                                            editing.set(false);
                                            directory.restart();
                                        },
                                        on_cancel: move |_| editing.set(false),
                                    }
                                }
                            } else {
                                section { class: "panel-section",
                                    button {
                                        class: "btn",
                                        onclick: move |_| editing.set(true),
                                        "Edit Profile"
                                    }
                                }
                            }

                            section { class: "panel-section",
                                h2 { "Find People" }
                                PeopleSearch { profiles: profiles, selection: selection }
                            }
                        }

                        main { class: "map-panel",
                            MapBoundary {
                                markers: markers,
                                selection: selection,
                                data_revision: data_revision,
                            }
                        }
                    }
                },
            }}
        }
    }
}
