use dioxus::prelude::*;
use member_map_shared::models::{GeocodeCandidate, InputError, Profile, ProfileInput};

use crate::api;
use crate::components::location_autocomplete::LocationAutocomplete;

/// Editable text of the form, before coordinates are attached.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileDraft {
    pub name: String,
    pub program: String,
    pub graduation_year: String,
    pub current_term: String,
    pub location: String,
}

impl ProfileDraft {
    pub fn from_profile(profile: Option<&Profile>) -> Self {
        match profile {
            Some(p) => ProfileDraft {
                name: p.name.clone(),
                program: p.program.clone(),
                graduation_year: p.graduation_year.clone().unwrap_or_default(),
                current_term: p.current_term.clone().unwrap_or_default(),
                location: p.location.clone(),
            },
            None => ProfileDraft::default(),
        }
    }

    pub fn to_input(&self, latitude: f64, longitude: f64) -> ProfileInput {
        ProfileInput {
            name: self.name.clone(),
            program: self.program.clone(),
            graduation_year: Some(self.graduation_year.clone()),
            current_term: Some(self.current_term.clone()),
            location: self.location.clone(),
            latitude,
            longitude,
        }
    }
}

/// Coordinates available without a lookup: a picked suggestion, or the
/// saved ones when the location text is unchanged.
fn known_coordinates(
    picked: Option<&GeocodeCandidate>,
    existing: Option<&Profile>,
    location: &str,
) -> Option<(f64, f64)> {
    if let Some(c) = picked {
        return Some((c.latitude, c.longitude));
    }
    existing
        .filter(|p| p.location.trim() == location.trim())
        .map(|p| (p.latitude, p.longitude))
}

/// The best geocoder match for free-typed text.
fn best_candidate(candidates: &[GeocodeCandidate]) -> Result<(f64, f64), InputError> {
    candidates
        .first()
        .map(|c| (c.latitude, c.longitude))
        .ok_or(InputError::LocationNotFound)
}

async fn resolve_and_save(
    draft: ProfileDraft,
    picked: Option<GeocodeCandidate>,
    existing: Option<Profile>,
) -> Result<Profile, String> {
    // Field checks first so a blank form never hits the geocoder
    draft.to_input(0.0, 0.0).validate().map_err(|e| e.to_string())?;

    let (lat, lng) = match known_coordinates(picked.as_ref(), existing.as_ref(), &draft.location) {
        Some(coords) => coords,
        None => {
            let candidates = api::geocode(draft.location.trim()).await?;
            best_candidate(&candidates).map_err(|e| e.to_string())?
        }
    };

    let input = draft.to_input(lat, lng);
    input.validate().map_err(|e| e.to_string())?;
    api::submit_profile(&input).await
}

#[component]
pub fn ProfileForm(
    existing: Option<Profile>,
    on_saved: EventHandler<Profile>,
    on_cancel: Option<EventHandler<()>>,
) -> Element {
    let initial = ProfileDraft::from_profile(existing.as_ref());
    let mut name = use_signal(|| initial.name.clone());
    let mut program = use_signal(|| initial.program.clone());
    let mut graduation_year = use_signal(|| initial.graduation_year.clone());
    let mut current_term = use_signal(|| initial.current_term.clone());
    let location = use_signal(|| initial.location.clone());
    let picked = use_signal(|| None::<GeocodeCandidate>);

    let mut saving = use_signal(|| false);
    let mut error = use_signal(|| None::<String>);

    let is_saving = *saving.read();
    let error_text = error.read().clone();
    let submit_label = if is_saving { "Saving..." } else { "Save Profile" };

    rsx! {
        form {
            class: "profile-form",
            onsubmit: move |evt: Event<FormData>| {
                evt.prevent_default();
                if *saving.read() {
                    return;
                }
                let draft = ProfileDraft {
                    name: name.read().clone(),
                    program: program.read().clone(),
                    graduation_year: graduation_year.read().clone(),
                    current_term: current_term.read().clone(),
                    location: location.read().clone(),
                };
                let chosen = picked.read().clone();
                let before = existing.clone();
                saving.set(true);
                error.set(None);
                spawn(async move {
                    match resolve_and_save(draft, chosen, before).await {
                        Ok(profile) => on_saved.call(profile),
                        Err(e) => error.set(Some(e)),
                    }
                    saving.set(false);
                });
            },

            div { class: "form-field",
                label { r#for: "name", "Full Name" }
                input {
                    id: "name",
                    class: "form-input",
                    value: "{name}",
                    oninput: move |evt: Event<FormData>| name.set(evt.value()),
                }
            }
            div { class: "form-field",
                label { r#for: "program", "Program" }
                input {
                    id: "program",
                    class: "form-input",
                    placeholder: "e.g., Computer Science",
                    value: "{program}",
                    oninput: move |evt: Event<FormData>| program.set(evt.value()),
                }
            }
            div { class: "form-row",
                div { class: "form-field",
                    label { r#for: "graduation-year", "Graduation Year" }
                    input {
                        id: "graduation-year",
                        class: "form-input",
                        placeholder: "e.g., 2024",
                        value: "{graduation_year}",
                        oninput: move |evt: Event<FormData>| graduation_year.set(evt.value()),
                    }
                }
                div { class: "form-field",
                    label { r#for: "current-term", "Current Term" }
                    input {
                        id: "current-term",
                        class: "form-input",
                        placeholder: "e.g., Fall 2024",
                        value: "{current_term}",
                        oninput: move |evt: Event<FormData>| current_term.set(evt.value()),
                    }
                }
            }
            div { class: "form-field",
                label { r#for: "location", "Location" }
                LocationAutocomplete { location: location, picked: picked }
            }

            if let Some(msg) = error_text {
                p { class: "form-error", "{msg}" }
            }

            div { class: "form-actions",
                button {
                    r#type: "submit",
                    class: "btn btn-primary",
                    disabled: is_saving,
                    "{submit_label}"
                }
                if let Some(cancel) = on_cancel {
                    button {
                        r#type: "button",
                        class: "btn",
                        onclick: move |_| cancel.call(()),
                        "Cancel"
                    }
                }
            }
        }
    }
}
