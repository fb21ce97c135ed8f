use dioxus::prelude::*;
use member_map_shared::models::Profile;

/// `mailto:` link for the profile owner, when an email is visible to us.
pub fn contact_link(email: Option<&str>) -> Option<String> {
    let email = email?.trim();
    if email.is_empty() || !email.contains('@') {
        return None;
    }
    Some(format!("mailto:{email}"))
}

fn detail_lines(profile: &Profile) -> Vec<(&'static str, String)> {
    let mut lines = vec![
        ("Program", profile.program.clone()),
        ("Location", profile.location.clone()),
    ];
    if let Some(year) = &profile.graduation_year {
        lines.push(("Class of", year.clone()));
    }
    if let Some(term) = &profile.current_term {
        lines.push(("Current", term.clone()));
    }
    lines
}

#[component]
pub fn MarkerPopup(profile: Profile, left: f64, top: f64, on_close: EventHandler<()>) -> Element {
    let lines = detail_lines(&profile);
    let contact = contact_link(profile.owner.email.as_deref());
    let owner_name = profile.owner.display_name.clone();
    let avatar = profile.owner.avatar_url.clone();

    rsx! {
        div {
            class: "marker-popup",
            style: "left: {left}px; top: {top}px;",
            onmousedown: move |evt: Event<MouseData>| evt.stop_propagation(),
            onmouseup: move |evt: Event<MouseData>| evt.stop_propagation(),
            ontouchstart: move |evt: Event<TouchData>| evt.stop_propagation(),
            ontouchend: move |evt: Event<TouchData>| evt.stop_propagation(),
            button {
                class: "popup-close",
                title: "Close",
                onclick: move |_| on_close.call(()),
                "×"
            }
            h3 { "{profile.name}" }
            for (label, value) in lines {
                p {
                    span { class: "popup-label", "{label}: " }
                    "{value}"
                }
            }
            if owner_name.is_some() || avatar.is_some() {
                div { class: "popup-owner",
                    if let Some(src) = avatar {
                        img { class: "avatar", src: "{src}", alt: "" }
                    }
                    if let Some(name) = owner_name {
                        span { "{name}" }
                    }
                }
            }
            if let Some(href) = contact {
                a { class: "popup-contact", href: "{href}", "Contact" }
            }
        }
    }
}
