use crate::models::Profile;
use crate::viewport::{Viewport, ViewportRequest};

#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    Idle,
    Selected { profile: Profile, target: Viewport },
}

#[derive(Debug, Clone, PartialEq)]
pub enum SelectionEvent {
    /// A search result was picked.
    Select(Profile),
    /// The clear button was pressed.
    Clear,
    /// The search input text changed. An empty query clears the selection.
    QueryChanged(String),
}

/// Shared "selected profile + requested viewport" UI state.
///
/// Immutable: [`SelectionState::update`] returns the next state. Each
/// logical change bumps `revision`, which the map side uses to apply
/// requests in order.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionState {
    selection: Selection,
    revision: u64,
}

impl Default for SelectionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionState {
    pub fn new() -> Self {
        SelectionState {
            selection: Selection::Idle,
            revision: 0,
        }
    }

    pub fn update(self, event: SelectionEvent) -> SelectionState {
        match event {
            SelectionEvent::Select(profile) => {
                let target = Viewport::close_up(profile.position());
                SelectionState {
                    selection: Selection::Selected { profile, target },
                    revision: self.revision + 1,
                }
            }
            SelectionEvent::QueryChanged(query) if !query.is_empty() => self,
            SelectionEvent::Clear | SelectionEvent::QueryChanged(_) => match self.selection {
                Selection::Idle => self,
                Selection::Selected { .. } => SelectionState {
                    selection: Selection::Idle,
                    revision: self.revision + 1,
                },
            },
        }
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.selection, Selection::Idle)
    }

    pub fn selected(&self) -> Option<&Profile> {
        match &self.selection {
            Selection::Idle => None,
            Selection::Selected { profile, .. } => Some(profile),
        }
    }

    pub fn is_selected(&self, profile_id: &str) -> bool {
        self.selected().is_some_and(|p| p.id == profile_id)
    }

    pub fn viewport_target(&self) -> Option<Viewport> {
        match &self.selection {
            Selection::Idle => None,
            Selection::Selected { target, .. } => Some(*target),
        }
    }

    pub fn viewport_request(&self) -> ViewportRequest {
        ViewportRequest {
            target: self.viewport_target(),
            revision: self.revision,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LatLng, Owner};
    use crate::viewport::{ApplyOutcome, ViewportApplier, CLOSE_UP_ZOOM, WORLD_VIEW};

    fn profile(id: &str, lat: f64, lng: f64) -> Profile {
        Profile {
            id: id.to_string(),
            name: format!("Member {id}"),
            program: "History".to_string(),
            graduation_year: None,
            current_term: None,
            location: "Here".to_string(),
            latitude: lat,
            longitude: lng,
            owner: Owner::default(),
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn test_starts_idle_without_target() {
        let state = SelectionState::new();
        assert!(state.is_idle());
        assert_eq!(state.viewport_target(), None);
        assert_eq!(state.viewport_request().resolve(), WORLD_VIEW);
    }

    #[test]
    fn test_select_then_clear_lifecycle() {
        let p = profile("p", 43.6532, -79.3832);
        let selected = SelectionState::new().update(SelectionEvent::Select(p.clone()));
        assert_eq!(selected.selected(), Some(&p));
        let target = selected.viewport_target().unwrap();
        assert_eq!(target.center, LatLng::new(43.6532, -79.3832));
        assert_eq!(target.zoom, CLOSE_UP_ZOOM);

        let cleared = selected.update(SelectionEvent::Clear);
        assert!(cleared.is_idle());
        assert_eq!(cleared.viewport_target(), None);
    }

    #[test]
    fn test_select_from_selected_replaces_selection() {
        let a = profile("a", 1.0, 1.0);
        let b = profile("b", 2.0, 2.0);
        let state = SelectionState::new()
            .update(SelectionEvent::Select(a))
            .update(SelectionEvent::Select(b.clone()));
        assert!(state.is_selected("b"));
        assert!(!state.is_selected("a"));
        assert_eq!(state.revision(), 2);
    }

    #[test]
    fn test_empty_query_clears_but_typing_does_not() {
        let state = SelectionState::new().update(SelectionEvent::Select(profile("a", 1.0, 1.0)));
        let typed = state.update(SelectionEvent::QueryChanged("Mem".to_string()));
        assert!(typed.is_selected("a"));
        assert_eq!(typed.revision(), 1);

        let emptied = typed.update(SelectionEvent::QueryChanged(String::new()));
        assert!(emptied.is_idle());
        assert_eq!(emptied.revision(), 2);
    }

    #[test]
    fn test_clear_when_idle_is_not_a_change() {
        let state = SelectionState::new().update(SelectionEvent::Clear);
        assert_eq!(state.revision(), 0);
    }

    #[test]
    fn test_revisions_are_monotonic() {
        let mut state = SelectionState::new();
        let mut last = state.revision();
        for i in 0..5 {
            state = state.update(SelectionEvent::Select(profile(&i.to_string(), i as f64, 0.0)));
            assert!(state.revision() > last);
            last = state.revision();
            state = state.update(SelectionEvent::Clear);
            assert!(state.revision() > last);
            last = state.revision();
        }
    }

    #[test]
    fn test_clicking_through_results_settles_on_last_pick() {
        let picks = [profile("a", 1.0, 1.0), profile("b", 2.0, 2.0), profile("c", 3.0, 3.0)];
        let mut state = SelectionState::new();
        let mut requests = Vec::new();
        for p in picks {
            state = state.update(SelectionEvent::Select(p));
            requests.push(state.viewport_request());
        }

        // Delivered out of order; only the newest may win.
        let mut applier = ViewportApplier::new();
        applier.apply(&requests[0]);
        applier.apply(&requests[2]);
        assert_eq!(applier.apply(&requests[1]), ApplyOutcome::Stale);
        assert_eq!(applier.current().center, LatLng::new(3.0, 3.0));
    }

    #[test]
    fn test_reissuing_same_state_is_idempotent_on_map() {
        let state = SelectionState::new().update(SelectionEvent::Select(profile("a", 5.0, 5.0)));
        let mut applier = ViewportApplier::new();
        assert!(matches!(
            applier.apply(&state.viewport_request()),
            ApplyOutcome::Moved(_)
        ));
        assert_eq!(
            applier.apply(&state.clone().viewport_request()),
            ApplyOutcome::Unchanged
        );
    }
}
