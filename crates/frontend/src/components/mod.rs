pub mod location_autocomplete;
pub mod map_boundary;
pub mod map_view;
pub mod marker_popup;
pub mod people_search;
pub mod profile_form;
