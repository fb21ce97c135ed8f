pub mod layout;
pub mod models;
pub mod projection;
pub mod search;
pub mod selection;
pub mod sequence;
pub mod viewport;
