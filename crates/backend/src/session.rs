use axum::http::HeaderMap;

use crate::storage::{Account, Storage};

pub const USER_HEADER: &str = "x-forwarded-user";
pub const USERNAME_HEADER: &str = "x-forwarded-preferred-username";
pub const EMAIL_HEADER: &str = "x-forwarded-email";
pub const AVATAR_HEADER: &str = "x-forwarded-avatar";

/// Identity asserted by the authenticating proxy in front of the server.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub account_id: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
}

/// The caller of a GraphQL request, signed in or not.
#[derive(Debug, Clone, Default)]
pub struct Viewer(pub Option<Session>);

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl Session {
    /// `None` when the account header is missing or blank.
    pub fn from_headers(headers: &HeaderMap) -> Option<Session> {
        let account_id = header(headers, USER_HEADER)?;
        Some(Session {
            account_id,
            display_name: header(headers, USERNAME_HEADER),
            email: header(headers, EMAIL_HEADER),
            avatar_url: header(headers, AVATAR_HEADER),
        })
    }

    pub fn account(&self) -> Account {
        Account {
            id: self.account_id.clone(),
            display_name: self.display_name.clone(),
            avatar_url: self.avatar_url.clone(),
            email: self.email.clone(),
        }
    }
}

/// Read the session from the request and refresh its account record.
///
/// A failed refresh is logged and otherwise ignored; the request still
/// proceeds as the identified account.
pub fn identify(storage: &Storage, headers: &HeaderMap) -> Option<Session> {
    let session = Session::from_headers(headers)?;
    if let Err(e) = storage.upsert_account(&session.account()) {
        tracing::warn!(account_id = %session.account_id, error = %e, "Failed to refresh account");
    }
    Some(session)
}
