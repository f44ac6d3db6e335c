//! Conversion between the API's user shape and the local table record.
use crate::model::{LocalUser, RemoteCompany, RemoteUser, UserId, UserInput, UserPayload};

/// Split a display name into first name and the rest.
///
/// Runs of whitespace collapse; the remainder is joined with single spaces.
pub fn split_name(name: &str) -> (String, String) {
    let mut tokens = name.split_whitespace();
    let first = tokens.next().unwrap_or_default().to_string();
    let last = tokens.collect::<Vec<_>>().join(" ");
    (first, last)
}

/// Map an API record to a `LocalUser`.
///
/// `pending_id` is only called when the record carries no id.
pub fn to_local<F>(remote: RemoteUser, pending_id: F) -> LocalUser
where
    F: FnOnce() -> UserId,
{
    let (first_name, last_name) = split_name(remote.name.as_deref().unwrap_or(""));
    let id = match remote.id {
        Some(id) => UserId::Remote(id),
        None => pending_id(),
    };
    LocalUser {
        id,
        first_name,
        last_name,
        email: remote.email.unwrap_or_default(),
        department: remote.company.and_then(|c| c.name).unwrap_or_default(),
    }
}

/// Build the create/update body from form input.
pub fn to_remote(input: &UserInput) -> UserPayload {
    UserPayload {
        name: format!("{} {}", input.first_name, input.last_name)
            .trim()
            .to_string(),
        email: input.email.clone(),
        company: RemoteCompany {
            name: Some(input.department.clone()),
        },
    }
}
