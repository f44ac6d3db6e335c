//! Domain types shared by the remote client, the store and the UI.
//!
//! `RemoteUser` is the wire shape of the mock API; `LocalUser` is the
//! flattened record the table works with.
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

/// Identifier of a record in the dataset.
///
/// `Remote` ids were assigned by the API. `Pending` ids come from a local
/// counter and mark records the API never confirmed; the two spaces never
/// overlap even when the numbers do.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum UserId {
    Remote(u64),
    Pending(u64),
}

impl UserId {
    /// Remote id to address the API with, if the record has one.
    pub fn remote(self) -> Option<u64> {
        match self {
            UserId::Remote(id) => Some(id),
            UserId::Pending(_) => None,
        }
    }

    pub fn is_pending(self) -> bool {
        matches!(self, UserId::Pending(_))
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserId::Remote(id) => write!(f, "{id}"),
            UserId::Pending(id) => write!(f, "local-{id}"),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteCompany {
    #[serde(default)]
    pub name: Option<String>,
}

/// User record as returned by the API. Unknown fields are ignored.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteUser {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub company: Option<RemoteCompany>,
}

/// Body sent on create and update.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPayload {
    pub name: String,
    pub email: String,
    pub company: RemoteCompany,
}

/// Flattened user record held in the dataset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocalUser {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub department: String,
}

impl LocalUser {
    pub fn from_input(id: UserId, input: UserInput) -> Self {
        Self {
            id,
            first_name: input.first_name,
            last_name: input.last_name,
            email: input.email,
            department: input.department,
        }
    }

    /// Overwrite the editable fields, keeping the id.
    pub fn merge(&mut self, input: UserInput) {
        self.first_name = input.first_name;
        self.last_name = input.last_name;
        self.email = input.email;
        self.department = input.department;
    }

    /// Prefill a form from this record.
    pub fn to_input(&self) -> UserInput {
        UserInput {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            department: self.department.clone(),
        }
    }

    pub fn field(&self, field: UserField) -> &str {
        match field {
            UserField::FirstName => &self.first_name,
            UserField::LastName => &self.last_name,
            UserField::Email => &self.email,
            UserField::Department => &self.department,
        }
    }
}

/// Values submitted from the add/edit form.
#[derive(Clone, Debug, Default, PartialEq, Eq, Validate)]
pub struct UserInput {
    #[validate(custom(function = "crate::validate::not_blank"))]
    pub first_name: String,
    pub last_name: String,
    #[validate(
        custom(function = "crate::validate::not_blank"),
        email(message = "invalid email format")
    )]
    pub email: String,
    pub department: String,
}

impl UserInput {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
        department: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            department: department.into(),
        }
    }

    pub fn field(&self, field: UserField) -> &str {
        match field {
            UserField::FirstName => &self.first_name,
            UserField::LastName => &self.last_name,
            UserField::Email => &self.email,
            UserField::Department => &self.department,
        }
    }

    pub fn field_mut(&mut self, field: UserField) -> &mut String {
        match field {
            UserField::FirstName => &mut self.first_name,
            UserField::LastName => &mut self.last_name,
            UserField::Email => &mut self.email,
            UserField::Department => &mut self.department,
        }
    }
}

/// The editable text fields of a user, in form/table order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UserField {
    FirstName,
    LastName,
    Email,
    Department,
}

impl UserField {
    pub const ALL: [UserField; 4] = [
        UserField::FirstName,
        UserField::LastName,
        UserField::Email,
        UserField::Department,
    ];

    pub fn label(self) -> &'static str {
        match self {
            UserField::FirstName => "First name",
            UserField::LastName => "Last name",
            UserField::Email => "Email",
            UserField::Department => "Department",
        }
    }

    /// Field name used by validation errors and config files.
    pub fn key(self) -> &'static str {
        match self {
            UserField::FirstName => "first_name",
            UserField::LastName => "last_name",
            UserField::Email => "email",
            UserField::Department => "department",
        }
    }
}
