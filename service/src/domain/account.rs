//! [`Account`] definitions.

use std::sync::LazyLock;

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, DateTimeOf};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account of a staff member or an administrator.
///
/// Travellers and modifiers of [`Trip`]s are [`Account`]s.
///
/// [`Trip`]: crate::domain::Trip
#[derive(Clone, Debug)]
pub struct Account {
    /// ID of this [`Account`].
    pub id: Id,

    /// [`Username`] of this [`Account`].
    pub username: Username,

    /// [`Role`] of this [`Account`].
    pub role: Role,

    /// Indicator whether this [`Account`] is active.
    pub is_active: bool,

    /// [`DateTime`] when this [`Account`] was created.
    pub created_at: CreationDateTime,
}

/// ID of an [`Account`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Username of an [`Account`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Username(String);

impl Username {
    /// Creates a new [`Username`] if the given `username` is valid.
    #[must_use]
    pub fn new(username: impl Into<String>) -> Option<Self> {
        let username = username.into();
        Self::check(&username).then_some(Self(username))
    }

    /// Checks whether the given `username` is a valid [`Username`].
    fn check(username: impl AsRef<str>) -> bool {
        /// Regular expression checking [`Username`] invariants:
        /// - Must not be empty;
        /// - Must contain only letters, digits, dots, underscores and dashes;
        /// - Must be at most 100 characters long.
        static REGEX: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"^[\p{L}\p{N}._-]{1,100}$").expect("valid regex")
        });

        REGEX.is_match(username.as_ref())
    }

    /// Indicates whether this [`Username`] matches the `other` one
    /// case-insensitively.
    #[must_use]
    pub fn matches(&self, other: &Self) -> bool {
        self.0.to_lowercase() == other.0.to_lowercase()
    }
}

impl FromStr for Username {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Username`")
    }
}

define_kind! {
    #[doc = "Role of an [`Account`]."]
    enum Role {
        #[doc = "Administrator managing all the [`Trip`]s.\n\n\
                 [`Trip`]: crate::domain::Trip"]
        Admin = 1,

        #[doc = "Staff member taking [`Trip`]s.\n\n\
                 [`Trip`]: crate::domain::Trip"]
        Staff = 2,
    }
}

/// [`DateTime`] when an [`Account`] was created.
pub type CreationDateTime = DateTimeOf<(Account, unit::Creation)>;

/// Change of the [`Account::is_active`] indicator.
#[derive(Clone, Copy, Debug)]
pub struct Activation {
    /// ID of the [`Account`] to change.
    pub id: Id,

    /// New value of the indicator.
    pub is_active: bool,
}
