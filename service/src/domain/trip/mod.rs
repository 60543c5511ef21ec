//! [`Trip`] definitions.

pub mod status;

use std::sync::LazyLock;

#[cfg(doc)]
use common::DateTime;
use common::{unit, Date, DateOf, DateTimeOf};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{account, company};

pub use self::status::Status;

/// Overseas trip taken by a single traveller.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Trip {
    /// ID of this [`Trip`].
    pub id: Id,

    /// ID of the traveller [`Account`] taking this [`Trip`].
    ///
    /// [`Account`]: crate::domain::Account
    pub traveller_id: account::Id,

    /// ID of the [`Company`] this [`Trip`] is grouped under, if any.
    ///
    /// [`Company`]: crate::domain::Company
    pub company_id: Option<company::Id>,

    /// Display [`Name`] of this [`Trip`].
    pub name: Name,

    /// Contact [`Email`] of this [`Trip`].
    pub email: Email,

    /// Free-text [`Notes`] of this [`Trip`], if any.
    pub notes: Option<Notes>,

    /// Departure and return [`Dates`] of this [`Trip`].
    pub dates: Dates,

    /// Stored [`Status`] of this [`Trip`].
    ///
    /// May lag behind the [`Dates`] until the next batch transition, so
    /// prefer [`Trip::display_status()`] for showing it.
    pub status: Status,

    /// [`Version`] of this [`Trip`].
    pub version: Version,

    /// [`DateTime`] when this [`Trip`] was created.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`Trip`] was modified last time.
    pub modified_at: ModificationDateTime,

    /// ID of the [`Account`] modified this [`Trip`] last time.
    ///
    /// [`None`] for system modifications.
    ///
    /// [`Account`]: crate::domain::Account
    pub modified_by: Option<account::Id>,
}

impl Trip {
    /// Returns [`Status`] of this [`Trip`] as observed on the provided `today`
    /// [`Date`].
    #[must_use]
    pub fn display_status(&self, today: Date) -> Status {
        self.status.reconcile(Status::resolve(self.dates, today))
    }
}

/// ID of a [`Trip`].
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

/// Display name of a [`Trip`].
#[derive(AsRef, Clone, Debug, Display, Eq, Ord, PartialEq, PartialOrd)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Name(String);

impl Name {
    /// Creates a new [`Name`] if the given `name` is valid.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        Self::check(&name).then_some(Self(name))
    }

    /// Checks whether the given `name` is a valid [`Name`].
    fn check(name: impl AsRef<str>) -> bool {
        let name = name.as_ref();
        name.trim() == name && !name.is_empty() && name.chars().count() <= 150
    }
}

impl FromStr for Name {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Name`")
    }
}

/// Contact email address of a [`Trip`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Email(String);

impl Email {
    /// Creates a new [`Email`] if the given `address` is valid.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Option<Self> {
        let address = address.into();
        Self::check(&address).then_some(Self(address))
    }

    /// Checks whether the given `address` is a valid [`Email`].
    fn check(address: impl AsRef<str>) -> bool {
        /// Regular expression checking [`Email`] format.
        static REGEX: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(
                "^([^\\x00-\\x20\\x22\\x28\\x29\\x2c\\x2e\\x3a-\
                     \\x3c\\x3e\\x40\\x5b-\\x5d\\x7f-\\xff]+\
                  |\\x22([^\\x0d\\x22\\x5c\\x80-\\xff]\
                  |\\x5c[\\x00-\\x7f])*\\x22)\
                  (\\x2e([^\\x00-\\x20\\x22\\x28\\x29\\x2c\\x2e\\x3a-\
                           \\x3c\\x3e\\x40\\x5b-\\x5d\\x7f-\\xff]+\
                        |\\x22([^\\x0d\\x22\\x5c\\x80-\\xff]\
                        |\\x5c[\\x00-\\x7f])*\\x22))*\\x40\
                  ([^\\x00-\\x20\\x22\\x28\\x29\\x2c\\x2e\\x3a-\
                     \\x3c\\x3e\\x40\\x5b-\\x5d\\x7f-\\xff]+\
                  |\\x5b([^\\x0d\\x5b-\\x5d\\x80-\\xff]\
                        |\\x5c[\\x00-\\x7f])*\\x5d)\
                  (\\x2e([^\\x00-\\x20\\x22\\x28\\x29\\x2c\\x2e\\x3a-\
                           \\x3c\\x3e\\x40\\x5b-\\x5d\\x7f-\\xff]+\
                        |\\x5b([^\\x0d\\x5b-\\x5d\\x80-\\xff]\
                        |\\x5c[\\x00-\\x7f])*\\x5d))*$",
            )
            .expect("valid regex")
        });

        REGEX.is_match(address.as_ref())
    }
}

impl FromStr for Email {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Email`")
    }
}

/// Free-text notes of a [`Trip`].
///
/// Blank notes are not [`Notes`], but their absence.
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Notes(String);

impl Notes {
    /// Creates new [`Notes`] if the given `text` is valid.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        Self::check(&text).then_some(Self(text))
    }

    /// Creates optional [`Notes`] out of the given `text`, treating blank
    /// `text` as no [`Notes`] at all.
    ///
    /// # Errors
    ///
    /// If the given non-blank `text` is not valid [`Notes`].
    pub fn new_opt(
        text: Option<impl Into<String>>,
    ) -> Result<Option<Self>, &'static str> {
        let Some(text) = text.map(Into::into) else {
            return Ok(None);
        };
        if text.trim().is_empty() {
            return Ok(None);
        }
        Self::new(text).map(Some).ok_or("invalid `Notes`")
    }

    /// Checks whether the given `text` are valid [`Notes`].
    fn check(text: impl AsRef<str>) -> bool {
        let text = text.as_ref();
        !text.trim().is_empty() && text.chars().count() <= 4096
    }
}

/// Departure [`Date`] of a [`Trip`].
pub type DepartureDate = DateOf<(Trip, unit::Departure)>;

/// Return [`Date`] of a [`Trip`].
pub type ReturnDate = DateOf<(Trip, unit::Return)>;

/// Departure and return [`Date`]s of a [`Trip`].
///
/// Departure never goes after return.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Dates {
    /// [`DepartureDate`] of a [`Trip`].
    departure: DepartureDate,

    /// [`ReturnDate`] of a [`Trip`].
    r#return: ReturnDate,
}

impl Dates {
    /// Creates new [`Dates`] if the `departure` doesn't go after the
    /// `return`.
    #[must_use]
    pub fn new(departure: DepartureDate, r#return: ReturnDate) -> Option<Self> {
        (departure.coerce::<()>() <= r#return.coerce::<()>())
            .then_some(Self { departure, r#return })
    }

    /// Creates new [`Dates`] without checking them.
    ///
    /// # Safety
    ///
    /// The caller must ensure that the `departure` doesn't go after the
    /// `return`.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub const unsafe fn new_unchecked(
        departure: DepartureDate,
        r#return: ReturnDate,
    ) -> Self {
        Self { departure, r#return }
    }

    /// Returns the [`DepartureDate`].
    #[must_use]
    pub fn departs_on(&self) -> DepartureDate {
        self.departure
    }

    /// Returns the [`ReturnDate`].
    #[must_use]
    pub fn returns_on(&self) -> ReturnDate {
        self.r#return
    }

    /// Returns these [`Dates`] with the provided [`ReturnDate`], if they stay
    /// valid.
    #[must_use]
    pub fn with_return(self, r#return: ReturnDate) -> Option<Self> {
        Self::new(self.departure, r#return)
    }
}

/// Version of a [`Trip`] used for optimistic concurrency control.
///
/// Starts at [`Version::INITIAL`] and grows by one with every mutation.
#[derive(
    Clone,
    Copy,
    Debug,
    Display,
    Eq,
    From,
    Hash,
    Into,
    Ord,
    PartialEq,
    PartialOrd,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Version(i32);

impl Version {
    /// [`Version`] of a newly created [`Trip`].
    pub const INITIAL: Self = Self(1);

    /// Returns the [`Version`] following this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Returns the [`Version`] preceding this one, if any.
    #[must_use]
    pub const fn previous(self) -> Option<Self> {
        if self.0 > Self::INITIAL.0 {
            Some(Self(self.0 - 1))
        } else {
            None
        }
    }
}

/// Forced completion of a [`Trip`] as "returned".
#[derive(Clone, Copy, Debug)]
pub struct Completion {
    /// ID of the completed [`Trip`].
    pub id: Id,

    /// [`ReturnDate`] to be set.
    ///
    /// Completion applies only if it doesn't go before the [`DepartureDate`].
    pub returns_on: ReturnDate,

    /// [`DateTime`] of the completion.
    pub at: ModificationDateTime,

    /// ID of the [`Account`] completing the [`Trip`].
    ///
    /// [`Account`]: crate::domain::Account
    pub by: Option<account::Id>,
}

/// Detachment of all the [`Trip`]s from a removed [`Company`].
///
/// Every detached [`Trip`] gets its [`Version`] bumped.
///
/// [`Company`]: crate::domain::Company
#[derive(Clone, Copy, Debug)]
pub struct Detachment {
    /// ID of the [`Company`] to detach the [`Trip`]s from.
    ///
    /// [`Company`]: crate::domain::Company
    pub company_id: company::Id,

    /// [`DateTime`] of the detachment.
    pub at: ModificationDateTime,
}

/// Bulk [`Status`] transition of all the [`Trip`]s due to it.
#[derive(Clone, Copy, Debug)]
pub struct Sweep {
    /// [`Transition`] to be applied.
    pub transition: Transition,

    /// Current [`Date`] the due [`Trip`]s are detected by.
    pub today: Date,

    /// [`DateTime`] of the transition.
    pub at: ModificationDateTime,
}

/// Kind of a bulk [`Status`] transition.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum Transition {
    /// [`Status::Upcoming`] trips departed by today become
    /// [`Status::Active`].
    Activation,

    /// [`Status::Active`] trips returned before today become
    /// [`Status::Completed`].
    Completion,
}

/// [`DateTime`] when a [`Trip`] was created.
pub type CreationDateTime = DateTimeOf<(Trip, unit::Creation)>;

/// [`DateTime`] when a [`Trip`] was modified.
pub type ModificationDateTime = DateTimeOf<(Trip, unit::Modification)>;
