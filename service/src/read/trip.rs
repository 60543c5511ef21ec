//! [`Trip`] read model definition.

use common::Date;

use crate::domain::{trip::Status, Trip};

/// [`Trip`] along with its [`Status`] as observed at read time.
#[derive(Clone, Debug)]
pub struct View {
    /// Viewed [`Trip`].
    pub trip: Trip,

    /// [`Status`] of the [`Trip`] reconciled with its dates.
    ///
    /// May differ from the stored one until the next batch transition.
    pub status: Status,
}

impl View {
    /// Creates a new [`View`] of the provided [`Trip`] observed on the
    /// provided `today` [`Date`].
    #[must_use]
    pub fn new(trip: Trip, today: Date) -> Self {
        let status = trip.display_status(today);
        Self { trip, status }
    }
}

pub mod list {
    //! [`Trip`]s list definitions.

    use common::Date;

    use crate::domain::trip::Status;
    #[cfg(doc)]
    use crate::domain::Trip;

    /// Kind of a [`Trip`]s list.
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
    pub enum Kind {
        /// Upcoming and active [`Trip`]s, earliest departure first.
        #[default]
        Current,

        /// Completed [`Trip`]s, latest departure first.
        Completed,

        /// All the [`Trip`]s, latest departure first.
        All,
    }

    impl Kind {
        /// Indicates whether a [`Trip`] with the provided displayed [`Status`]
        /// belongs to this [`Kind`] of list.
        #[must_use]
        pub fn includes(self, status: Status) -> bool {
            match self {
                Self::Current => {
                    matches!(status, Status::Upcoming | Status::Active)
                }
                Self::Completed => status == Status::Completed,
                Self::All => true,
            }
        }

        /// Indicates whether this [`Kind`] of list is ordered by departure
        /// ascending.
        #[must_use]
        pub fn is_ascending(self) -> bool {
            self == Self::Current
        }
    }

    /// Selector of a [`Trip`]s list.
    #[derive(Clone, Copy, Debug)]
    pub struct Selector {
        /// [`Kind`] of the list.
        pub kind: Kind,

        /// Current [`Date`] the list is observed on.
        pub today: Date,
    }
}

pub mod summary {
    //! Daily [`Trip`]s summary definitions.

    use common::Date;

    #[cfg(doc)]
    use crate::domain::{trip::Status, Trip};

    use super::View;

    /// Selector of [`Trip`]s relevant to a daily [`Summary`].
    ///
    /// Selects not cancelled [`Trip`]s departing on the `today` [`Date`] or
    /// returned on the day before it.
    #[derive(Clone, Copy, Debug)]
    pub struct Selector {
        /// [`Date`] the [`Summary`] is made for.
        pub today: Date,
    }

    /// Daily summary of [`Trip`]s.
    #[derive(Clone, Debug)]
    pub struct Summary {
        /// [`Date`] this [`Summary`] is made for.
        pub today: Date,

        /// [`Trip`]s departing today.
        pub starting: Vec<View>,

        /// [`Trip`]s returned yesterday and being [`Status::Completed`].
        pub completed: Vec<View>,
    }
}
