//! [`Status`] of a [`Trip`] and its resolution.

use common::{define_kind, Date};

#[cfg(doc)]
use super::Trip;
use super::Dates;

define_kind! {
    #[doc = "Lifecycle status of a [`Trip`]."]
    enum Status {
        #[doc = "[`Trip`] hasn't departed yet."]
        Upcoming = 1,

        #[doc = "[`Trip`] is in progress."]
        Active = 2,

        #[doc = "[`Trip`] is over."]
        Completed = 3,

        #[doc = "[`Trip`] was called off."]
        Cancelled = 4,
    }
}

impl Status {
    /// Derives the [`Status`] of a [`Trip`] with the provided [`Dates`] as
    /// observed on the provided `today` [`Date`].
    ///
    /// Never derives [`Status::Cancelled`].
    #[must_use]
    pub fn resolve(dates: Dates, today: Date) -> Self {
        if dates.returns_on().coerce::<()>() < today {
            Self::Completed
        } else if dates.departs_on().coerce::<()>() <= today {
            Self::Active
        } else {
            Self::Upcoming
        }
    }

    /// Reconciles this stored [`Status`] with the `derived` one.
    ///
    /// The result never goes backwards along the `UPCOMING → ACTIVE →
    /// COMPLETED` lifecycle, and [`Status::Cancelled`] always stays.
    #[must_use]
    pub fn reconcile(self, derived: Self) -> Self {
        match (self, derived) {
            (Self::Cancelled, _) | (_, Self::Cancelled) => self,
            (
                Self::Upcoming | Self::Active | Self::Completed,
                Self::Upcoming | Self::Active | Self::Completed,
            ) => {
                if derived.rank() > self.rank() {
                    derived
                } else {
                    self
                }
            }
        }
    }

    /// Returns position of this [`Status`] along the lifecycle.
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Upcoming => 0,
            Self::Active => 1,
            Self::Completed => 2,
            Self::Cancelled => 3,
        }
    }

    /// Parses the provided `label` into a [`Status`], case-insensitively.
    ///
    /// Accepts `RETURNED` as [`Status::Completed`] and `PLANNED` as
    /// [`Status::Upcoming`].
    #[must_use]
    pub fn parse(label: &str) -> Option<Self> {
        let label = label.trim().to_ascii_uppercase();
        match label.as_str() {
            "RETURNED" => Some(Self::Completed),
            "PLANNED" => Some(Self::Upcoming),
            s => s.parse().ok(),
        }
    }
}

#[cfg(test)]
mod spec {
    use common::Date;
    use proptest::prelude::*;

    use super::{Dates, Status};

    fn date(s: &str) -> Date {
        Date::normalize(s).unwrap()
    }

    fn dates(departure: &str, r#return: &str) -> Dates {
        Dates::new(date(departure).coerce(), date(r#return).coerce()).unwrap()
    }

    fn shifted(base: Date, days: i32) -> Date {
        let mut d = base;
        for _ in 0..days.unsigned_abs() {
            d = if days < 0 {
                d.previous_day().unwrap()
            } else {
                d.next_day().unwrap()
            };
        }
        d
    }

    #[test]
    fn resolves_by_dates() {
        let d = dates("2025-03-10", "2025-03-20");

        assert_eq!(Status::resolve(d, date("2025-03-01")), Status::Upcoming);
        assert_eq!(Status::resolve(d, date("2025-03-09")), Status::Upcoming);
        assert_eq!(Status::resolve(d, date("2025-03-10")), Status::Active);
        assert_eq!(Status::resolve(d, date("2025-03-20")), Status::Active);
        assert_eq!(Status::resolve(d, date("2025-03-21")), Status::Completed);
    }

    #[test]
    fn same_day_trip_is_active_that_day() {
        let d = dates("2025-03-10", "2025-03-10");

        assert_eq!(Status::resolve(d, date("2025-03-10")), Status::Active);
        assert_eq!(Status::resolve(d, date("2025-03-11")), Status::Completed);
    }

    #[test]
    fn reconciles_monotonically() {
        assert_eq!(
            Status::Completed.reconcile(Status::Active),
            Status::Completed,
        );
        assert_eq!(Status::Active.reconcile(Status::Upcoming), Status::Active);
        assert_eq!(Status::Upcoming.reconcile(Status::Active), Status::Active);
        assert_eq!(
            Status::Cancelled.reconcile(Status::Completed),
            Status::Cancelled,
        );
    }

    #[test]
    fn parses_labels_with_aliases() {
        assert_eq!(Status::parse("UPCOMING"), Some(Status::Upcoming));
        assert_eq!(Status::parse("active"), Some(Status::Active));
        assert_eq!(Status::parse("Returned"), Some(Status::Completed));
        assert_eq!(Status::parse("PLANNED"), Some(Status::Upcoming));
        assert_eq!(Status::parse(" cancelled "), Some(Status::Cancelled));
        assert_eq!(Status::parse("LOST"), None);
        assert_eq!(Status::Completed.to_string(), "COMPLETED");
    }

    #[test]
    fn round_trips_codes() {
        for s in Status::ALL {
            assert_eq!(Status::from_u8(s.u8()), Some(*s));
        }
        assert_eq!(Status::from_u8(0), None);
        assert_eq!(Status::from_u8(5), None);
    }

    #[cfg(feature = "postgres")]
    #[test]
    fn decodes_stored_codes() {
        use postgres_types::{private::BytesMut, FromSql as _, ToSql as _, Type};

        let mut buf = BytesMut::new();
        _ = Status::Completed.to_sql(&Type::INT2, &mut buf).unwrap();
        assert_eq!(
            Status::from_sql(&Type::INT2, &buf).unwrap(),
            Status::Completed,
        );
        assert!(Status::from_sql(&Type::INT2, &7_i16.to_be_bytes()).is_err());
        assert!(Status::from_sql(&Type::INT2, &(-1_i16).to_be_bytes()).is_err());
    }

    proptest! {
        #[test]
        fn derivation_partitions_timeline(
            offset in -400i32..400,
            length in 0i32..60,
            today_offset in -30i32..500,
        ) {
            let base = date("2024-06-15");
            let departure = shifted(base, offset);
            let r#return = shifted(departure, length);
            let today = shifted(base, today_offset);
            let d = Dates::new(departure.coerce(), r#return.coerce()).unwrap();

            let expected = if r#return < today {
                Status::Completed
            } else if departure <= today {
                Status::Active
            } else {
                Status::Upcoming
            };
            prop_assert_eq!(Status::resolve(d, today), expected);
            prop_assert_ne!(Status::resolve(d, today), Status::Cancelled);
        }

        #[test]
        fn reconciliation_is_idempotent_and_monotonic(
            stored in prop::sample::select(Status::ALL),
            derived in prop::sample::select(&Status::ALL[..3]),
        ) {
            let once = stored.reconcile(derived);

            prop_assert_eq!(once.reconcile(derived), once);
            if stored == Status::Cancelled {
                prop_assert_eq!(once, Status::Cancelled);
            } else {
                prop_assert!(once.rank() >= stored.rank());
                prop_assert!(once.rank() >= derived.rank());
            }
        }
    }
}
