//! [`Command`] for updating a [`Trip`] under optimistic concurrency control.

use common::{
    operations::{By, Select, Update},
    Date,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        account, company,
        trip::{self, Status},
        Company, Trip,
    },
    error::{Classify, ErrorKind},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for updating a [`Trip`].
///
/// Applies only if the [`Trip`] is still of the expected [`trip::Version`],
/// otherwise [`ExecutionError::Conflict`] is returned with its current state.
#[derive(Clone, Debug)]
pub struct UpdateTrip {
    /// ID of the [`Trip`] to update.
    pub id: trip::Id,

    /// [`trip::Version`] of the [`Trip`] the [`Patch`] was made against.
    pub version: trip::Version,

    /// [`Patch`] to apply.
    pub patch: Patch,

    /// ID of the [`Account`] updating the [`Trip`].
    ///
    /// [`Account`]: crate::domain::Account
    pub by: account::Id,
}

/// Changes of a [`Trip`].
///
/// [`None`] fields are left untouched.
#[derive(Clone, Debug, Default)]
pub struct Patch {
    /// New [`Company`] of the [`Trip`], or its removal.
    pub company_id: Option<Option<company::Id>>,

    /// New [`trip::Name`] of the [`Trip`].
    pub name: Option<trip::Name>,

    /// New [`trip::Email`] of the [`Trip`].
    pub email: Option<trip::Email>,

    /// New [`trip::Notes`] of the [`Trip`], or their removal.
    pub notes: Option<Option<trip::Notes>>,

    /// New [`trip::DepartureDate`] of the [`Trip`].
    pub departs_on: Option<trip::DepartureDate>,

    /// New [`trip::ReturnDate`] of the [`Trip`].
    pub returns_on: Option<trip::ReturnDate>,

    /// Explicitly set [`Status`] of the [`Trip`].
    pub status: Option<Status>,
}

impl<Db> Command<UpdateTrip> for Service<Db>
where
    Db: Database<
            Select<By<Option<Trip>, trip::Id>>,
            Ok = Option<Trip>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Company>, company::Id>>,
            Ok = Option<Company>,
            Err = Traced<database::Error>,
        > + Database<Update<Trip>, Ok = bool, Err = Traced<database::Error>>,
{
    type Ok = Trip;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: UpdateTrip) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdateTrip {
            id,
            version,
            patch,
            by,
        } = cmd;

        let current = self
            .database()
            .execute(Select(By::<Option<Trip>, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::TripNotExists(id))
            .map_err(tracerr::wrap!())?;
        if version > current.version {
            return Err(tracerr::new!(E::UnknownVersion(id, version)));
        }
        if current.version != version {
            log::debug!(
                trip_id = %id,
                expected = %version,
                actual = %current.version,
                "`Trip` version conflict",
            );
            return Err(tracerr::new!(E::Conflict(Box::new(current))));
        }

        if let Some(Some(company_id)) = patch.company_id {
            let company = self
                .database()
                .execute(Select(By::<Option<Company>, _>::new(company_id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;
            match company {
                None => {
                    return Err(tracerr::new!(E::CompanyNotExists(company_id)));
                }
                Some(c)
                    if !c.is_active && current.company_id != Some(company_id) =>
                {
                    return Err(tracerr::new!(E::CompanyInactive(company_id)));
                }
                Some(_) => {}
            }
        }

        let updated = patched(current, patch, self.clock().today())
            .map_err(tracerr::wrap!())?;
        let updated = Trip {
            version: version.next(),
            modified_at: self.clock().now().coerce(),
            modified_by: Some(by),
            ..updated
        };

        let applied = self
            .database()
            .execute(Update(updated.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if applied {
            return Ok(updated);
        }

        // Lost the race: tell a removal from a concurrent modification.
        let current = self
            .database()
            .execute(Select(By::<Option<Trip>, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::TripNotExists(id))
            .map_err(tracerr::wrap!())?;
        log::debug!(
            trip_id = %id,
            expected = %version,
            actual = %current.version,
            "`Trip` version conflict",
        );
        Err(tracerr::new!(E::Conflict(Box::new(current))))
    }
}

/// Applies the provided [`Patch`] to the `current` [`Trip`] observed on the
/// provided `today` date, leaving its version and modification stamps as is.
fn patched(
    current: Trip,
    patch: Patch,
    today: Date,
) -> Result<Trip, ExecutionError> {
    let Patch {
        company_id,
        name,
        email,
        notes,
        departs_on,
        returns_on,
        status,
    } = patch;

    let departs_on = departs_on.unwrap_or(current.dates.departs_on());
    let returns_on = returns_on.unwrap_or(current.dates.returns_on());
    let dates = trip::Dates::new(departs_on, returns_on)
        .ok_or(ExecutionError::InvalidDates(departs_on, returns_on))?;

    let status = status.unwrap_or_else(|| {
        let derived = Status::resolve(dates, today);
        if current.status == Status::Cancelled {
            Status::Cancelled
        } else if dates != current.dates {
            derived
        } else {
            current.status.reconcile(derived)
        }
    });

    Ok(Trip {
        company_id: company_id.unwrap_or(current.company_id),
        name: name.unwrap_or(current.name),
        email: email.unwrap_or(current.email),
        notes: notes.unwrap_or(current.notes),
        dates,
        status,
        ..current
    })
}

/// Error of [`UpdateTrip`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Trip`] doesn't exist.
    #[display("`Trip(id: {_0})` does not exist")]
    TripNotExists(#[error(not(source))] trip::Id),

    /// Expected [`trip::Version`] was never reached by the [`Trip`].
    #[display("`Trip(id: {_0})` has no version {_1} yet")]
    UnknownVersion(trip::Id, trip::Version),

    /// [`Trip`] was modified concurrently.
    #[display("`Trip(id: {})` was modified concurrently", _0.id)]
    Conflict(#[error(not(source))] Box<Trip>),

    /// [`Company`] doesn't exist.
    #[display("`Company(id: {_0})` does not exist")]
    CompanyNotExists(#[error(not(source))] company::Id),

    /// [`Company`] is deactivated.
    #[display("`Company(id: {_0})` is inactive")]
    CompanyInactive(#[error(not(source))] company::Id),

    /// Departure goes after return.
    #[display("Departure on {_0} goes after return on {_1}")]
    InvalidDates(trip::DepartureDate, trip::ReturnDate),
}

impl Classify for ExecutionError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Db(e) => e.kind(),
            Self::TripNotExists(_) | Self::CompanyNotExists(_) => {
                ErrorKind::NotFound
            }
            Self::Conflict(_) => ErrorKind::VersionConflict,
            Self::UnknownVersion(..)
            | Self::CompanyInactive(_)
            | Self::InvalidDates(..) => ErrorKind::Validation,
        }
    }
}

#[cfg(test)]
mod spec {
    use common::{Date, DateTime};

    use crate::domain::{
        account,
        trip::{self, Status},
        Trip,
    };

    use super::{patched, Patch};

    fn date(s: &str) -> Date {
        Date::normalize(s).unwrap()
    }

    fn trip(departure: &str, r#return: &str, status: Status) -> Trip {
        let now = DateTime::from_rfc3339("2025-03-01T09:00:00Z").unwrap();
        Trip {
            id: trip::Id::new(),
            traveller_id: account::Id::new(),
            company_id: None,
            name: trip::Name::new("Jane Doe").unwrap(),
            email: trip::Email::new("jane@example.com").unwrap(),
            notes: None,
            dates: trip::Dates::new(
                date(departure).coerce(),
                date(r#return).coerce(),
            )
            .unwrap(),
            status,
            version: trip::Version::INITIAL,
            created_at: now.coerce(),
            modified_at: now.coerce(),
            modified_by: None,
        }
    }

    #[test]
    fn explicit_status_wins() {
        let t = trip("2025-03-10", "2025-03-20", Status::Upcoming);
        let patch = Patch {
            status: Some(Status::Cancelled),
            ..Patch::default()
        };

        let t = patched(t, patch, date("2025-03-01")).unwrap();
        assert_eq!(t.status, Status::Cancelled);
    }

    #[test]
    fn cancelled_stays_on_date_change() {
        let t = trip("2025-03-10", "2025-03-20", Status::Cancelled);
        let patch = Patch {
            departs_on: Some(date("2025-02-20").coerce()),
            ..Patch::default()
        };

        let t = patched(t, patch, date("2025-03-01")).unwrap();
        assert_eq!(t.status, Status::Cancelled);
    }

    #[test]
    fn date_change_resolves_status_afresh() {
        let t = trip("2025-02-20", "2025-02-25", Status::Completed);
        let patch = Patch {
            returns_on: Some(date("2025-03-05").coerce()),
            ..Patch::default()
        };

        let t = patched(t, patch, date("2025-03-01")).unwrap();
        assert_eq!(t.status, Status::Active);
    }

    #[test]
    fn unchanged_dates_never_regress_status() {
        let t = trip("2025-03-10", "2025-03-20", Status::Active);
        let patch = Patch {
            name: Some(trip::Name::new("John Doe").unwrap()),
            ..Patch::default()
        };

        let t = patched(t, patch, date("2025-03-01")).unwrap();
        assert_eq!(t.status, Status::Active);
        assert_eq!(t.name.to_string(), "John Doe");
    }

    #[test]
    fn rejects_inverted_dates() {
        let t = trip("2025-03-10", "2025-03-20", Status::Upcoming);
        let patch = Patch {
            departs_on: Some(date("2025-03-21").coerce()),
            ..Patch::default()
        };

        assert!(patched(t, patch, date("2025-03-01")).is_err());
    }

    #[test]
    fn clears_optional_fields() {
        let mut t = trip("2025-03-10", "2025-03-20", Status::Upcoming);
        t.notes = trip::Notes::new("window seat");
        let patch = Patch {
            notes: Some(None),
            ..Patch::default()
        };

        let t = patched(t, patch, date("2025-03-01")).unwrap();
        assert_eq!(t.notes, None);
    }
}
