//! [`Command`] for marking a [`Trip`] as returned.

use common::operations::{By, Select, Update};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{account, trip, Trip},
    error::{Classify, ErrorKind},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for marking a [`Trip`] as returned.
///
/// Forces [`trip::Status::Completed`] regardless of the [`trip::Dates`], and
/// advances the [`trip::Version`] in a single atomic write.
#[derive(Clone, Copy, Debug)]
pub struct MarkTripReturned {
    /// ID of the returned [`Trip`].
    pub id: trip::Id,

    /// [`trip::ReturnDate`] of the [`Trip`].
    ///
    /// Today, if [`None`].
    pub returns_on: Option<trip::ReturnDate>,

    /// ID of the [`Account`] marking the [`Trip`].
    ///
    /// [`Account`]: crate::domain::Account
    pub by: account::Id,
}

impl<Db> Command<MarkTripReturned> for Service<Db>
where
    Db: Database<
            Update<trip::Completion>,
            Ok = Option<Trip>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Trip>, trip::Id>>,
            Ok = Option<Trip>,
            Err = Traced<database::Error>,
        >,
{
    type Ok = Trip;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: MarkTripReturned,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let MarkTripReturned {
            id,
            returns_on,
            by,
        } = cmd;
        let returns_on =
            returns_on.unwrap_or_else(|| self.clock().today().coerce());

        let completed = self
            .database()
            .execute(Update(trip::Completion {
                id,
                returns_on,
                at: self.clock().now().coerce(),
                by: Some(by),
            }))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if let Some(trip) = completed {
            log::debug!(trip_id = %id, returns_on = %returns_on, "`Trip` returned");
            return Ok(trip);
        }

        let trip = self
            .database()
            .execute(Select(By::<Option<Trip>, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::TripNotExists(id))
            .map_err(tracerr::wrap!())?;
        Err(tracerr::new!(E::ReturnBeforeDeparture(
            returns_on,
            trip.dates.departs_on(),
        )))
    }
}

/// Error of [`MarkTripReturned`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Trip`] doesn't exist.
    #[display("`Trip(id: {_0})` does not exist")]
    TripNotExists(#[error(not(source))] trip::Id),

    /// Return goes before departure.
    #[display("Return on {_0} goes before departure on {_1}")]
    ReturnBeforeDeparture(trip::ReturnDate, trip::DepartureDate),
}

impl Classify for ExecutionError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Db(e) => e.kind(),
            Self::TripNotExists(_) => ErrorKind::NotFound,
            Self::ReturnBeforeDeparture(..) => ErrorKind::Validation,
        }
    }
}
