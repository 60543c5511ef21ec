//! [`Command`] for creating a new [`Trip`].

use common::operations::{By, Insert, Select};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{account, company, trip, Account, Company, Trip},
    error::{Classify, ErrorKind},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating a new [`Trip`].
#[derive(Clone, Debug)]
pub struct CreateTrip {
    /// ID of the traveller [`Account`].
    pub traveller_id: account::Id,

    /// ID of the [`Company`] to group the [`Trip`] under, if any.
    pub company_id: Option<company::Id>,

    /// [`trip::Name`] of a new [`Trip`].
    pub name: trip::Name,

    /// [`trip::Email`] of a new [`Trip`].
    pub email: trip::Email,

    /// [`trip::Notes`] of a new [`Trip`].
    pub notes: Option<trip::Notes>,

    /// [`trip::DepartureDate`] of a new [`Trip`].
    pub departs_on: trip::DepartureDate,

    /// [`trip::ReturnDate`] of a new [`Trip`].
    pub returns_on: trip::ReturnDate,

    /// ID of the [`Account`] creating the [`Trip`].
    pub by: account::Id,
}

impl<Db> Command<CreateTrip> for Service<Db>
where
    Db: Database<
            Select<By<Option<Account>, account::Id>>,
            Ok = Option<Account>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Company>, company::Id>>,
            Ok = Option<Company>,
            Err = Traced<database::Error>,
        > + Database<Insert<Trip>, Err = Traced<database::Error>>,
{
    type Ok = Trip;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateTrip) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateTrip {
            traveller_id,
            company_id,
            name,
            email,
            notes,
            departs_on,
            returns_on,
            by,
        } = cmd;

        let dates = trip::Dates::new(departs_on, returns_on)
            .ok_or(E::InvalidDates(departs_on, returns_on))
            .map_err(tracerr::wrap!())?;

        let traveller = self
            .database()
            .execute(Select(By::<Option<Account>, _>::new(traveller_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        match traveller {
            None => {
                return Err(tracerr::new!(E::TravellerNotExists(traveller_id)));
            }
            Some(a) if !a.is_active => {
                return Err(tracerr::new!(E::TravellerInactive(traveller_id)));
            }
            Some(_) => {}
        }

        if let Some(company_id) = company_id {
            let company = self
                .database()
                .execute(Select(By::<Option<Company>, _>::new(company_id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;
            match company {
                None => {
                    return Err(tracerr::new!(E::CompanyNotExists(company_id)));
                }
                Some(c) if !c.is_active => {
                    return Err(tracerr::new!(E::CompanyInactive(company_id)));
                }
                Some(_) => {}
            }
        }

        let now = self.clock().now();
        let trip = Trip {
            id: trip::Id::new(),
            traveller_id,
            company_id,
            name,
            email,
            notes,
            dates,
            status: trip::Status::resolve(dates, self.clock().today()),
            version: trip::Version::INITIAL,
            created_at: now.coerce(),
            modified_at: now.coerce(),
            modified_by: Some(by),
        };

        self.database()
            .execute(Insert(trip.clone()))
            .await
            .map(drop)
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        log::debug!(
            trip_id = %trip.id,
            status = %trip.status,
            "`Trip` created",
        );

        Ok(trip)
    }
}

/// Error of [`CreateTrip`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Departure goes after return.
    #[display("Departure on {_0} goes after return on {_1}")]
    InvalidDates(trip::DepartureDate, trip::ReturnDate),

    /// Traveller [`Account`] doesn't exist.
    #[display("`Account(id: {_0})` does not exist")]
    TravellerNotExists(#[error(not(source))] account::Id),

    /// Traveller [`Account`] is deactivated.
    #[display("`Account(id: {_0})` is inactive")]
    TravellerInactive(#[error(not(source))] account::Id),

    /// [`Company`] doesn't exist.
    #[display("`Company(id: {_0})` does not exist")]
    CompanyNotExists(#[error(not(source))] company::Id),

    /// [`Company`] is deactivated.
    #[display("`Company(id: {_0})` is inactive")]
    CompanyInactive(#[error(not(source))] company::Id),
}

impl Classify for ExecutionError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Db(e) => e.kind(),
            Self::InvalidDates(..)
            | Self::TravellerInactive(_)
            | Self::CompanyInactive(_) => ErrorKind::Validation,
            Self::TravellerNotExists(_) | Self::CompanyNotExists(_) => {
                ErrorKind::NotFound
            }
        }
    }
}
