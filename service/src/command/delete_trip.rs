//! [`Command`] for deleting a [`Trip`].

use common::operations::{By, Delete};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{trip, Trip},
    error::{Classify, ErrorKind},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for deleting a [`Trip`] permanently.
#[derive(Clone, Copy, Debug, From)]
pub struct DeleteTrip {
    /// ID of the [`Trip`] to delete.
    pub id: trip::Id,
}

impl<Db> Command<DeleteTrip> for Service<Db>
where
    Db: Database<
        Delete<By<Trip, trip::Id>>,
        Ok = bool,
        Err = Traced<database::Error>,
    >,
{
    type Ok = ();
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: DeleteTrip) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let DeleteTrip { id } = cmd;

        let existed = self
            .database()
            .execute(Delete(By::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if !existed {
            return Err(tracerr::new!(E::TripNotExists(id)));
        }
        Ok(())
    }
}

/// Error of [`DeleteTrip`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Trip`] doesn't exist.
    #[display("`Trip(id: {_0})` does not exist")]
    TripNotExists(#[error(not(source))] trip::Id),
}

impl Classify for ExecutionError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Db(e) => e.kind(),
            Self::TripNotExists(_) => ErrorKind::NotFound,
        }
    }
}
