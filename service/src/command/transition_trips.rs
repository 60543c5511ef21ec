//! [`Command`] for transitioning [`Trip`]s along their lifecycle in bulk.

use common::operations::Update;
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::trip::{self, Transition},
    error::{Classify, ErrorKind},
    infra::{database, Database},
    Service,
};
#[cfg(doc)]
use crate::domain::{trip::Status, Trip};

use super::Command;

/// [`Command`] for transitioning [`Trip`]s along their lifecycle in bulk.
///
/// - [`Status::Upcoming`] trips departed by today become [`Status::Active`];
/// - [`Status::Active`] trips returned before today become
///   [`Status::Completed`].
///
/// Transitioned [`Trip`]s get their [`trip::Version`] advanced and no
/// modifier. Repeating it on the same day changes nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct TransitionTrips;

/// Numbers of [`Trip`]s transitioned by [`TransitionTrips`].
#[derive(Clone, Copy, Debug, Default, Display, Eq, PartialEq)]
#[display("activated: {activated}, completed: {completed}")]
pub struct Transitioned {
    /// Number of [`Trip`]s became [`Status::Active`].
    pub activated: u64,

    /// Number of [`Trip`]s became [`Status::Completed`].
    pub completed: u64,
}

impl<Db> Command<TransitionTrips> for Service<Db>
where
    Db: Database<
        Update<trip::Sweep>,
        Ok = u64,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Transitioned;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, _: TransitionTrips) -> Result<Self::Ok, Self::Err> {
        let today = self.clock().today();
        let sweep = |transition| trip::Sweep {
            transition,
            today,
            at: self.clock().now().coerce(),
        };

        let activated = self
            .database()
            .execute(Update(sweep(Transition::Activation)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> ExecutionError))?;
        let completed = self
            .database()
            .execute(Update(sweep(Transition::Completion)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> ExecutionError))?;

        let transitioned = Transitioned {
            activated,
            completed,
        };
        log::info!(%today, "`Trip`s transitioned: {transitioned}");

        Ok(transitioned)
    }
}

/// Error of [`TransitionTrips`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),
}

impl Classify for ExecutionError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Db(e) => e.kind(),
        }
    }
}
