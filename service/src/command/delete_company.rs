//! [`Command`] for deleting a [`Company`].

use common::operations::{By, Delete, Select, Update};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{company, trip, Company},
    error::{Classify, ErrorKind},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for deleting a [`Company`] permanently.
///
/// [`Trip`]s grouped under the [`Company`] stay, losing the reference to it.
///
/// [`Trip`]: crate::domain::Trip
#[derive(Clone, Copy, Debug, From)]
pub struct DeleteCompany {
    /// ID of the [`Company`] to delete.
    pub id: company::Id,
}

impl<Db> Command<DeleteCompany> for Service<Db>
where
    Db: Database<
            Select<By<Option<Company>, company::Id>>,
            Ok = Option<Company>,
            Err = Traced<database::Error>,
        > + Database<
            Update<trip::Detachment>,
            Ok = u64,
            Err = Traced<database::Error>,
        > + Database<
            Delete<By<Company, company::Id>>,
            Ok = bool,
            Err = Traced<database::Error>,
        >,
{
    /// Number of [`Trip`]s detached from the deleted [`Company`].
    ///
    /// [`Trip`]: crate::domain::Trip
    type Ok = u64;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: DeleteCompany) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let DeleteCompany { id } = cmd;

        let company = self
            .database()
            .execute(Select(By::<Option<Company>, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if company.is_none() {
            return Err(tracerr::new!(E::CompanyNotExists(id)));
        }

        let detached = self
            .database()
            .execute(Update(trip::Detachment {
                company_id: id,
                at: self.clock().now().coerce(),
            }))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let existed = self
            .database()
            .execute(Delete(By::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if !existed {
            return Err(tracerr::new!(E::CompanyNotExists(id)));
        }

        log::info!(company_id = %id, detached, "`Company` deleted");

        Ok(detached)
    }
}

/// Error of [`DeleteCompany`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Company`] doesn't exist.
    #[display("`Company(id: {_0})` does not exist")]
    CompanyNotExists(#[error(not(source))] company::Id),
}

impl Classify for ExecutionError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Db(e) => e.kind(),
            Self::CompanyNotExists(_) => ErrorKind::NotFound,
        }
    }
}
