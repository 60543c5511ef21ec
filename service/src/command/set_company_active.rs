//! [`Command`] for activating or deactivating a [`Company`].

use common::operations::Update;
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{company, Company},
    error::{Classify, ErrorKind},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for activating or deactivating a [`Company`].
///
/// New [`Trip`]s cannot be grouped under an inactive [`Company`].
///
/// [`Trip`]: crate::domain::Trip
#[derive(Clone, Copy, Debug)]
pub struct SetCompanyActive {
    /// ID of the [`Company`] to change.
    pub id: company::Id,

    /// Whether the [`Company`] should be active.
    pub is_active: bool,
}

impl<Db> Command<SetCompanyActive> for Service<Db>
where
    Db: Database<
        Update<company::Activation>,
        Ok = Option<Company>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Company;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: SetCompanyActive,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let SetCompanyActive { id, is_active } = cmd;

        self.database()
            .execute(Update(company::Activation { id, is_active }))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::CompanyNotExists(id))
            .map_err(tracerr::wrap!())
    }
}

/// Error of [`SetCompanyActive`] [`Command`] execution.
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
