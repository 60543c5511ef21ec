//! [`Command`] for creating a new [`Company`].

use common::operations::{By, Insert, Select};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{company, Company},
    error::{Classify, ErrorKind},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating a new [`Company`].
#[derive(Clone, Debug)]
pub struct CreateCompany {
    /// [`company::Name`] of a new [`Company`].
    pub name: company::Name,
}

impl<Db> Command<CreateCompany> for Service<Db>
where
    Db: for<'l> Database<
            Select<By<Option<Company>, &'l company::Name>>,
            Ok = Option<Company>,
            Err = Traced<database::Error>,
        > + Database<Insert<Company>, Err = Traced<database::Error>>,
{
    type Ok = Company;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateCompany) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateCompany { name } = cmd;

        let existing = self
            .database()
            .execute(Select(By::new(&name)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if existing.is_some() {
            return Err(tracerr::new!(E::NameOccupied(name)));
        }

        let company = Company {
            id: company::Id::new(),
            name,
            is_active: true,
            created_at: self.clock().now().coerce(),
        };

        match self.database().execute(Insert(company.clone())).await {
            Ok(_) => Ok(company),
            Err(e) if e.as_ref().is_unique_violation(None) => {
                Err(tracerr::new!(E::NameOccupied(company.name)))
            }
            Err(e) => Err(e).map_err(tracerr::map_from_and_wrap!(=> E)),
        }
    }
}

/// Error of [`CreateCompany`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`company::Name`] is already occupied.
    #[display("`{_0}` company already exists")]
    NameOccupied(#[error(not(source))] company::Name),
}

impl Classify for ExecutionError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Db(e) => e.kind(),
            Self::NameOccupied(_) => ErrorKind::Validation,
        }
    }
}
