//! [`Command`] for creating a new [`Account`].

use common::operations::{By, Insert, Select};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{account, Account},
    error::{Classify, ErrorKind},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating a new [`Account`].
#[derive(Clone, Debug)]
pub struct CreateAccount {
    /// [`account::Username`] of a new [`Account`].
    pub username: account::Username,

    /// [`account::Role`] of a new [`Account`].
    pub role: account::Role,
}

impl<Db> Command<CreateAccount> for Service<Db>
where
    Db: for<'l> Database<
            Select<By<Option<Account>, &'l account::Username>>,
            Ok = Option<Account>,
            Err = Traced<database::Error>,
        > + Database<Insert<Account>, Err = Traced<database::Error>>,
{
    type Ok = Account;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateAccount) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateAccount { username, role } = cmd;

        let existing = self
            .database()
            .execute(Select(By::new(&username)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if existing.is_some() {
            return Err(tracerr::new!(E::UsernameOccupied(username)));
        }

        let account = Account {
            id: account::Id::new(),
            username,
            role,
            is_active: true,
            created_at: self.clock().now().coerce(),
        };

        match self.database().execute(Insert(account.clone())).await {
            Ok(_) => Ok(account),
            Err(e) if e.as_ref().is_unique_violation(None) => {
                Err(tracerr::new!(E::UsernameOccupied(account.username)))
            }
            Err(e) => Err(e).map_err(tracerr::map_from_and_wrap!(=> E)),
        }
    }
}

/// Error of [`CreateAccount`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`account::Username`] is already occupied.
    #[display("`{_0}` username is occupied")]
    UsernameOccupied(#[error(not(source))] account::Username),
}

impl Classify for ExecutionError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Db(e) => e.kind(),
            Self::UsernameOccupied(_) => ErrorKind::Validation,
        }
    }
}
