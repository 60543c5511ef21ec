//! [`Command`] for activating or deactivating an [`Account`].

use common::operations::Update;
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{account, Account},
    error::{Classify, ErrorKind},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for activating or deactivating an [`Account`].
///
/// Inactive [`Account`]s cannot travel on new [`Trip`]s.
///
/// [`Trip`]: crate::domain::Trip
#[derive(Clone, Copy, Debug)]
pub struct SetAccountActive {
    /// ID of the [`Account`] to change.
    pub id: account::Id,

    /// Whether the [`Account`] should be active.
    pub is_active: bool,
}

impl<Db> Command<SetAccountActive> for Service<Db>
where
    Db: Database<
        Update<account::Activation>,
        Ok = Option<Account>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Account;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: SetAccountActive,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let SetAccountActive { id, is_active } = cmd;

        let account = self
            .database()
            .execute(Update(account::Activation { id, is_active }))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::AccountNotExists(id))
            .map_err(tracerr::wrap!())?;

        log::info!(account_id = %id, is_active, "`Account` activity changed");

        Ok(account)
    }
}

/// Error of [`SetAccountActive`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Account`] doesn't exist.
    #[display("`Account(id: {_0})` does not exist")]
    AccountNotExists(#[error(not(source))] account::Id),
}

impl Classify for ExecutionError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Db(e) => e.kind(),
            Self::AccountNotExists(_) => ErrorKind::NotFound,
        }
    }
}
