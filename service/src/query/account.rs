//! [`Query`] collection related to [`Account`]s.

use common::operations::By;

use crate::domain::{account, Account};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries an [`Account`] by its [`account::Id`].
pub type ById = DatabaseQuery<By<Option<Account>, account::Id>>;

/// Queries all the [`Account`]s, oldest first.
pub type All = DatabaseQuery<By<Vec<Account>, ()>>;
