//! [`Query`] collection related to [`Company`]s.

use common::operations::By;

use crate::domain::{company, Company};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries a [`Company`] by its [`company::Id`].
pub type ById = DatabaseQuery<By<Option<Company>, company::Id>>;

/// Queries a [`Company`] by its [`company::Name`], case-insensitively.
pub type ByName<'n> = DatabaseQuery<By<Option<Company>, &'n company::Name>>;

/// Queries all the [`Company`]s, ordered by their names.
pub type All = DatabaseQuery<By<Vec<Company>, ()>>;
