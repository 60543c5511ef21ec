//! [`Query`] collection related to a single [`Trip`].

use common::operations::By;

use crate::domain::{trip, Trip};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries a [`Trip`] by its [`trip::Id`].
pub type ById = DatabaseQuery<By<Option<Trip>, trip::Id>>;
