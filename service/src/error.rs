//! Classification of [`Service`] errors.
//!
//! [`Service`]: crate::Service

use derive_more::Display;
use tracerr::Traced;

use crate::infra::database;

/// Kind of a failure, independent of the operation that failed.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
#[expect(clippy::module_name_repetitions, reason = "more readable")]
pub enum ErrorKind {
    /// Input is malformed or breaks an invariant.
    #[display("VALIDATION")]
    Validation,

    /// Referenced entity doesn't exist.
    #[display("NOT_FOUND")]
    NotFound,

    /// Entity was modified concurrently.
    #[display("VERSION_CONFLICT")]
    VersionConflict,

    /// Storage failed or timed out, so the operation may be retried.
    #[display("TRANSIENT_STORAGE")]
    TransientStorage,
}

/// Helper trait classifying errors into [`ErrorKind`]s.
pub trait Classify {
    /// Returns [`ErrorKind`] of this error.
    fn kind(&self) -> ErrorKind;
}

impl<E: Classify> Classify for Traced<E> {
    fn kind(&self) -> ErrorKind {
        self.as_ref().kind()
    }
}

impl Classify for database::Error {
    fn kind(&self) -> ErrorKind {
        ErrorKind::TransientStorage
    }
}
