//! Background environment for running [`Task`]s.

use std::{
    error::Error,
    future::{Future, IntoFuture},
    iter,
};

use derive_more::Display;
use futures::{
    future::{self, LocalBoxFuture},
    FutureExt as _, TryFutureExt as _,
};
use tokio::task;

#[cfg(doc)]
use crate::Task;

/// Background environment for running [`Task`]s.
///
/// Does nothing until awaited.
#[derive(Debug, Default)]
pub struct Background {
    /// Local set of tasks.
    set: task::LocalSet,

    /// Handles of spawned tasks along with their names.
    handles: Vec<(&'static str, task::JoinHandle<Result<(), Box<dyn Error>>>)>,
}

impl Background {
    /// Spawns a new named [`Task`] inside the [`Background`] environment.
    pub fn spawn<F, E>(&mut self, name: &'static str, future: F)
    where
        F: Future<Output = Result<(), E>> + 'static,
        E: Error + 'static,
    {
        let handle = self
            .set
            .spawn_local(future.map_err(|e| Box::<dyn Error>::from(Box::new(e))));
        self.handles.push((name, handle));
    }

    /// Returns the number of [`Task`]s spawned in this [`Background`].
    #[must_use]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Indicates whether no [`Task`]s were spawned in this [`Background`].
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

impl IntoFuture for Background {
    type Output = Result<(), TaskError>;
    type IntoFuture = LocalBoxFuture<'static, Self::Output>;

    fn into_future(self) -> Self::IntoFuture {
        let Self { set, handles } = self;
        future::try_join_all(iter::once(set.map(Ok).boxed_local()).chain(
            handles.into_iter().map(|(name, h)| {
                h.map(move |r| match r {
                    Ok(Ok(())) => Ok(()),
                    Ok(Err(source)) => Err(TaskError { name, source }),
                    Err(e) => Err(TaskError {
                        name,
                        source: Box::new(e),
                    }),
                })
                .boxed_local()
            }),
        ))
        .map_ok(drop)
        .boxed_local()
    }
}

/// Error of a [`Task`] running in a [`Background`].
#[derive(Debug, Display)]
#[display("`{name}` task failed: {source}")]
pub struct TaskError {
    /// Name of the failed [`Task`].
    pub name: &'static str,

    /// Error the [`Task`] failed with.
    pub source: Box<dyn Error>,
}

impl Error for TaskError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&*self.source)
    }
}
