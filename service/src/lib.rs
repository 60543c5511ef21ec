//! Service contains the business logic of the overseas trip tracker.
//!
//! List of available Cargo features:
#![doc = document_features::document_features!()]
#![deny(
    nonstandard_style,
    rust_2018_idioms,
    rustdoc::all,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code
)]
#![forbid(non_ascii_idents)]
#![warn(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    clippy::pedantic,
    clippy::wildcard_enum_match_arm,
    deprecated_in_future,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    unused_crate_dependencies,
    unused_import_braces,
    unused_labels,
    unused_lifetimes,
    unused_qualifications,
    unused_results
)]

pub mod command;
pub mod domain;
pub mod error;
pub mod infra;
pub mod query;
pub mod read;
pub mod task;

#[cfg(test)]
use proptest as _;

use std::error::Error;

use common::{
    operations::{By, Start},
    Clock,
};

#[cfg(doc)]
use infra::Database;

pub use self::{
    command::Command,
    error::{Classify, ErrorKind},
    query::Query,
    task::Task,
};

/// [`Service`] configuration.
#[derive(Clone, Copy, Debug, Default)]
pub struct Config {
    /// [`Clock`] telling the current time and day.
    pub clock: Clock,

    /// [`task::TransitionTrips`] configuration.
    pub transition_trips: task::transition_trips::Config,
}

/// Domain service.
#[derive(Clone, Debug)]
pub struct Service<Db> {
    /// Configuration of this [`Service`].
    config: Config,

    /// [`Database`] of this [`Service`].
    database: Db,
}

impl<Db> Service<Db> {
    /// Creates a new [`Service`] with the provided parameters, along with the
    /// [`task::Background`] running its periodic [`Task`]s.
    pub fn new(config: Config, database: Db) -> (Self, task::Background)
    where
        Self: Task<
                Start<
                    By<
                        task::TransitionTrips<Self>,
                        task::transition_trips::Config,
                    >,
                >,
                Ok = (),
                Err: Error,
            > + Clone
            + 'static,
    {
        let this = Self::without_tasks(config, database);

        let mut bg = task::Background::default();
        let svc = this.clone();
        bg.spawn("TransitionTrips", async move {
            svc.execute(Start(By::new(svc.config().transition_trips)))
                .await
        });

        (this, bg)
    }

    /// Creates a new [`Service`] with the provided parameters, without
    /// running any periodic [`Task`]s.
    #[must_use]
    pub fn without_tasks(config: Config, database: Db) -> Self {
        Self { config, database }
    }

    /// Returns [`Config`] of this [`Service`].
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns [`Clock`] of this [`Service`].
    #[must_use]
    pub fn clock(&self) -> &Clock {
        &self.config.clock
    }

    /// Returns [`Database`] of this [`Service`].
    #[must_use]
    pub fn database(&self) -> &Db {
        &self.database
    }
}
