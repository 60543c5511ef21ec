//! [`TransitionTrips`] [`Task`].

use std::{convert::Infallible, error::Error, time};

use common::operations::{By, Perform, Start};
use smart_default::SmartDefault;
use tokio::time::{interval, MissedTickBehavior};
use tracing as log;

use crate::{
    command::{self, transition_trips::Transitioned},
    Service,
};
#[cfg(doc)]
use crate::domain::Trip;

use super::Task;

/// Configuration for [`TransitionTrips`] [`Task`].
#[derive(Clone, Copy, Debug, SmartDefault)]
pub struct Config {
    /// Interval between [`Trip`]s transitions.
    #[default(time::Duration::from_secs(60 * 60))]
    pub interval: time::Duration,
}

/// [`Task`] periodically transitioning [`Trip`]s along their lifecycle via
/// [`command::TransitionTrips`].
#[derive(Clone, Copy, Debug)]
pub struct TransitionTrips<S> {
    /// [`Config`] of this [`Task`].
    config: Config,

    /// [`Service`] instance.
    service: S,
}

impl<Db> Task<Start<By<TransitionTrips<Self>, Config>>> for Service<Db>
where
    TransitionTrips<Service<Db>>: Task<Perform<()>, Ok = Transitioned, Err: Error>
        + 'static,
    Self: Clone,
{
    type Ok = ();
    type Err = Infallible;

    async fn execute(
        &self,
        Start(by): Start<By<TransitionTrips<Self>, Config>>,
    ) -> Result<Self::Ok, Self::Err> {
        let config = by.into_inner();
        let task = TransitionTrips {
            config,
            service: self.clone(),
        };
        log::info!(
            interval = ?task.config.interval,
            "`task::TransitionTrips` started",
        );

        let mut interval = interval(task.config.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            let _ = interval.tick().await;
            _ = task.execute(Perform(())).await.map_err(|e| {
                log::error!("`task::TransitionTrips` failed: {e}");
            });
        }
    }
}

impl<Db> Task<Perform<()>> for TransitionTrips<Service<Db>>
where
    Service<Db>: command::Command<
        command::TransitionTrips,
        Ok = Transitioned,
        Err: Error,
    >,
{
    type Ok = Transitioned;
    type Err = <Service<Db> as command::Command<command::TransitionTrips>>::Err;

    async fn execute(&self, _: Perform<()>) -> Result<Self::Ok, Self::Err> {
        self.service.execute(command::TransitionTrips).await
    }
}
