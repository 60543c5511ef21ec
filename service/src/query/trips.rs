//! [`Query`] collection related to the multiple [`Trip`]s.

use common::operations::{By, Select};
use tracerr::Traced;

use crate::{
    domain::{trip::Status, Trip},
    infra::{database, Database},
    read::trip::{list, summary, View},
    Query, Service,
};

/// [`Query`] listing [`Trip`]s of the specified [`list::Kind`].
///
/// [`Trip`]s are viewed with their [`Status`] reconciled with their dates.
#[derive(Clone, Copy, Debug, Default)]
pub struct ListTrips {
    /// [`list::Kind`] of the list.
    pub kind: list::Kind,
}

impl<Db> Query<ListTrips> for Service<Db>
where
    Db: Database<
        Select<By<Vec<Trip>, list::Selector>>,
        Ok = Vec<Trip>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Vec<View>;
    type Err = Traced<database::Error>;

    async fn execute(&self, query: ListTrips) -> Result<Self::Ok, Self::Err> {
        let ListTrips { kind } = query;
        let today = self.clock().today();

        Ok(self
            .database()
            .execute(Select(By::new(list::Selector { kind, today })))
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|trip| View::new(trip, today))
            .collect())
    }
}

/// [`Query`] summarizing [`Trip`]s departing today and returned yesterday.
#[derive(Clone, Copy, Debug, Default)]
pub struct DailySummary;

impl<Db> Query<DailySummary> for Service<Db>
where
    Db: Database<
        Select<By<Vec<Trip>, summary::Selector>>,
        Ok = Vec<Trip>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = summary::Summary;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: DailySummary) -> Result<Self::Ok, Self::Err> {
        let today = self.clock().today();

        let (starting, returned): (Vec<_>, Vec<_>) = self
            .database()
            .execute(Select(By::new(summary::Selector { today })))
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|trip| View::new(trip, today))
            .partition(|v| v.trip.dates.departs_on().coerce() == today);
        let completed = returned
            .into_iter()
            .filter(|v| v.status == Status::Completed)
            .collect();

        Ok(summary::Summary {
            today,
            starting,
            completed,
        })
    }
}
