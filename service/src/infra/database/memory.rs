//! In-memory [`Database`] implementation.

use std::{cmp::Ordering, collections::HashMap, sync::Arc};

use common::operations::{By, Delete, Insert, Select, Update};
use tokio::sync::Mutex;
use tracerr::Traced;

use crate::{
    domain::{
        account, company,
        trip::{self, Status, Transition},
        Account, Company, Trip,
    },
    infra::{database, Database},
    read,
};

/// In-memory [`Database`].
///
/// Clones share the same data. Every operation holds the lock for its whole
/// duration, so conditional writes are atomic.
#[derive(Clone, Debug, Default)]
pub struct Memory {
    /// Stored data.
    state: Arc<Mutex<State>>,
}

/// Data stored in a [`Memory`] database.
#[derive(Debug, Default)]
struct State {
    /// Stored [`Account`]s.
    accounts: HashMap<account::Id, Account>,

    /// Stored [`Company`]s.
    companies: HashMap<company::Id, Company>,

    /// Stored [`Trip`]s.
    trips: HashMap<trip::Id, Trip>,
}

impl Memory {
    /// Creates a new empty [`Memory`] database.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Orders [`Trip`]s by their departure, oldest first.
fn by_departure(a: &Trip, b: &Trip) -> Ordering {
    a.dates
        .departs_on()
        .cmp(&b.dates.departs_on())
        .then_with(|| a.created_at.cmp(&b.created_at))
}

impl Database<Select<By<Option<Account>, account::Id>>> for Memory {
    type Ok = Option<Account>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Account>, account::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self.state.lock().await.accounts.get(by.get()).cloned())
    }
}

impl<'l> Database<Select<By<Option<Account>, &'l account::Username>>>
    for Memory
{
    type Ok = Option<Account>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Account>, &'l account::Username>>,
    ) -> Result<Self::Ok, Self::Err> {
        let username = by.into_inner();
        Ok(self
            .state
            .lock()
            .await
            .accounts
            .values()
            .find(|a| a.username.matches(username))
            .cloned())
    }
}

impl Database<Insert<Account>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(account): Insert<Account>,
    ) -> Result<Self::Ok, Self::Err> {
        _ = self.state.lock().await.accounts.insert(account.id, account);
        Ok(())
    }
}

impl Database<Select<By<Vec<Account>, ()>>> for Memory {
    type Ok = Vec<Account>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<Vec<Account>, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut accounts = self
            .state
            .lock()
            .await
            .accounts
            .values()
            .cloned()
            .collect::<Vec<_>>();
        accounts.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(accounts)
    }
}

impl Database<Update<account::Activation>> for Memory {
    type Ok = Option<Account>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(activation): Update<account::Activation>,
    ) -> Result<Self::Ok, Self::Err> {
        let account::Activation { id, is_active } = activation;

        Ok(self.state.lock().await.accounts.get_mut(&id).map(|a| {
            a.is_active = is_active;
            a.clone()
        }))
    }
}

impl Database<Select<By<Option<Company>, company::Id>>> for Memory {
    type Ok = Option<Company>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Company>, company::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self.state.lock().await.companies.get(by.get()).cloned())
    }
}

impl<'l> Database<Select<By<Option<Company>, &'l company::Name>>> for Memory {
    type Ok = Option<Company>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Company>, &'l company::Name>>,
    ) -> Result<Self::Ok, Self::Err> {
        let name = by.into_inner();
        Ok(self
            .state
            .lock()
            .await
            .companies
            .values()
            .find(|c| c.name.matches(name))
            .cloned())
    }
}

impl Database<Insert<Company>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(company): Insert<Company>,
    ) -> Result<Self::Ok, Self::Err> {
        _ = self.state.lock().await.companies.insert(company.id, company);
        Ok(())
    }
}

impl Database<Select<By<Vec<Company>, ()>>> for Memory {
    type Ok = Vec<Company>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<Vec<Company>, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut companies = self
            .state
            .lock()
            .await
            .companies
            .values()
            .cloned()
            .collect::<Vec<_>>();
        companies.sort_by(|a, b| {
            AsRef::<str>::as_ref(&a.name).cmp(AsRef::<str>::as_ref(&b.name))
        });
        Ok(companies)
    }
}

impl Database<Update<company::Activation>> for Memory {
    type Ok = Option<Company>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(activation): Update<company::Activation>,
    ) -> Result<Self::Ok, Self::Err> {
        let company::Activation { id, is_active } = activation;

        Ok(self.state.lock().await.companies.get_mut(&id).map(|c| {
            c.is_active = is_active;
            c.clone()
        }))
    }
}

impl Database<Delete<By<Company, company::Id>>> for Memory {
    type Ok = bool;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Company, company::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        let mut state = self.state.lock().await;
        let existed = state.companies.remove(&id).is_some();
        for t in state.trips.values_mut() {
            if t.company_id == Some(id) {
                t.company_id = None;
            }
        }
        Ok(existed)
    }
}

impl Database<Select<By<Option<Trip>, trip::Id>>> for Memory {
    type Ok = Option<Trip>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Trip>, trip::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self.state.lock().await.trips.get(by.get()).cloned())
    }
}

impl Database<Select<By<Vec<Trip>, read::trip::list::Selector>>> for Memory {
    type Ok = Vec<Trip>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Trip>, read::trip::list::Selector>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::trip::list::Selector { kind, today } = by.into_inner();

        let mut trips = self
            .state
            .lock()
            .await
            .trips
            .values()
            .filter(|t| kind.includes(t.display_status(today)))
            .cloned()
            .collect::<Vec<_>>();
        if kind.is_ascending() {
            trips.sort_by(by_departure);
        } else {
            trips.sort_by(|a, b| by_departure(b, a));
        }
        Ok(trips)
    }
}

impl Database<Select<By<Vec<Trip>, read::trip::summary::Selector>>> for Memory {
    type Ok = Vec<Trip>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Trip>, read::trip::summary::Selector>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::trip::summary::Selector { today } = by.into_inner();
        let yesterday = today.previous_day();

        let mut trips = self
            .state
            .lock()
            .await
            .trips
            .values()
            .filter(|t| {
                t.status != Status::Cancelled
                    && (t.dates.departs_on().coerce() == today
                        || Some(t.dates.returns_on().coerce()) == yesterday)
            })
            .cloned()
            .collect::<Vec<_>>();
        trips.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(trips)
    }
}

impl Database<Insert<Trip>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(trip): Insert<Trip>,
    ) -> Result<Self::Ok, Self::Err> {
        _ = self.state.lock().await.trips.insert(trip.id, trip);
        Ok(())
    }
}

impl Database<Update<Trip>> for Memory {
    type Ok = bool;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(trip): Update<Trip>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut state = self.state.lock().await;
        let Some(stored) = state.trips.get_mut(&trip.id) else {
            return Ok(false);
        };
        if Some(stored.version) != trip.version.previous() {
            return Ok(false);
        }

        *stored = Trip {
            traveller_id: stored.traveller_id,
            created_at: stored.created_at,
            ..trip
        };
        Ok(true)
    }
}

impl Database<Update<trip::Completion>> for Memory {
    type Ok = Option<Trip>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(completion): Update<trip::Completion>,
    ) -> Result<Self::Ok, Self::Err> {
        let trip::Completion {
            id,
            returns_on,
            at,
            by,
        } = completion;

        let mut state = self.state.lock().await;
        let Some(stored) = state.trips.get_mut(&id) else {
            return Ok(None);
        };
        let Some(dates) = stored.dates.with_return(returns_on) else {
            return Ok(None);
        };

        stored.dates = dates;
        stored.status = Status::Completed;
        stored.version = stored.version.next();
        stored.modified_at = at;
        stored.modified_by = by;
        Ok(Some(stored.clone()))
    }
}

impl Database<Update<trip::Detachment>> for Memory {
    type Ok = u64;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(detachment): Update<trip::Detachment>,
    ) -> Result<Self::Ok, Self::Err> {
        let trip::Detachment { company_id, at } = detachment;

        let mut count = 0;
        for t in self.state.lock().await.trips.values_mut() {
            if t.company_id != Some(company_id) {
                continue;
            }
            t.company_id = None;
            t.version = t.version.next();
            t.modified_at = at;
            t.modified_by = None;
            count += 1;
        }
        Ok(count)
    }
}

impl Database<Update<trip::Sweep>> for Memory {
    type Ok = u64;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(sweep): Update<trip::Sweep>,
    ) -> Result<Self::Ok, Self::Err> {
        let trip::Sweep {
            transition,
            today,
            at,
        } = sweep;

        let mut count = 0;
        for t in self.state.lock().await.trips.values_mut() {
            let to = match transition {
                Transition::Activation
                    if t.status == Status::Upcoming
                        && t.dates.departs_on().coerce() <= today =>
                {
                    Status::Active
                }
                Transition::Completion
                    if t.status == Status::Active
                        && t.dates.returns_on().coerce() < today =>
                {
                    Status::Completed
                }
                Transition::Activation | Transition::Completion => continue,
            };

            t.status = to;
            t.version = t.version.next();
            t.modified_at = at;
            t.modified_by = None;
            count += 1;
        }
        Ok(count)
    }
}

impl Database<Delete<By<Trip, trip::Id>>> for Memory {
    type Ok = bool;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Trip, trip::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self.state.lock().await.trips.remove(by.get()).is_some())
    }
}
