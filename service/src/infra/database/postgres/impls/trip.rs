//! [`Trip`]-related [`Database`] implementations.

use common::operations::{By, Delete, Insert, Select, Update};
use tokio_postgres::{types::ToSql, Row};
use tracerr::Traced;

use crate::{
    domain::{
        trip::{self, Status, Transition},
        Trip,
    },
    infra::{
        database::{self, Postgres},
        Database,
    },
    read,
};

/// Columns of a [`Trip`] row, in the order [`trip_from_row()`] expects them.
const COLUMNS: &str = "\
    id, traveller_id, company_id, \
    name, email, notes, \
    departure_date, return_date, \
    status, version, \
    created_at, modified_at, modified_by";

/// Builds a [`Trip`] out of the provided [`Row`].
fn trip_from_row(row: &Row) -> Trip {
    // SAFETY: `trips_dates_order` constraint keeps them ordered.
    #[expect(unsafe_code, reason = "ensured by database constraint")]
    let dates = unsafe {
        trip::Dates::new_unchecked(
            row.get("departure_date"),
            row.get("return_date"),
        )
    };
    Trip {
        id: row.get("id"),
        traveller_id: row.get("traveller_id"),
        company_id: row.get("company_id"),
        name: row.get("name"),
        email: row.get("email"),
        notes: row.get("notes"),
        dates,
        status: row.get("status"),
        version: row.get("version"),
        created_at: row.get("created_at"),
        modified_at: row.get("modified_at"),
        modified_by: row.get("modified_by"),
    }
}

impl Database<Select<By<Option<Trip>, trip::Id>>> for Postgres {
    type Ok = Option<Trip>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Trip>, trip::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        let sql = format!("SELECT {COLUMNS} FROM trips WHERE id = $1::UUID");
        Ok(self
            .query_opt(sql.as_str(), &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(trip_from_row))
    }
}

impl Database<Select<By<Vec<Trip>, read::trip::list::Selector>>> for Postgres {
    type Ok = Vec<Trip>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Trip>, read::trip::list::Selector>>,
    ) -> Result<Self::Ok, Self::Err> {
        use read::trip::list::Kind;

        let read::trip::list::Selector { kind, today } = by.into_inner();
        let (upcoming, active, completed) = (
            Status::Upcoming.u8(),
            Status::Active.u8(),
            Status::Completed.u8(),
        );

        // Stored statuses may lag behind the dates, so the predicates follow
        // `Trip::display_status()` rather than the stored status alone.
        let filter = match kind {
            Kind::Current => format!(
                "WHERE status IN ({upcoming}, {active}) \
                   AND return_date >= $1::DATE"
            ),
            Kind::Completed => format!(
                "WHERE status = {completed} \
                    OR (status IN ({upcoming}, {active}) \
                        AND return_date < $1::DATE)"
            ),
            Kind::All => String::new(),
        };
        let params: &[&(dyn ToSql + Sync)] = match kind {
            Kind::Current | Kind::Completed => &[&today],
            Kind::All => &[],
        };
        let order = if kind.is_ascending() { "ASC" } else { "DESC" };

        let sql = format!(
            "SELECT {COLUMNS} FROM trips {filter} \
             ORDER BY departure_date {order}, created_at {order}"
        );
        Ok(self
            .query(sql.as_str(), params)
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(trip_from_row)
            .collect())
    }
}

impl Database<Select<By<Vec<Trip>, read::trip::summary::Selector>>>
    for Postgres
{
    type Ok = Vec<Trip>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Trip>, read::trip::summary::Selector>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::trip::summary::Selector { today } = by.into_inner();
        let cancelled = Status::Cancelled.u8();

        let sql = format!(
            "SELECT {COLUMNS} FROM trips \
             WHERE status <> {cancelled} \
               AND (departure_date = $1::DATE \
                    OR return_date = $1::DATE - 1) \
             ORDER BY name ASC"
        );
        Ok(self
            .query(sql.as_str(), &[&today])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(trip_from_row)
            .collect())
    }
}

impl Database<Insert<Trip>> for Postgres {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(trip): Insert<Trip>,
    ) -> Result<Self::Ok, Self::Err> {
        let Trip {
            id,
            traveller_id,
            company_id,
            name,
            email,
            notes,
            dates,
            status,
            version,
            created_at,
            modified_at,
            modified_by,
        } = trip;

        const SQL: &str = "\
            INSERT INTO trips (\
                id, traveller_id, company_id, \
                name, email, notes, \
                departure_date, return_date, \
                status, version, \
                created_at, modified_at, modified_by\
            ) \
            VALUES (\
                $1::UUID, $2::UUID, $3::UUID, \
                $4::VARCHAR, $5::VARCHAR, $6::TEXT, \
                $7::DATE, $8::DATE, \
                $9::INT2, $10::INT4, \
                $11::TIMESTAMPTZ, $12::TIMESTAMPTZ, $13::UUID\
            )";
        self.exec(
            SQL,
            &[
                &id,
                &traveller_id,
                &company_id,
                &name,
                &email,
                &notes,
                &dates.departs_on(),
                &dates.returns_on(),
                &status,
                &version,
                &created_at,
                &modified_at,
                &modified_by,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl Database<Update<Trip>> for Postgres {
    /// Whether the [`Trip`] was updated.
    ///
    /// The update applies only if the stored [`trip::Version`] directly
    /// precedes the version of the provided [`Trip`].
    type Ok = bool;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(trip): Update<Trip>,
    ) -> Result<Self::Ok, Self::Err> {
        let Trip {
            id,
            traveller_id: _,
            company_id,
            name,
            email,
            notes,
            dates,
            status,
            version,
            created_at: _,
            modified_at,
            modified_by,
        } = trip;
        let Some(expected) = version.previous() else {
            return Ok(false);
        };

        const SQL: &str = "\
            UPDATE trips \
            SET company_id = $3::UUID, \
                name = $4::VARCHAR, \
                email = $5::VARCHAR, \
                notes = $6::TEXT, \
                departure_date = $7::DATE, \
                return_date = $8::DATE, \
                status = $9::INT2, \
                version = $10::INT4, \
                modified_at = $11::TIMESTAMPTZ, \
                modified_by = $12::UUID \
            WHERE id = $1::UUID \
              AND version = $2::INT4";
        self.exec(
            SQL,
            &[
                &id,
                &expected,
                &company_id,
                &name,
                &email,
                &notes,
                &dates.departs_on(),
                &dates.returns_on(),
                &status,
                &version,
                &modified_at,
                &modified_by,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(|affected| affected > 0)
    }
}

impl Database<Update<trip::Completion>> for Postgres {
    /// Completed [`Trip`], if it exists and its departure doesn't go after
    /// the return.
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

        let sql = format!(
            "UPDATE trips \
             SET status = $3::INT2, \
                 return_date = $2::DATE, \
                 version = version + 1, \
                 modified_at = $4::TIMESTAMPTZ, \
                 modified_by = $5::UUID \
             WHERE id = $1::UUID \
               AND departure_date <= $2::DATE \
             RETURNING {COLUMNS}"
        );
        Ok(self
            .query_opt(
                sql.as_str(),
                &[&id, &returns_on, &Status::Completed, &at, &by],
            )
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(trip_from_row))
    }
}

impl Database<Update<trip::Detachment>> for Postgres {
    /// Number of detached [`Trip`]s.
    type Ok = u64;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(detachment): Update<trip::Detachment>,
    ) -> Result<Self::Ok, Self::Err> {
        let trip::Detachment { company_id, at } = detachment;

        const SQL: &str = "\
            UPDATE trips \
            SET company_id = NULL, \
                version = version + 1, \
                modified_at = $2::TIMESTAMPTZ, \
                modified_by = NULL \
            WHERE company_id = $1::UUID";
        self.exec(SQL, &[&company_id, &at])
            .await
            .map_err(tracerr::wrap!())
    }
}

impl Database<Update<trip::Sweep>> for Postgres {
    /// Number of transitioned [`Trip`]s.
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

        let (from, to, due) = match transition {
            Transition::Activation => {
                (Status::Upcoming, Status::Active, "departure_date <= $3::DATE")
            }
            Transition::Completion => {
                (Status::Active, Status::Completed, "return_date < $3::DATE")
            }
        };

        let sql = format!(
            "UPDATE trips \
             SET status = $2::INT2, \
                 version = version + 1, \
                 modified_at = $4::TIMESTAMPTZ, \
                 modified_by = NULL \
             WHERE status = $1::INT2 \
               AND {due}"
        );
        self.exec(sql.as_str(), &[&from, &to, &today, &at])
            .await
            .map_err(tracerr::wrap!())
    }
}

impl Database<Delete<By<Trip, trip::Id>>> for Postgres {
    /// Whether the [`Trip`] existed.
    type Ok = bool;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Trip, trip::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = "DELETE FROM trips WHERE id = $1::UUID";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(|affected| affected > 0)
    }
}
