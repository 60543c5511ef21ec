//! [`Company`]-related [`Database`] implementations.

use common::operations::{By, Delete, Insert, Select, Update};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{company, Company},
    infra::{
        database::{self, Postgres},
        Database,
    },
};

/// Builds a [`Company`] out of the provided [`Row`].
fn company_from_row(row: &Row) -> Company {
    Company {
        id: row.get("id"),
        name: row.get("name"),
        is_active: row.get("is_active"),
        created_at: row.get("created_at"),
    }
}

impl Database<Select<By<Option<Company>, company::Id>>> for Postgres {
    type Ok = Option<Company>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Company>, company::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = "\
            SELECT id, name, is_active, created_at \
            FROM companies \
            WHERE id = $1::UUID";
        Ok(self
            .query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(company_from_row))
    }
}

impl<'l> Database<Select<By<Option<Company>, &'l company::Name>>>
    for Postgres
{
    type Ok = Option<Company>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Company>, &'l company::Name>>,
    ) -> Result<Self::Ok, Self::Err> {
        let name = by.into_inner();

        const SQL: &str = "\
            SELECT id, name, is_active, created_at \
            FROM companies \
            WHERE LOWER(name) = LOWER($1::VARCHAR) \
            LIMIT 1";
        Ok(self
            .query_opt(SQL, &[name])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(company_from_row))
    }
}

impl Database<Insert<Company>> for Postgres {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(company): Insert<Company>,
    ) -> Result<Self::Ok, Self::Err> {
        let Company {
            id,
            name,
            is_active,
            created_at,
        } = company;

        const SQL: &str = "\
            INSERT INTO companies (id, name, is_active, created_at) \
            VALUES ($1::UUID, $2::VARCHAR, $3::BOOL, $4::TIMESTAMPTZ)";
        self.exec(SQL, &[&id, &name, &is_active, &created_at])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl Database<Select<By<Vec<Company>, ()>>> for Postgres {
    type Ok = Vec<Company>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<Vec<Company>, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = "\
            SELECT id, name, is_active, created_at \
            FROM companies \
            ORDER BY name ASC";
        Ok(self
            .query(SQL, &[])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(company_from_row)
            .collect())
    }
}

impl Database<Update<company::Activation>> for Postgres {
    /// Changed [`Company`], if it exists.
    type Ok = Option<Company>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(activation): Update<company::Activation>,
    ) -> Result<Self::Ok, Self::Err> {
        let company::Activation { id, is_active } = activation;

        const SQL: &str = "\
            UPDATE companies \
            SET is_active = $2::BOOL \
            WHERE id = $1::UUID \
            RETURNING id, name, is_active, created_at";
        Ok(self
            .query_opt(SQL, &[&id, &is_active])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(company_from_row))
    }
}

impl Database<Delete<By<Company, company::Id>>> for Postgres {
    /// Whether the [`Company`] existed.
    ///
    /// [`Trip`]s still referencing it lose the reference via the
    /// `ON DELETE SET NULL` constraint.
    ///
    /// [`Trip`]: crate::domain::Trip
    type Ok = bool;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Company, company::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = "DELETE FROM companies WHERE id = $1::UUID";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(|affected| affected > 0)
    }
}
