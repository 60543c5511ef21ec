//! [`Account`]-related [`Database`] implementations.

use common::operations::{By, Insert, Select, Update};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{account, Account},
    infra::{
        database::{self, Postgres},
        Database,
    },
};

/// Builds an [`Account`] out of the provided [`Row`].
fn account_from_row(row: &Row) -> Account {
    Account {
        id: row.get("id"),
        username: row.get("username"),
        role: row.get("role"),
        is_active: row.get("is_active"),
        created_at: row.get("created_at"),
    }
}

impl Database<Select<By<Option<Account>, account::Id>>> for Postgres {
    type Ok = Option<Account>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Account>, account::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = "\
            SELECT id, username, role, is_active, created_at \
            FROM accounts \
            WHERE id = $1::UUID";
        Ok(self
            .query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(account_from_row))
    }
}

impl<'l> Database<Select<By<Option<Account>, &'l account::Username>>>
    for Postgres
{
    type Ok = Option<Account>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Account>, &'l account::Username>>,
    ) -> Result<Self::Ok, Self::Err> {
        let username = by.into_inner();

        const SQL: &str = "\
            SELECT id, username, role, is_active, created_at \
            FROM accounts \
            WHERE LOWER(username) = LOWER($1::VARCHAR) \
            LIMIT 1";
        Ok(self
            .query_opt(SQL, &[username])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(account_from_row))
    }
}

impl Database<Insert<Account>> for Postgres {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(account): Insert<Account>,
    ) -> Result<Self::Ok, Self::Err> {
        let Account {
            id,
            username,
            role,
            is_active,
            created_at,
        } = account;

        const SQL: &str = "\
            INSERT INTO accounts (\
                id, username, role, is_active, created_at\
            ) \
            VALUES (\
                $1::UUID, $2::VARCHAR, $3::INT2, $4::BOOL, $5::TIMESTAMPTZ\
            )";
        self.exec(SQL, &[&id, &username, &role, &is_active, &created_at])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl Database<Select<By<Vec<Account>, ()>>> for Postgres {
    type Ok = Vec<Account>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<Vec<Account>, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = "\
            SELECT id, username, role, is_active, created_at \
            FROM accounts \
            ORDER BY created_at ASC";
        Ok(self
            .query(SQL, &[])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(account_from_row)
            .collect())
    }
}

impl Database<Update<account::Activation>> for Postgres {
    /// Changed [`Account`], if it exists.
    type Ok = Option<Account>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(activation): Update<account::Activation>,
    ) -> Result<Self::Ok, Self::Err> {
        let account::Activation { id, is_active } = activation;

        const SQL: &str = "\
            UPDATE accounts \
            SET is_active = $2::BOOL \
            WHERE id = $1::UUID \
            RETURNING id, username, role, is_active, created_at";
        Ok(self
            .query_opt(SQL, &[&id, &is_active])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(account_from_row))
    }
}
