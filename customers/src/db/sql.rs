// III-IV
// Copyright 2023 Julio Merino
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! Implementation of the customer store using hand-written SQL queries.

use crate::db::CustomerStore;
use crate::model::{Age, Customer, CustomerId, CustomerName, NewCustomer};
use async_trait::async_trait;
#[cfg(feature = "postgres")]
use customers_core::db::postgres;
#[cfg(any(feature = "sqlite", test))]
use customers_core::db::sqlite;
use customers_core::db::{Db, DbError, DbResult, Executor};
use customers_core::model::EmailAddress;
use sqlx::Row;
#[cfg(feature = "postgres")]
use sqlx::postgres::PgRow;
#[cfg(any(feature = "sqlite", test))]
use sqlx::sqlite::SqliteRow;
use std::sync::Arc;

#[cfg(feature = "postgres")]
impl TryFrom<PgRow> for Customer {
    type Error = DbError;

    fn try_from(row: PgRow) -> DbResult<Self> {
        let id: i64 = row.try_get("id").map_err(postgres::map_sqlx_error)?;
        let name: String = row.try_get("name").map_err(postgres::map_sqlx_error)?;
        let email: String = row.try_get("email").map_err(postgres::map_sqlx_error)?;
        let age: i32 = row.try_get("age").map_err(postgres::map_sqlx_error)?;

        Ok(Customer::new(
            CustomerId::new(id),
            CustomerName::new(name)?,
            EmailAddress::new(email)?,
            Age::from_i32(age)?,
        ))
    }
}

#[cfg(any(feature = "sqlite", test))]
impl TryFrom<SqliteRow> for Customer {
    type Error = DbError;

    fn try_from(row: SqliteRow) -> DbResult<Self> {
        let id: i64 = row.try_get("id").map_err(sqlite::map_sqlx_error)?;
        let name: String = row.try_get("name").map_err(sqlite::map_sqlx_error)?;
        let email: String = row.try_get("email").map_err(sqlite::map_sqlx_error)?;
        let age: i32 = row.try_get("age").map_err(sqlite::map_sqlx_error)?;

        Ok(Customer::new(
            CustomerId::new(id),
            CustomerName::new(name)?,
            EmailAddress::new(email)?,
            Age::from_i32(age)?,
        ))
    }
}

/// Gets all customers ordered by their identifier.
async fn get_customers(ex: &mut Executor) -> DbResult<Vec<Customer>> {
    let query_str = "SELECT id, name, email, age FROM customer ORDER BY id";
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let rows = sqlx::query(query_str)
                .fetch_all(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            rows.into_iter().map(Customer::try_from).collect()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let rows =
                sqlx::query(query_str).fetch_all(ex.conn()).await.map_err(sqlite::map_sqlx_error)?;
            rows.into_iter().map(Customer::try_from).collect()
        }

        #[allow(unused)]
        _ => unreachable!(),
    }
}

/// Gets the customer identified by `id`, if any.
async fn get_customer(ex: &mut Executor, id: CustomerId) -> DbResult<Option<Customer>> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "SELECT id, name, email, age FROM customer WHERE id = $1";
            let maybe_row = sqlx::query(query_str)
                .bind(id.as_i64())
                .fetch_optional(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            maybe_row.map(Customer::try_from).transpose()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "SELECT id, name, email, age FROM customer WHERE id = ?";
            let maybe_row = sqlx::query(query_str)
                .bind(id.as_i64())
                .fetch_optional(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            maybe_row.map(Customer::try_from).transpose()
        }

        #[allow(unused)]
        _ => unreachable!(),
    }
}

/// Creates a new customer and returns the identifier assigned to it.
async fn create_customer(ex: &mut Executor, new: &NewCustomer) -> DbResult<CustomerId> {
    let id: i64 = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "INSERT INTO customer (name, email, age) VALUES ($1, $2, $3) RETURNING id";
            let row = sqlx::query(query_str)
                .bind(new.name().as_str())
                .bind(new.email().as_str())
                .bind(new.age().as_i32())
                .fetch_one(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            row.try_get("id").map_err(postgres::map_sqlx_error)?
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "INSERT INTO customer (name, email, age) VALUES (?, ?, ?) RETURNING id";
            let row = sqlx::query(query_str)
                .bind(new.name().as_str())
                .bind(new.email().as_str())
                .bind(new.age().as_i32())
                .fetch_one(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            row.try_get("id").map_err(sqlite::map_sqlx_error)?
        }

        #[allow(unused)]
        _ => unreachable!(),
    };
    Ok(CustomerId::new(id))
}

/// Checks if the customer identified by `id` exists.
async fn customer_exists(ex: &mut Executor, id: CustomerId) -> DbResult<bool> {
    let count: i64 = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "SELECT COUNT(id) AS count FROM customer WHERE id = $1";
            let row = sqlx::query(query_str)
                .bind(id.as_i64())
                .fetch_one(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            row.try_get("count").map_err(postgres::map_sqlx_error)?
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "SELECT COUNT(id) AS count FROM customer WHERE id = ?";
            let row = sqlx::query(query_str)
                .bind(id.as_i64())
                .fetch_one(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            row.try_get("count").map_err(sqlite::map_sqlx_error)?
        }

        #[allow(unused)]
        _ => unreachable!(),
    };
    Ok(count > 0)
}

/// Checks if any customer uses the `email` address.
async fn email_exists(ex: &mut Executor, email: &EmailAddress) -> DbResult<bool> {
    let count: i64 = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "SELECT COUNT(id) AS count FROM customer WHERE email = $1";
            let row = sqlx::query(query_str)
                .bind(email.as_str())
                .fetch_one(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            row.try_get("count").map_err(postgres::map_sqlx_error)?
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "SELECT COUNT(id) AS count FROM customer WHERE email = ?";
            let row = sqlx::query(query_str)
                .bind(email.as_str())
                .fetch_one(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            row.try_get("count").map_err(sqlite::map_sqlx_error)?
        }

        #[allow(unused)]
        _ => unreachable!(),
    };
    Ok(count > 0)
}

/// Replaces the name, email and age of the customer with the same identifier as `customer`
/// in a single statement.
async fn update_customer(ex: &mut Executor, customer: &Customer) -> DbResult<()> {
    let rows_affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "UPDATE customer SET name = $1, email = $2, age = $3 WHERE id = $4";
            let done = sqlx::query(query_str)
                .bind(customer.name().as_str())
                .bind(customer.email().as_str())
                .bind(customer.age().as_i32())
                .bind(customer.id().as_i64())
                .execute(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "UPDATE customer SET name = ?, email = ?, age = ? WHERE id = ?";
            let done = sqlx::query(query_str)
                .bind(customer.name().as_str())
                .bind(customer.email().as_str())
                .bind(customer.age().as_i32())
                .bind(customer.id().as_i64())
                .execute(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            done.rows_affected()
        }

        #[allow(unused)]
        _ => unreachable!(),
    };

    match rows_affected {
        0 => Err(DbError::NotFound),
        1 => Ok(()),
        _ => Err(DbError::BackendError("Update affected more than one row".to_owned())),
    }
}

/// Deletes the customer identified by `id`, if it exists.
async fn delete_customer(ex: &mut Executor, id: CustomerId) -> DbResult<()> {
    let rows_affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "DELETE FROM customer WHERE id = $1";
            let done = sqlx::query(query_str)
                .bind(id.as_i64())
                .execute(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "DELETE FROM customer WHERE id = ?";
            let done = sqlx::query(query_str)
                .bind(id.as_i64())
                .execute(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            done.rows_affected()
        }

        #[allow(unused)]
        _ => unreachable!(),
    };

    if rows_affected > 1 {
        return Err(DbError::BackendError("Deletion affected more than one row".to_owned()));
    }
    Ok(())
}

/// A customer store that issues hand-written queries against a `Db`.
#[derive(Clone)]
pub struct SqlCustomerStore {
    /// The database backing this store.
    db: Arc<dyn Db + Send + Sync>,
}

impl SqlCustomerStore {
    /// Creates a new store backed by `db`.  The schema must already be initialized.
    pub fn new(db: Arc<dyn Db + Send + Sync>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CustomerStore for SqlCustomerStore {
    async fn list_all(&self) -> DbResult<Vec<Customer>> {
        get_customers(&mut self.db.ex().await?).await
    }

    async fn find_by_id(&self, id: CustomerId) -> DbResult<Option<Customer>> {
        get_customer(&mut self.db.ex().await?, id).await
    }

    async fn insert(&self, new: NewCustomer) -> DbResult<Customer> {
        let id = create_customer(&mut self.db.ex().await?, &new).await?;
        Ok(new.into_customer(id))
    }

    async fn exists_by_id(&self, id: CustomerId) -> DbResult<bool> {
        customer_exists(&mut self.db.ex().await?, id).await
    }

    async fn exists_by_email(&self, email: &EmailAddress) -> DbResult<bool> {
        email_exists(&mut self.db.ex().await?, email).await
    }

    async fn update(&self, customer: &Customer) -> DbResult<()> {
        update_customer(&mut self.db.ex().await?, customer).await
    }

    async fn delete_by_id(&self, id: CustomerId) -> DbResult<()> {
        delete_customer(&mut self.db.ex().await?, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_schema;
    use crate::db::tests::generate_db_tests;

    /// Creates a store backed by a fresh in-memory SQLite database.
    async fn setup_sqlite() -> Arc<dyn CustomerStore + Send + Sync> {
        let db = Arc::new(customers_core::db::sqlite::testutils::setup().await);
        init_schema(&mut db.ex().await.unwrap()).await.unwrap();
        Arc::new(SqlCustomerStore::new(db))
    }

    /// Creates a store backed by the PostgreSQL test database.
    #[cfg(feature = "postgres")]
    async fn setup_postgres() -> Arc<dyn CustomerStore + Send + Sync> {
        let db = Arc::new(customers_core::db::postgres::testutils::setup().await);
        init_schema(&mut db.ex().await.unwrap()).await.unwrap();
        Arc::new(SqlCustomerStore::new(db))
    }

    mod with_sqlite {
        use super::*;

        generate_db_tests!(setup_sqlite().await);
    }

    #[cfg(feature = "postgres")]
    mod with_postgres {
        use super::*;

        generate_db_tests!(
            setup_postgres().await,
            #[ignore = "Requires environment configuration and is expensive"]
        );
    }

    #[tokio::test]
    async fn test_corrupted_row() {
        let db = Arc::new(customers_core::db::sqlite::testutils::setup().await);
        init_schema(&mut db.ex().await.unwrap()).await.unwrap();
        let mut ex = db.typed_ex().await.unwrap();
        sqlx::query("INSERT INTO customer (name, email, age) VALUES ('Alex', 'bad-email', 21)")
            .execute(ex.conn())
            .await
            .unwrap();

        let store = SqlCustomerStore::new(db);
        match store.list_all().await {
            Err(DbError::DataIntegrityError(e)) => assert!(e.contains("valid address")),
            e => panic!("{:?}", e),
        }
    }
}
