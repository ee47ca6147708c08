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

//! Implementation of the customer store using the `sea-orm` entity for the `customer` table.

use crate::db::CustomerStore;
use crate::model::{Age, Customer, CustomerId, CustomerName, NewCustomer};
use async_trait::async_trait;
use customers_core::db::{DbError, DbResult};
use customers_core::model::EmailAddress;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, SqlErr, TryIntoModel,
};

/// Entity definition for the `customer` table.
mod entity {
    #![allow(missing_docs, clippy::missing_docs_in_private_items)]

    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "customer")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i64,
        pub name: String,
        pub email: String,
        pub age: i32,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

/// Takes a raw ORM error `e` and converts it to our generic error type.
fn map_orm_error(e: DbErr) -> DbError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => return DbError::AlreadyExists,
        Some(SqlErr::ForeignKeyConstraintViolation(_)) => return DbError::NotFound,
        _ => (),
    }

    match e {
        DbErr::ConnectionAcquire(_) => DbError::Unavailable,
        DbErr::RecordNotFound(_) | DbErr::RecordNotUpdated => DbError::NotFound,
        DbErr::Type(e) => DbError::DataIntegrityError(e),
        e => DbError::BackendError(e.to_string()),
    }
}

impl TryFrom<entity::Model> for Customer {
    type Error = DbError;

    fn try_from(model: entity::Model) -> DbResult<Self> {
        Ok(Customer::new(
            CustomerId::new(model.id),
            CustomerName::new(model.name)?,
            EmailAddress::new(model.email)?,
            Age::from_i32(model.age)?,
        ))
    }
}

/// A customer store backed by `sea-orm`.
#[derive(Clone)]
pub struct OrmCustomerStore {
    /// Connection to the database backing this store.
    conn: DatabaseConnection,
}

impl OrmCustomerStore {
    /// Creates a new store that issues queries via `conn`.  The schema must already be
    /// initialized.
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Creates a new store that shares the connection pool of a PostgreSQL `db`.
    #[cfg(feature = "postgres")]
    pub fn from_postgres(db: &customers_core::db::postgres::PostgresDb) -> Self {
        Self::new(sea_orm::SqlxPostgresConnector::from_sqlx_postgres_pool(db.pool().clone()))
    }

    /// Creates a new store that shares the connection pool of an SQLite `db`.
    #[cfg(any(feature = "sqlite", test))]
    pub fn from_sqlite(db: &customers_core::db::sqlite::SqliteDb) -> Self {
        Self::new(sea_orm::SqlxSqliteConnector::from_sqlx_sqlite_pool(db.pool().clone()))
    }

    /// Persists `model`, inserting it if its identifier is not set and updating the existing
    /// row otherwise, and returns the stored customer.
    async fn save(&self, model: entity::ActiveModel) -> DbResult<Customer> {
        let saved = model.save(&self.conn).await.map_err(map_orm_error)?;
        let saved = saved.try_into_model().map_err(map_orm_error)?;
        Customer::try_from(saved)
    }
}

#[async_trait]
impl CustomerStore for OrmCustomerStore {
    async fn list_all(&self) -> DbResult<Vec<Customer>> {
        let models = entity::Entity::find()
            .order_by_asc(entity::Column::Id)
            .all(&self.conn)
            .await
            .map_err(map_orm_error)?;
        models.into_iter().map(Customer::try_from).collect()
    }

    async fn find_by_id(&self, id: CustomerId) -> DbResult<Option<Customer>> {
        let model =
            entity::Entity::find_by_id(id.as_i64()).one(&self.conn).await.map_err(map_orm_error)?;
        model.map(Customer::try_from).transpose()
    }

    async fn insert(&self, new: NewCustomer) -> DbResult<Customer> {
        self.save(entity::ActiveModel {
            id: ActiveValue::NotSet,
            name: ActiveValue::Set(new.name().as_str().to_owned()),
            email: ActiveValue::Set(new.email().as_str().to_owned()),
            age: ActiveValue::Set(new.age().as_i32()),
        })
        .await
    }

    async fn exists_by_id(&self, id: CustomerId) -> DbResult<bool> {
        let count =
            entity::Entity::find_by_id(id.as_i64()).count(&self.conn).await.map_err(map_orm_error)?;
        Ok(count > 0)
    }

    async fn exists_by_email(&self, email: &EmailAddress) -> DbResult<bool> {
        let count = entity::Entity::find()
            .filter(entity::Column::Email.eq(email.as_str()))
            .count(&self.conn)
            .await
            .map_err(map_orm_error)?;
        Ok(count > 0)
    }

    async fn update(&self, customer: &Customer) -> DbResult<()> {
        self.save(entity::ActiveModel {
            id: ActiveValue::Unchanged(customer.id().as_i64()),
            name: ActiveValue::Set(customer.name().as_str().to_owned()),
            email: ActiveValue::Set(customer.email().as_str().to_owned()),
            age: ActiveValue::Set(customer.age().as_i32()),
        })
        .await?;
        Ok(())
    }

    async fn delete_by_id(&self, id: CustomerId) -> DbResult<()> {
        let result =
            entity::Entity::delete_by_id(id.as_i64()).exec(&self.conn).await.map_err(map_orm_error)?;
        if result.rows_affected > 1 {
            return Err(DbError::BackendError("Deletion affected more than one row".to_owned()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_schema;
    use crate::db::tests::generate_db_tests;
    use customers_core::db::Db;
    use std::sync::Arc;

    /// Creates a store backed by a fresh in-memory SQLite database.
    async fn setup_sqlite() -> Arc<dyn CustomerStore + Send + Sync> {
        let db = customers_core::db::sqlite::testutils::setup().await;
        init_schema(&mut db.ex().await.unwrap()).await.unwrap();
        Arc::new(OrmCustomerStore::from_sqlite(&db))
    }

    /// Creates a store backed by the PostgreSQL test database.
    #[cfg(feature = "postgres")]
    async fn setup_postgres() -> Arc<dyn CustomerStore + Send + Sync> {
        let db = customers_core::db::postgres::testutils::setup().await;
        init_schema(&mut db.ex().await.unwrap()).await.unwrap();
        Arc::new(OrmCustomerStore::from_postgres(&db))
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

    #[test]
    fn test_map_orm_error() {
        assert_eq!(DbError::NotFound, map_orm_error(DbErr::RecordNotUpdated));
        assert_eq!(
            DbError::NotFound,
            map_orm_error(DbErr::RecordNotFound("customer".to_owned()))
        );
        assert_eq!(
            DbError::DataIntegrityError("bad column".to_owned()),
            map_orm_error(DbErr::Type("bad column".to_owned()))
        );
        match map_orm_error(DbErr::Custom("oops".to_owned())) {
            DbError::BackendError(e) => assert!(e.contains("oops")),
            e => panic!("{:?}", e),
        }
    }
}
