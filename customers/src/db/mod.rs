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

//! Database abstraction in terms of the operations needed by the service.
//!
//! The service talks to its persistence layer exclusively through the `CustomerStore` trait.
//! There are three implementations of it: `SqlCustomerStore` issues hand-written queries,
//! `OrmCustomerStore` goes through the `sea-orm` entity for the `customer` table, and
//! `MemoryCustomerStore` keeps everything in process memory.

use crate::model::{Customer, CustomerId, NewCustomer};
use async_trait::async_trait;
#[cfg(feature = "postgres")]
use customers_core::db::postgres;
#[cfg(any(feature = "sqlite", test))]
use customers_core::db::sqlite;
use customers_core::db::{DbResult, Executor};
use customers_core::model::EmailAddress;
use std::str::FromStr;

mod memory;
pub use memory::MemoryCustomerStore;
mod orm;
pub use orm::OrmCustomerStore;
mod sql;
pub use sql::SqlCustomerStore;

/// Initializes the database schema.
pub async fn init_schema(ex: &mut Executor) -> DbResult<()> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => postgres::run_schema(ex, include_str!("postgres.sql")).await,

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => sqlite::run_schema(ex, include_str!("sqlite.sql")).await,

        #[allow(unused)]
        _ => unreachable!(),
    }
}

/// Storage operations for customers.
#[async_trait]
pub trait CustomerStore {
    /// Gets all existing customers ordered by their identifier.
    async fn list_all(&self) -> DbResult<Vec<Customer>>;

    /// Gets the customer identified by `id`, or `None` if it does not exist.
    async fn find_by_id(&self, id: CustomerId) -> DbResult<Option<Customer>>;

    /// Persists a `new` customer and returns it with its newly-assigned identifier.
    ///
    /// Fails with `DbError::AlreadyExists` if the email address is already in use.
    async fn insert(&self, new: NewCustomer) -> DbResult<Customer>;

    /// Checks if the customer identified by `id` exists.
    async fn exists_by_id(&self, id: CustomerId) -> DbResult<bool>;

    /// Checks if any customer uses the `email` address.
    async fn exists_by_email(&self, email: &EmailAddress) -> DbResult<bool>;

    /// Replaces all fields of the existing customer with the same identifier as `customer`.
    ///
    /// Fails with `DbError::NotFound` if the customer does not exist and with
    /// `DbError::AlreadyExists` if the new email address belongs to another customer.
    async fn update(&self, customer: &Customer) -> DbResult<()>;

    /// Deletes the customer identified by `id`.  Deleting a customer that does not exist is not
    /// an error.
    async fn delete_by_id(&self, id: CustomerId) -> DbResult<()>;
}

/// The kinds of customer stores that the service can be configured with.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum StoreKind {
    /// Hand-written SQL queries against the database.
    #[default]
    Sql,

    /// ORM-generated queries against the database.
    Orm,

    /// Non-persistent store in process memory.
    Memory,
}

impl FromStr for StoreKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sql" => Ok(StoreKind::Sql),
            "orm" => Ok(StoreKind::Orm),
            "memory" => Ok(StoreKind::Memory),
            _ => Err(format!("Unknown store kind '{}'; must be one of sql, orm or memory", s)),
        }
    }
}

#[cfg(test)]
mod store_kind_tests {
    use super::*;

    #[test]
    fn test_store_kind_from_str() {
        assert_eq!(StoreKind::Sql, "sql".parse().unwrap());
        assert_eq!(StoreKind::Orm, "orm".parse().unwrap());
        assert_eq!(StoreKind::Memory, "memory".parse().unwrap());
        assert!("SQL".parse::<StoreKind>().unwrap_err().contains("Unknown store kind 'SQL'"));
    }
}
