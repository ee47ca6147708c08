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

//! Test utilities for the REST API.

use crate::db::{self, CustomerStore, SqlCustomerStore};
use crate::driver::Driver;
use crate::model::{Age, Customer, CustomerId, CustomerName, NewCustomer};
use crate::rest::app;
use axum::Router;
use customers_core::db::Db;
use customers_core::model::EmailAddress;
use std::sync::Arc;

/// State of a running test.
pub(crate) struct TestContext {
    /// The store backing the app, for direct access in tests.
    store: Arc<dyn CustomerStore + Send + Sync>,

    /// The router for the app under test.
    app: Router,
}

impl TestContext {
    /// Initializes an app backed by an in-memory SQLite database.
    pub(crate) async fn setup() -> Self {
        let db = Arc::new(customers_core::db::sqlite::testutils::setup().await);
        db::init_schema(&mut db.ex().await.unwrap()).await.unwrap();
        let store: Arc<dyn CustomerStore + Send + Sync> = Arc::new(SqlCustomerStore::new(db));
        let app = app(Driver::new(store.clone()));
        Self { store, app }
    }

    pub(crate) fn app(&self) -> Router {
        self.app.clone()
    }

    pub(crate) fn into_app(self) -> Router {
        self.app
    }

    pub(crate) async fn create_customer(&self, name: &str, email: &str, age: u32) -> Customer {
        let new = NewCustomer::new(
            CustomerName::new(name).unwrap(),
            EmailAddress::new(email).unwrap(),
            Age::from_u32(age).unwrap(),
        );
        self.store.insert(new).await.unwrap()
    }

    pub(crate) async fn get_customer(&self, id: CustomerId) -> Option<Customer> {
        self.store.find_by_id(id).await.unwrap()
    }

    pub(crate) async fn all_customers(&self) -> Vec<Customer> {
        self.store.list_all().await.unwrap()
    }
}
