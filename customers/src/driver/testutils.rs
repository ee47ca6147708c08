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

//! Test utilities for the business layer.

use crate::db::{CustomerStore, MemoryCustomerStore};
use crate::driver::Driver;
use crate::model::{Age, Customer, CustomerId, CustomerName, NewCustomer};
use async_trait::async_trait;
use customers_core::db::DbResult;
use customers_core::model::EmailAddress;
use std::sync::Arc;

/// A store that claims that no email address is in use, even when it is, so that the uniqueness
/// violation is only detected when writing.  This mimics another request taking the same email
/// address between the check and the write.
#[derive(Default)]
struct UnreliableEmailCheckStore {
    /// The store that holds the actual data.
    inner: MemoryCustomerStore,
}

#[async_trait]
impl CustomerStore for UnreliableEmailCheckStore {
    async fn list_all(&self) -> DbResult<Vec<Customer>> {
        self.inner.list_all().await
    }

    async fn find_by_id(&self, id: CustomerId) -> DbResult<Option<Customer>> {
        self.inner.find_by_id(id).await
    }

    async fn insert(&self, new: NewCustomer) -> DbResult<Customer> {
        self.inner.insert(new).await
    }

    async fn exists_by_id(&self, id: CustomerId) -> DbResult<bool> {
        self.inner.exists_by_id(id).await
    }

    async fn exists_by_email(&self, _email: &EmailAddress) -> DbResult<bool> {
        Ok(false)
    }

    async fn update(&self, customer: &Customer) -> DbResult<()> {
        self.inner.update(customer).await
    }

    async fn delete_by_id(&self, id: CustomerId) -> DbResult<()> {
        self.inner.delete_by_id(id).await
    }
}

/// State of a running test.
pub(crate) struct TestContext {
    /// The store backing the driver, for direct access in tests.
    store: Arc<dyn CustomerStore + Send + Sync>,

    /// The driver under test.
    driver: Driver,
}

impl TestContext {
    /// Initializes a driver backed by an empty in-memory store.
    pub(crate) fn setup() -> Self {
        Self::setup_with_store(Arc::new(MemoryCustomerStore::default()))
    }

    /// Initializes a driver backed by an empty store whose email lookups never find a match, so
    /// that email collisions are only reported by the store's writes.
    pub(crate) fn setup_with_unreliable_email_check() -> Self {
        Self::setup_with_store(Arc::new(UnreliableEmailCheckStore::default()))
    }

    /// Initializes a driver backed by `store`.
    fn setup_with_store(store: Arc<dyn CustomerStore + Send + Sync>) -> Self {
        let driver = Driver::new(store.clone());
        Self { store, driver }
    }

    /// Gets direct access to the store.
    pub(crate) fn store(&self) -> &(dyn CustomerStore + Send + Sync) {
        self.store.as_ref()
    }

    /// Gets a copy of the driver in this test context.
    pub(crate) fn driver(&self) -> Driver {
        self.driver.clone()
    }

    /// Syntactic sugar to insert a customer directly into the store.
    pub(crate) async fn create_customer(&self, name: &str, email: &str, age: u32) -> Customer {
        let new = NewCustomer::new(
            CustomerName::new(name).unwrap(),
            EmailAddress::new(email).unwrap(),
            Age::from_u32(age).unwrap(),
        );
        self.store.insert(new).await.unwrap()
    }
}
