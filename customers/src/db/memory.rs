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

//! Implementation of the customer store in process memory.

use crate::db::CustomerStore;
use crate::model::{Customer, CustomerId, NewCustomer};
use async_trait::async_trait;
use customers_core::db::{DbError, DbResult};
use customers_core::model::EmailAddress;
use futures::lock::Mutex;

/// Contents of the in-memory store.
struct MemoryState {
    /// All existing customers, ordered by identifier.
    customers: Vec<Customer>,

    /// Identifier to assign to the next inserted customer.  Never goes backwards so that
    /// identifiers are not reused after deletions.
    next_id: i64,
}

/// A customer store that keeps all data in memory.  Data is lost when the store is dropped.
pub struct MemoryCustomerStore {
    /// The store contents, protected for concurrent access.
    state: Mutex<MemoryState>,
}

impl Default for MemoryCustomerStore {
    fn default() -> Self {
        Self { state: Mutex::new(MemoryState { customers: vec![], next_id: 1 }) }
    }
}

impl MemoryCustomerStore {
    /// Creates a store pre-populated with `customers`.
    ///
    /// Returns `DbError::AlreadyExists` if any identifier or email address is repeated.
    pub fn with_customers(mut customers: Vec<Customer>) -> DbResult<Self> {
        customers.sort_by_key(|c| *c.id());
        for (i, customer) in customers.iter().enumerate() {
            let dup = customers[..i].iter().any(|other| {
                other.id() == customer.id() || other.email() == customer.email()
            });
            if dup {
                return Err(DbError::AlreadyExists);
            }
        }

        let next_id = customers.last().map(|c| c.id().as_i64() + 1).unwrap_or(1);
        Ok(Self { state: Mutex::new(MemoryState { customers, next_id }) })
    }
}

#[async_trait]
impl CustomerStore for MemoryCustomerStore {
    async fn list_all(&self) -> DbResult<Vec<Customer>> {
        let state = self.state.lock().await;
        Ok(state.customers.clone())
    }

    async fn find_by_id(&self, id: CustomerId) -> DbResult<Option<Customer>> {
        let state = self.state.lock().await;
        Ok(state.customers.iter().find(|c| *c.id() == id).cloned())
    }

    async fn insert(&self, new: NewCustomer) -> DbResult<Customer> {
        let mut state = self.state.lock().await;

        if state.customers.iter().any(|c| c.email() == new.email()) {
            return Err(DbError::AlreadyExists);
        }

        let id = CustomerId::new(state.next_id);
        state.next_id += 1;
        let customer = new.into_customer(id);
        state.customers.push(customer.clone());
        Ok(customer)
    }

    async fn exists_by_id(&self, id: CustomerId) -> DbResult<bool> {
        let state = self.state.lock().await;
        Ok(state.customers.iter().any(|c| *c.id() == id))
    }

    async fn exists_by_email(&self, email: &EmailAddress) -> DbResult<bool> {
        let state = self.state.lock().await;
        Ok(state.customers.iter().any(|c| c.email() == email))
    }

    async fn update(&self, customer: &Customer) -> DbResult<()> {
        let mut state = self.state.lock().await;

        if state.customers.iter().any(|c| c.id() != customer.id() && c.email() == customer.email())
        {
            return Err(DbError::AlreadyExists);
        }

        match state.customers.iter_mut().find(|c| c.id() == customer.id()) {
            Some(existing) => {
                *existing = customer.clone();
                Ok(())
            }
            None => Err(DbError::NotFound),
        }
    }

    async fn delete_by_id(&self, id: CustomerId) -> DbResult<()> {
        let mut state = self.state.lock().await;
        state.customers.retain(|c| *c.id() != id);
        Ok(())
    }
}
