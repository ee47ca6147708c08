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

//! Operations on one customer.

use crate::driver::{Driver, email_taken, not_found};
use crate::model::{Customer, CustomerId, CustomerUpdate};
use customers_core::db::DbError;
use customers_core::driver::{DriverError, DriverResult};
use log::debug;

impl Driver {
    /// Fetches the customer identified by `id`, failing if it does not exist.
    async fn fetch_customer(&self, id: CustomerId) -> DriverResult<Customer> {
        match self.store.find_by_id(id).await? {
            Some(customer) => Ok(customer),
            None => Err(not_found(id)),
        }
    }

    /// Gets the customer identified by `id`.
    pub(crate) async fn get_customer(self, id: CustomerId) -> DriverResult<Customer> {
        self.fetch_customer(id).await
    }

    /// Applies the partial `update` to the customer identified by `id` and returns the updated
    /// customer.
    ///
    /// Fields in `update` that match the current values are ignored.  If no field changes, the
    /// request is rejected and the store is left untouched.
    pub(crate) async fn update_customer(
        self,
        id: CustomerId,
        update: CustomerUpdate,
    ) -> DriverResult<Customer> {
        let mut customer = self.fetch_customer(id).await?;
        let mut changed = false;

        if let Some(name) = update.name {
            if name != *customer.name() {
                customer = customer.with_name(name);
                changed = true;
            }
        }

        if let Some(email) = update.email {
            if email != *customer.email() {
                if self.store.exists_by_email(&email).await? {
                    return Err(email_taken());
                }
                customer = customer.with_email(email);
                changed = true;
            }
        }

        if let Some(age) = update.age {
            if age != *customer.age() {
                customer = customer.with_age(age);
                changed = true;
            }
        }

        if !changed {
            return Err(DriverError::InvalidInput("No data changes found".to_owned()));
        }

        match self.store.update(&customer).await {
            Ok(()) => {
                debug!("Updated customer {}", id);
                Ok(customer)
            }
            Err(DbError::AlreadyExists) => Err(email_taken()),
            Err(DbError::NotFound) => Err(not_found(id)),
            Err(e) => Err(e.into()),
        }
    }

    /// Deletes the customer identified by `id`.
    pub(crate) async fn delete_customer(self, id: CustomerId) -> DriverResult<()> {
        if !self.store.exists_by_id(id).await? {
            return Err(not_found(id));
        }

        self.store.delete_by_id(id).await?;
        debug!("Deleted customer {}", id);
        Ok(())
    }
}
