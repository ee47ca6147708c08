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

//! Operations on the collection of customers.

use crate::driver::{Driver, email_taken};
use crate::model::{Customer, NewCustomer};
use customers_core::db::DbError;
use customers_core::driver::DriverResult;
use log::debug;

impl Driver {
    /// Gets all existing customers.
    pub(crate) async fn list_customers(self) -> DriverResult<Vec<Customer>> {
        let customers = self.store.list_all().await?;
        Ok(customers)
    }

    /// Registers a `new` customer and returns it with its assigned identifier.
    pub(crate) async fn register_customer(self, new: NewCustomer) -> DriverResult<Customer> {
        if self.store.exists_by_email(new.email()).await? {
            return Err(email_taken());
        }

        match self.store.insert(new).await {
            Ok(customer) => {
                debug!("Registered customer {}", customer.id());
                Ok(customer)
            }
            Err(DbError::AlreadyExists) => Err(email_taken()),
            Err(e) => Err(e.into()),
        }
    }
}
