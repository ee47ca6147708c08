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

//! Business logic for the service.

use crate::db::CustomerStore;
use crate::model::CustomerId;
use customers_core::driver::DriverError;
use std::sync::Arc;

mod customer;
mod customers;
#[cfg(test)]
pub(crate) mod testutils;

/// Message returned when trying to use an email address that another customer already has.
const EMAIL_TAKEN_MESSAGE: &str = "Email already taken";

/// Builds the error returned when the customer identified by `id` does not exist.
fn not_found(id: CustomerId) -> DriverError {
    DriverError::NotFound(format!("customer with id [{}] not found", id))
}

/// Builds the error returned when an email address is already in use.
fn email_taken() -> DriverError {
    DriverError::AlreadyExists(EMAIL_TAKEN_MESSAGE.to_owned())
}

/// Business logic.
///
/// The public operations exposed by the driver are all "one shot" so, to discourage callers from
/// chaining multiple operations on the same instance, these operations consume the driver.
#[derive(Clone)]
pub(crate) struct Driver {
    /// The store that the driver uses for persistence.
    store: Arc<dyn CustomerStore + Send + Sync>,
}

impl Driver {
    /// Creates a new driver backed by the given injected components.
    pub(crate) fn new(store: Arc<dyn CustomerStore + Send + Sync>) -> Self {
        Self { store }
    }
}
