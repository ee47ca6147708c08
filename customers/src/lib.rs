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

//! REST service to manage customer records.

// Keep these in sync with other top-level files.
#![warn(anonymous_parameters, bad_style, clippy::missing_docs_in_private_items, missing_docs)]
#![warn(unused, unused_extern_crates, unused_import_braces, unused_qualifications)]
#![warn(unsafe_code)]

use customers_core::env::get_optional_var;
use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;

pub mod db;
use db::{CustomerStore, StoreKind};
mod driver;
use driver::Driver;
pub mod model;
mod rest;
use rest::app;

/// Default port to listen on when not configured.
const DEFAULT_PORT: u16 = 3000;

/// Configuration options for the service.
#[derive(Debug, PartialEq)]
pub struct ServiceOptions {
    /// Port to listen on.
    pub port: u16,

    /// Kind of store to persist customers in.
    pub store: StoreKind,
}

impl ServiceOptions {
    /// Creates a new set of options from environment variables whose name is prefixed with the
    /// given `prefix`.
    ///
    /// This will use variables such as `<prefix>_PORT` and `<prefix>_STORE`.
    pub fn from_env(prefix: &str) -> Result<Self, String> {
        let store = match get_optional_var::<String>(prefix, "STORE")? {
            Some(raw) => raw
                .parse::<StoreKind>()
                .map_err(|e| format!("Invalid value in environment variable {}_STORE: {}", prefix, e))?,
            None => StoreKind::default(),
        };
        Ok(Self {
            port: get_optional_var::<u16>(prefix, "PORT")?.unwrap_or(DEFAULT_PORT),
            store,
        })
    }
}

/// Instantiates all resources to serve the application on `bind_addr` with customers persisted
/// in `store`.
///
/// While it'd be nice to push this responsibility to `main`, doing so would force us to expose many
/// crate-internal types to the public, which in turn would make dead code detection harder.
pub async fn serve(
    bind_addr: impl Into<SocketAddr>,
    store: Arc<dyn CustomerStore + Send + Sync>,
) -> Result<(), Box<dyn Error>> {
    let driver = Driver::new(store);
    let app = app(driver);

    let bind_addr = bind_addr.into();
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    log::info!("Listening on {}", bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
