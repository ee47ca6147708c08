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

//! Rudimentary framework to build the customers web service.
//!
//! Services built on top of this crate adhere to the following layered architecture and should
//! structure their code to have these modules as well:
//!
//! 1.  `model`: High-level data types that represent concepts in the domain of the application.
//!     Values are validated at construction time so that the rest of the layers can trust them.
//!
//! 1.  `db`: The persistence layer.  Services define their own storage operations on top of the
//!     `Executor` type exposed here, which abstracts over the supported database systems.
//!
//! 1.  `driver`: The business logic layer.  Services provide their own `Driver` type to
//!     coordinate access to the persistence layer.
//!
//! 1.  `rest`: The HTTP layer.  Services provide their own `axum::Router` and back every API with
//!     a `Driver`.
//!
//! 1.  `main`: The app launcher, which gathers configuration from environment variables and
//!     wires all the pieces together.
//!
//! Every layer has its own result and error types, such as `DbResult` and `DbError`.  Errors float
//! to the top of the app using the `?` operator and are translated to HTTP status codes once
//! returned from the REST layer.

// Keep these in sync with other top-level files.
#![warn(anonymous_parameters, bad_style, clippy::missing_docs_in_private_items, missing_docs)]
#![warn(unused, unused_extern_crates, unused_import_braces, unused_qualifications)]
#![warn(unsafe_code)]

pub mod db;
pub mod driver;
pub mod env;
pub mod model;
pub mod rest;
