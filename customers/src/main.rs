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

//! Entry point to the customers service.

// Keep these in sync with other top-level files.
#![warn(anonymous_parameters, bad_style, clippy::missing_docs_in_private_items, missing_docs)]
#![warn(unused, unused_extern_crates, unused_import_braces, unused_qualifications)]
#![warn(unsafe_code)]

use customers::db::{
    CustomerStore, MemoryCustomerStore, OrmCustomerStore, SqlCustomerStore, StoreKind, init_schema,
};
use customers::{ServiceOptions, serve};
use customers_core::db::Db;
use customers_core::db::postgres::{PostgresDb, PostgresOptions};
use log::info;
use std::net::Ipv4Addr;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    env_logger::init();

    let opts = ServiceOptions::from_env("CUSTOMERS").unwrap();
    let addr = (Ipv4Addr::LOCALHOST, opts.port);

    let store: Arc<dyn CustomerStore + Send + Sync> = match opts.store {
        StoreKind::Memory => Arc::new(MemoryCustomerStore::default()),

        StoreKind::Sql | StoreKind::Orm => {
            let db_opts = PostgresOptions::from_env("PGSQL_PROD").unwrap();
            let db = PostgresDb::connect(db_opts).unwrap();
            init_schema(&mut db.ex().await.unwrap()).await.unwrap();
            if opts.store == StoreKind::Orm {
                Arc::new(OrmCustomerStore::from_postgres(&db))
            } else {
                Arc::new(SqlCustomerStore::new(Arc::new(db)))
            }
        }
    };
    info!("Using the {:?} customer store", opts.store);

    serve(addr, store).await.unwrap()
}
