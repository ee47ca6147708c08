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

//! Entry point to the REST server.

use crate::driver::Driver;
use axum::Router;

mod customer_delete;
mod customer_get;
mod customer_put;
mod customers_get;
mod customers_post;
#[cfg(test)]
mod testutils;

/// Creates the router for the application.
pub(crate) fn app(driver: Driver) -> Router {
    use axum::routing::get;
    Router::new()
        .route(
            "/api/v1/customers/:id",
            get(customer_get::handler).put(customer_put::handler).delete(customer_delete::handler),
        )
        .route("/api/v1/customers", get(customers_get::handler).post(customers_post::handler))
        .with_state(driver)
}

#[cfg(test)]
mod tests {
    use crate::model::{Customer, NewCustomer};
    use crate::rest::testutils::*;
    use axum::http;
    use customers_core::rest::testutils::*;

    #[tokio::test]
    async fn test_end_to_end() {
        let context = TestContext::setup().await;

        let new: NewCustomer =
            serde_json::from_str(r#"{"name": "Alex", "email": "alex@x.com", "age": 21}"#).unwrap();
        let customer = OneShotBuilder::new(
            context.app(),
            (http::Method::POST, "/api/v1/customers".to_owned()),
        )
        .send_json(&new)
        .await
        .expect_json::<Customer>()
        .await;

        let customers = OneShotBuilder::new(
            context.app(),
            (http::Method::GET, "/api/v1/customers".to_owned()),
        )
        .send_empty()
        .await
        .expect_json::<Vec<Customer>>()
        .await;
        assert_eq!(vec![customer.clone()], customers);

        let path = format!("/api/v1/customers/{}", customer.id());
        let fetched = OneShotBuilder::new(context.app(), (http::Method::GET, path.clone()))
            .send_empty()
            .await
            .expect_json::<Customer>()
            .await;
        assert_eq!(customer, fetched);

        OneShotBuilder::new(context.app(), (http::Method::DELETE, path.clone()))
            .send_empty()
            .await
            .expect_empty()
            .await;

        OneShotBuilder::new(context.app(), (http::Method::GET, path.clone()))
            .send_empty()
            .await
            .expect_status(http::StatusCode::NOT_FOUND)
            .expect_error("customer with id .* not found")
            .await;

        OneShotBuilder::new(context.app(), (http::Method::DELETE, path))
            .send_empty()
            .await
            .expect_status(http::StatusCode::NOT_FOUND)
            .expect_error("not found")
            .await;
    }
}
