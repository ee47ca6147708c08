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

//! High-level data types.

use customers_core::model::{EmailAddress, ModelError, ModelResult};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a customer as assigned by the store at creation time.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct CustomerId(i64);

impl CustomerId {
    /// Creates a new identifier from its raw value.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw value of the identifier.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The name of a customer.  Cannot be empty.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(try_from = "String")]
pub struct CustomerName(String);

impl CustomerName {
    /// Creates a new name from an untrusted string `s`, making sure it is valid.
    pub fn new<S: Into<String>>(s: S) -> ModelResult<Self> {
        let s = s.into();
        if s.trim().is_empty() {
            return Err(ModelError("Customer name cannot be empty".to_owned()));
        }
        Ok(Self(s))
    }

    /// Returns a string view of the name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CustomerName {
    type Error = ModelError;

    fn try_from(s: String) -> ModelResult<Self> {
        Self::new(s)
    }
}

/// The age of a customer.  We store this as an u32 but guarantee that it is usable in an i32
/// context because the database backends need it.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(try_from = "i64")]
pub struct Age(u32);

impl Age {
    /// Creates an age from a `u32` with range validation.
    pub fn from_u32(age: u32) -> ModelResult<Age> {
        match i32::try_from(age) {
            Ok(_) => Ok(Age(age)),
            Err(e) => Err(ModelError(format!("Age cannot be represented: {}", e))),
        }
    }

    /// Creates an age from an `i32` with range validation.
    pub fn from_i32(age: i32) -> ModelResult<Age> {
        match u32::try_from(age) {
            Ok(age) => Ok(Age(age)),
            Err(_) => Err(ModelError(format!("Age cannot be negative: {}", age))),
        }
    }

    /// Returns the age as an `i32`.
    pub fn as_i32(&self) -> i32 {
        i32::try_from(self.0).expect("i32 compatibility validated at construction time")
    }

    /// Returns the age as a `u32`.
    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl TryFrom<i64> for Age {
    type Error = ModelError;

    fn try_from(age: i64) -> ModelResult<Self> {
        match i32::try_from(age) {
            Ok(age) => Age::from_i32(age),
            Err(e) => Err(ModelError(format!("Age cannot be represented: {}", e))),
        }
    }
}

/// A customer as persisted in the store.
#[derive(Clone, Debug, Getters, PartialEq, Serialize)]
#[cfg_attr(test, derive(Deserialize))]
pub struct Customer {
    /// Identifier assigned by the store.
    id: CustomerId,

    /// Name of the customer.
    name: CustomerName,

    /// Email address of the customer, unique across all customers.
    email: EmailAddress,

    /// Age of the customer.
    age: Age,
}

impl Customer {
    /// Creates a new customer from its parts.
    pub fn new(id: CustomerId, name: CustomerName, email: EmailAddress, age: Age) -> Self {
        Self { id, name, email, age }
    }

    /// Replaces the name of the customer.
    pub fn with_name(mut self, name: CustomerName) -> Self {
        self.name = name;
        self
    }

    /// Replaces the email address of the customer.
    pub fn with_email(mut self, email: EmailAddress) -> Self {
        self.email = email;
        self
    }

    /// Replaces the age of the customer.
    pub fn with_age(mut self, age: Age) -> Self {
        self.age = age;
        self
    }
}

/// Details of a customer that has not been persisted yet and thus lacks an identifier.
#[derive(Clone, Debug, Deserialize, Getters, PartialEq)]
#[cfg_attr(test, derive(Serialize))]
pub struct NewCustomer {
    /// Name of the customer.
    name: CustomerName,

    /// Email address of the customer.
    email: EmailAddress,

    /// Age of the customer.
    age: Age,
}

impl NewCustomer {
    /// Creates a new registration request.
    pub fn new(name: CustomerName, email: EmailAddress, age: Age) -> Self {
        Self { name, email, age }
    }

    /// Converts this request into a customer with the `id` assigned by the store.
    pub fn into_customer(self, id: CustomerId) -> Customer {
        Customer::new(id, self.name, self.email, self.age)
    }
}

/// A partial update to an existing customer.  Fields set to `None` are left untouched.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[cfg_attr(test, derive(Serialize))]
pub struct CustomerUpdate {
    /// New name for the customer, if any.
    #[cfg_attr(test, serde(skip_serializing_if = "Option::is_none"))]
    pub name: Option<CustomerName>,

    /// New email address for the customer, if any.
    #[cfg_attr(test, serde(skip_serializing_if = "Option::is_none"))]
    pub email: Option<EmailAddress>,

    /// New age for the customer, if any.
    #[cfg_attr(test, serde(skip_serializing_if = "Option::is_none"))]
    pub age: Option<Age>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_test::{Token, assert_de_tokens, assert_de_tokens_error, assert_ser_tokens};

    #[test]
    fn test_customer_name_ok() {
        assert_eq!("Alex", CustomerName::new("Alex").unwrap().as_str());
        assert_eq!(" a b ", CustomerName::new(" a b ").unwrap().as_str());
    }

    #[test]
    fn test_customer_name_error() {
        assert_eq!(
            ModelError("Customer name cannot be empty".to_owned()),
            CustomerName::new("").unwrap_err()
        );
        assert!(CustomerName::new(" \t ").is_err());
    }

    #[test]
    fn test_customer_name_de_error() {
        assert_de_tokens_error::<CustomerName>(
            &[Token::String("")],
            "Customer name cannot be empty",
        );
    }

    #[test]
    fn test_age_ranges() {
        assert_eq!(0, Age::from_u32(0).unwrap().as_i32());
        assert_eq!(i32::MAX, Age::from_u32(i32::MAX as u32).unwrap().as_i32());
        assert!(Age::from_u32(i32::MAX as u32 + 1).is_err());

        assert_eq!(21, Age::from_i32(21).unwrap().as_u32());
        assert_eq!(
            ModelError("Age cannot be negative: -1".to_owned()),
            Age::from_i32(-1).unwrap_err()
        );
    }

    #[test]
    fn test_age_de() {
        assert_de_tokens(&Age::from_u32(30).unwrap(), &[Token::I64(30)]);
        assert_de_tokens_error::<Age>(&[Token::I64(-5)], "Age cannot be negative: -5");
    }

    #[test]
    fn test_customer_ser() {
        let customer = Customer::new(
            CustomerId::new(7),
            CustomerName::new("Alex").unwrap(),
            EmailAddress::new("alex@example.com").unwrap(),
            Age::from_u32(21).unwrap(),
        );
        assert_ser_tokens(
            &customer,
            &[
                Token::Struct { name: "Customer", len: 4 },
                Token::Str("id"),
                Token::I64(7),
                Token::Str("name"),
                Token::NewtypeStruct { name: "CustomerName" },
                Token::Str("Alex"),
                Token::Str("email"),
                Token::Str("alex@example.com"),
                Token::Str("age"),
                Token::NewtypeStruct { name: "Age" },
                Token::U32(21),
                Token::StructEnd,
            ],
        );
    }

    #[test]
    fn test_customer_update_de_partial() {
        let update: CustomerUpdate = serde_json::from_str(r#"{"age": 30}"#).unwrap();
        assert_eq!(
            CustomerUpdate { name: None, email: None, age: Some(Age::from_u32(30).unwrap()) },
            update
        );

        let update: CustomerUpdate = serde_json::from_str("{}").unwrap();
        assert_eq!(CustomerUpdate::default(), update);
    }

    #[test]
    fn test_new_customer_de_rejects_invalid() {
        assert!(
            serde_json::from_str::<NewCustomer>(r#"{"name": "", "email": "a@b", "age": 1}"#)
                .is_err()
        );
        assert!(
            serde_json::from_str::<NewCustomer>(r#"{"name": "A", "email": "", "age": 1}"#)
                .is_err()
        );
        assert!(
            serde_json::from_str::<NewCustomer>(r#"{"name": "A", "email": "a@b", "age": -1}"#)
                .is_err()
        );
    }

    #[test]
    fn test_new_customer_into_customer() {
        let new = NewCustomer::new(
            CustomerName::new("Alex").unwrap(),
            EmailAddress::new("alex@example.com").unwrap(),
            Age::from_u32(21).unwrap(),
        );
        let customer = new.clone().into_customer(CustomerId::new(3));
        assert_eq!(CustomerId::new(3), *customer.id());
        assert_eq!(new.name(), customer.name());
        assert_eq!(new.email(), customer.email());
        assert_eq!(new.age(), customer.age());
    }
}
