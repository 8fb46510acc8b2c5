//! Documented routes.
//!
//! `OperationRouteBuilder` registers GET routes together with an `Operation`
//! describing their parameters and response codes. The operation travels as
//! the `OPERATION` attribute on the route predicate and is recovered later by
//! a visitor (see `AttributesVisitor` and `RouteDocs`).

use std::fmt;

use serde::ser::{Serialize, SerializeMap, SerializeStruct, Serializer};

use crate::routing::attributes::AttributeKey;
use crate::routing::predicate::RequestPredicate;
use crate::routing::router::{route, HandlerFunction, RouterBuilder, RouterFunction};

/// Attribute under which a route's [`Operation`] is stored.
pub const OPERATION: AttributeKey<Operation> = AttributeKey::new("webfn.routing.operation");

/// Descriptive metadata for one route.
///
/// Both mappings keep declaration order. Declaring an existing key again
/// replaces its description in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Operation {
    parameters: Vec<(String, String)>,
    responses: Vec<(u16, String)>,
}

impl Operation {
    pub fn parameters(&self) -> impl Iterator<Item = (&str, &str)> {
        self.parameters
            .iter()
            .map(|(name, description)| (name.as_str(), description.as_str()))
    }

    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, description)| description.as_str())
    }

    pub fn responses(&self) -> impl Iterator<Item = (u16, &str)> {
        self.responses
            .iter()
            .map(|(status, description)| (*status, description.as_str()))
    }

    pub fn response(&self, status: u16) -> Option<&str> {
        self.responses
            .iter()
            .find(|(s, _)| *s == status)
            .map(|(_, description)| description.as_str())
    }

    fn put_parameter(&mut self, name: String, description: String) {
        match self.parameters.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = description,
            None => self.parameters.push((name, description)),
        }
    }

    fn put_response(&mut self, status: u16, description: String) {
        match self.responses.iter_mut().find(|(s, _)| *s == status) {
            Some(entry) => entry.1 = description,
            None => self.responses.push((status, description)),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parameters: Vec<_> = self
            .parameters()
            .map(|(name, description)| format!("{}={}", name, description))
            .collect();
        let responses: Vec<_> = self
            .responses()
            .map(|(status, description)| format!("{}={}", status, description))
            .collect();
        write!(
            f,
            "parameters={{{}}}, responses={{{}}}",
            parameters.join(", "),
            responses.join(", ")
        )
    }
}

struct OrderedMap<'a, K>(&'a [(K, String)]);

impl<K: Serialize> Serialize for OrderedMap<'_, K> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl Serialize for Operation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Operation", 2)?;
        state.serialize_field("parameters", &OrderedMap(&self.parameters))?;
        state.serialize_field("responses", &OrderedMap(&self.responses))?;
        state.end()
    }
}

/// Fluent access to an [`Operation`] under construction.
#[derive(Debug, Default)]
pub struct OperationBuilder {
    operation: Operation,
}

impl OperationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Describe a request parameter. Last declaration wins.
    pub fn parameter(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> &mut Self {
        self.operation.put_parameter(name.into(), description.into());
        self
    }

    /// Describe a response status. Last declaration wins.
    pub fn response(&mut self, status: u16, description: impl Into<String>) -> &mut Self {
        self.operation.put_response(status, description.into());
        self
    }

    pub fn build(self) -> Operation {
        self.operation
    }
}

/// Route builder whose GET routes carry an [`Operation`].
#[derive(Debug, Default)]
pub struct OperationRouteBuilder {
    delegate: RouterBuilder,
}

impl OperationRouteBuilder {
    /// Start an empty table.
    pub fn route() -> Self {
        Self { delegate: route() }
    }

    /// Register a GET route for `pattern` described by `configure`.
    pub fn get<F>(mut self, pattern: &str, handler: HandlerFunction, configure: F) -> Self
    where
        F: FnOnce(&mut OperationBuilder),
    {
        let mut builder = OperationBuilder::new();
        configure(&mut builder);
        let operation = builder.build();

        tracing::trace!(pattern = %pattern, operation = %operation, "Documented route registered");

        self.delegate = self.delegate.get_with(
            pattern,
            RequestPredicate::attribute(&OPERATION, operation),
            handler,
        );
        self
    }

    /// Escape hatch to the plain builder for undocumented routes.
    pub fn with<F>(mut self, configure: F) -> Self
    where
        F: FnOnce(RouterBuilder) -> RouterBuilder,
    {
        self.delegate = configure(self.delegate);
        self
    }

    pub fn build(self) -> RouterFunction {
        self.delegate.build()
    }
}
