//! Defines types and utilities for managing the inventory of integration tests

use eyre::Result;
use std::{future::Future, pin::Pin};

use crate::test_args::TestArgs;

/// The signature of an integration test
type TestFn = fn(TestArgs) -> Pin<Box<dyn Future<Output = Result<()>>>>;

/// A struct representing an integration test
pub struct IntegrationTest {
    /// The name of the test
    pub name: &'static str,
    /// The module the test is defined in
    pub module: &'static str,
    /// The test function
    pub test_fn: TestFn,
}

impl IntegrationTest {
    /// The name the test is selected by, `<module>::<name>`
    pub fn full_name(&self) -> String {
        let module = self.module.rsplit("::").next().unwrap_or(self.module);
        format!("{module}::{}", self.name)
    }
}

// Collect the integration tests into an iterable
inventory::collect!(IntegrationTest);

/// Macro to register an integration test
#[macro_export]
macro_rules! integration_test {
    ($test_fn:ident) => {
        inventory::submit!($crate::test_inventory::IntegrationTest {
            name: stringify!($test_fn),
            module: module_path!(),
            test_fn: move |args| std::boxed::Box::pin($test_fn(args)),
        });
    };
}
