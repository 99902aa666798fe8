//! Common test utilities for the golden rendering tests

#[allow(unused_imports)]
pub mod fixtures;
#[allow(unused_imports)]
pub mod runner;

#[allow(unused_imports)]
pub use fixtures::*;
#[allow(unused_imports)]
pub use runner::*;
