//! Shared test infrastructure.

/// `TestContext` and layout helpers.
pub mod harness;

/// Mock implementations of engine traits.
pub mod mocks;
