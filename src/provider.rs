//! Provider-facing behavior hooks.
//!
//! `strategy` defines [`ProviderStrategy`], an HTTP-client-agnostic hook that maps non-2xx
//! provider responses into the crate error taxonomy.

pub mod strategy;

pub use strategy::*;
