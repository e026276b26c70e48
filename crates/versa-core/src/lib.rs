//! Core types and the read-time visibility policy for the Versa resolver.
//!
//! This crate is deliberately free of database dependencies. Storage backends
//! implement [`store::VersionStore`]; callers drive reads through
//! [`resolve::Resolver`].

pub mod error;
pub mod fetch;
pub mod normalize;
pub mod record;
pub mod resolve;
pub mod store;

pub use error::{Error, Result};
pub use resolve::{ResolvedResource, Resolver, ResolverConfig};

#[cfg(test)]
mod tests;
