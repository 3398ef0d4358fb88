/// StrataDB gRPC Client Library
///
/// This crate provides a Rust client for StrataDB: a multiplexed
/// query/mutation stream protocol over one bidirectional channel, a typed
/// payload codec for schema-tagged record envelopes, a search expression
/// model with index-eligible vs full-scan classification, and the one-shot
/// atomic schema subscription exchange.
///
/// An equivalent HTTP+JSON transport is available behind the `rest` feature;
/// both transports share the same correlation semantics.

pub mod error;
pub mod codec;
pub mod expr;
pub mod session;
pub mod mutation;
pub mod schema;
pub mod client;
#[cfg(feature = "rest")]
pub mod rest;

// Re-export key types
pub use client::{Client, ClientConfig};
pub use codec::{Envelope, SchemaRegistry};
pub use error::{ClientError, Result};
pub use expr::{BasicExpression, Comparison, LogicalOp, QueryKind, SearchExpression};
pub use mutation::{MutationBatch, MutationKind};
pub use schema::SchemaSet;
pub use session::{
    Anomaly, MutationSession, QueryResults, SearchOutcome, SearchSession, SessionOptions,
    SessionState,
};
