//! lines-core - Core types and subscription sessions for sports lines streaming
//!
//! This crate provides the pieces every transport builds on:
//! - `LineStore`, the current-value lookup written by the fetcher and read by sessions
//! - the delta calculator and requirement reconciler
//! - `SubscriptionSession`, the per-connection push engine
//!
//! It is transport-agnostic: a session consumes a `Stream` of requests and
//! writes into a `Sink` of responses.

pub mod delta;
pub mod error;
pub mod models;
pub mod reconcile;
pub mod session;
pub mod store;

pub use delta::compute_deltas;
pub use error::{SessionError, SessionResult, StoreError, StoreResult, TransportError};
pub use models::{Baseline, Deltas, Point, SubscriptionRequest, SubscriptionResponse};
pub use reconcile::{reconcile, Reconciliation, Requirement};
pub use session::SubscriptionSession;
pub use store::{LineStore, MemoryLineStore};
