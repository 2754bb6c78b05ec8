//! Resilient client for the NeatQueue Discord bot API.
//!
//! NeatQueue's endpoint layout differs between deployments, so each resource
//! is fetched by probing a list of candidate paths and normalizing whichever
//! JSON shape comes back. Anything that fails degrades to placeholder data.

pub mod client;
pub mod clock;
pub mod error;
#[cfg(test)]
mod fake;
pub mod metrics;
pub mod mock;
pub mod models;
pub mod normalize;
pub mod probe;
pub mod resources;
pub mod transport;

pub use client::{ClientConfig, NeatQueueClient, DEFAULT_API_URL};
pub use error::ClientError;
pub use models::{LeaderboardQuery, MatchQuery, Provenance, QueueQuery, Sourced};
