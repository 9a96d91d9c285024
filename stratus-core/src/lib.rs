//! Stratus Core
//!
//! Provider contract for the Stratus infrastructure tool: resource and
//! state representations, the provider trait, attribute schemas and the
//! generic state-convergence poller.

pub mod provider;
pub mod resource;
pub mod schema;
pub mod wait;
