//! Vitrine core: domain model and collaborator interfaces for the
//! live-shopping session engine.
//!
//! This crate holds what the engine shares across broadcaster and viewer
//! sides: typed IDs and entities, the interaction wire format, the error
//! taxonomy, configuration and logging bootstrap, and the two external
//! collaborators (the session registry and the relay credential service)
//! as traits with HTTP and local implementations.

pub mod config;
pub mod credential;
pub mod error;
pub mod logging;
pub mod models;
pub mod registry;

pub use error::{Error, Result};
