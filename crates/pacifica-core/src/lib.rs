//! Pacifica Core Library
//!
//! Signed REST client for the Pacifica perpetual-futures venue: agent key
//! handling, canonical request signing, transport and the typed trading API.

pub mod api;
pub mod config;
pub mod error;
pub mod signing;
pub mod types;

pub use api::PacificaClient;
pub use config::{Config, Network};
pub use error::{Error, Result};
